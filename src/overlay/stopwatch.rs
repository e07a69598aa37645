/*
 *  overlay/stopwatch.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Elapsed-time accumulator with pause/resume, shared by the rotation
 *  and marquee controllers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use super::clock::Timestamp;
use std::time::Duration;

/// Accumulates running time only; time spent paused is never counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopwatch {
    /// Time banked before the current run
    banked: Duration,
    /// Start of the current run, `None` while paused
    running_since: Option<Timestamp>,
}

impl Stopwatch {
    /// Start a running stopwatch at zero.
    pub fn started(now: Timestamp) -> Self {
        Self {
            banked: Duration::ZERO,
            running_since: Some(now),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }

    /// Running time as of `now`. Pure, safe to call at any cadence.
    pub fn elapsed(&self, now: Timestamp) -> Duration {
        match self.running_since {
            Some(since) => self.banked + now.saturating_since(since),
            None => self.banked,
        }
    }

    /// Freeze the accumulated time. Pausing twice is a no-op.
    pub fn pause(&mut self, now: Timestamp) {
        if let Some(since) = self.running_since.take() {
            self.banked += now.saturating_since(since);
        }
    }

    /// Continue from the frozen value. Resuming a running stopwatch is a no-op.
    pub fn resume(&mut self, now: Timestamp) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Replace the accumulated time, keeping the paused/running state.
    pub fn rebase(&mut self, elapsed: Duration, now: Timestamp) {
        self.banked = elapsed;
        if self.running_since.is_some() {
            self.running_since = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_elapsed_while_running() {
        let sw = Stopwatch::started(at(1_000));
        assert_eq!(sw.elapsed(at(1_000)), Duration::ZERO);
        assert_eq!(sw.elapsed(at(3_500)), Duration::from_millis(2_500));
        // time before start never goes negative
        assert_eq!(sw.elapsed(at(0)), Duration::ZERO);
    }

    #[test]
    fn test_paused_time_not_counted() {
        let mut sw = Stopwatch::started(at(0));
        sw.pause(at(1_500));
        assert!(sw.is_paused());
        assert_eq!(sw.elapsed(at(60_000)), Duration::from_millis(1_500));
        sw.resume(at(60_000));
        assert_eq!(sw.elapsed(at(60_000)), Duration::from_millis(1_500));
        assert_eq!(sw.elapsed(at(61_000)), Duration::from_millis(2_500));
    }

    #[test]
    fn test_double_pause_and_resume_are_idempotent() {
        let mut sw = Stopwatch::started(at(0));
        sw.pause(at(100));
        sw.pause(at(900));
        assert_eq!(sw.elapsed(at(1_000)), Duration::from_millis(100));
        sw.resume(at(1_000));
        sw.resume(at(5_000));
        assert_eq!(sw.elapsed(at(5_000)), Duration::from_millis(4_100));
    }

    #[test]
    fn test_rebase_keeps_run_state() {
        let mut sw = Stopwatch::started(at(0));
        sw.rebase(Duration::from_millis(250), at(2_000));
        assert_eq!(sw.elapsed(at(2_100)), Duration::from_millis(350));

        sw.pause(at(2_100));
        sw.rebase(Duration::from_millis(10), at(3_000));
        assert!(sw.is_paused());
        assert_eq!(sw.elapsed(at(9_000)), Duration::from_millis(10));
    }
}
