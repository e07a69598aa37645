/*
 *  overlay/rotation.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rotation controller - one headline visible at a time, advancing on
 *  the speed class interval, pausable without losing the interval
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
use super::stopwatch::Stopwatch;
use super::widget::SpeedClass;
use std::time::Duration;

/// Rotation state for a single ticker
#[derive(Debug, Clone)]
pub struct RotationController {
    /// Active item, `None` while there is nothing to show
    index: Option<usize>,
    len: usize,
    interval: Duration,
    /// Time since the last advance, paused time excluded
    since_advance: Stopwatch,
    auto_play: bool,
}

impl RotationController {
    pub fn new(len: usize, speed: SpeedClass, auto_play: bool, now: Timestamp) -> Self {
        Self {
            index: (len > 0).then_some(0),
            len,
            interval: speed.rotation_interval(),
            since_advance: Stopwatch::started(now),
            auto_play,
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn item_count(&self) -> usize {
        self.len
    }

    pub fn is_paused(&self) -> bool {
        self.since_advance.is_paused()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advances only when a rotation would actually happen.
    pub fn is_ticking(&self) -> bool {
        self.can_rotate() && !self.is_paused()
    }

    fn can_rotate(&self) -> bool {
        self.auto_play && self.len > 0
    }

    /// Move forward by however many whole intervals have elapsed.
    /// Returns true if at least one advance happened.
    pub fn advance(&mut self, now: Timestamp) -> bool {
        if self.len == 0 {
            self.index = None;
            self.since_advance.rebase(Duration::ZERO, now);
            return false;
        }
        let current = self.index.unwrap_or(0) % self.len;
        self.index = Some(current);

        // idle time never turns into steps
        if !self.auto_play {
            self.since_advance.rebase(Duration::ZERO, now);
            return false;
        }
        if self.is_paused() {
            return false;
        }

        let elapsed = self.since_advance.elapsed(now);
        let interval_ms = self.interval.as_millis().max(1);
        let steps = elapsed.as_millis() / interval_ms;
        if steps == 0 {
            return false;
        }

        // keep the sub-interval remainder so late ticks do not drift
        let remainder = (elapsed.as_millis() % interval_ms) as u64;
        self.since_advance.rebase(Duration::from_millis(remainder), now);

        let next = ((current as u128 + steps) % self.len as u128) as usize;
        self.index = Some(next);
        log::trace!("rotation advanced {} -> {} ({} step(s))", current, next, steps);
        true
    }

    pub fn pause(&mut self, now: Timestamp) {
        self.since_advance.pause(now);
    }

    pub fn resume(&mut self, now: Timestamp) {
        self.since_advance.resume(now);
    }

    /// When the next advance is due, `None` while not ticking.
    pub fn next_due(&self, now: Timestamp) -> Option<Timestamp> {
        if !self.is_ticking() {
            return None;
        }
        let elapsed = self.since_advance.elapsed(now);
        let remaining = self.interval.saturating_sub(elapsed);
        Some(now + remaining)
    }

    /// Apply a replacement config. Elapsed time since the last advance is
    /// kept, unless the rotation was inert, in which case the first interval
    /// starts at `now`.
    pub fn reconfigure(&mut self, len: usize, speed: SpeedClass, auto_play: bool, now: Timestamp) {
        let was_inert = !self.can_rotate();
        self.len = len;
        self.interval = speed.rotation_interval();
        self.auto_play = auto_play;
        self.index = match (len, self.index) {
            (0, _) => None,
            (n, Some(i)) => Some(i % n),
            (_, None) => Some(0),
        };
        if was_inert && self.can_rotate() {
            self.since_advance.rebase(Duration::ZERO, now);
        }
    }
}
