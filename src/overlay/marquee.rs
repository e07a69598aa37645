/*
 *  overlay/marquee.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Marquee controller - continuous scroll loop expressed as a phase
 *  within one full cycle of the duplicated content run
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

/// Position within the scroll loop.
///
/// The renderer duplicates the item run once and maps `fraction()` onto
/// the width of the first copy, the engine never deals in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPhase {
    pub phase: Duration,
    pub cycle: Duration,
}

impl ScrollPhase {
    /// Progress through the loop in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        if self.cycle.is_zero() {
            return 0.0;
        }
        self.phase.as_secs_f64() / self.cycle.as_secs_f64()
    }
}

#[derive(Debug, Clone)]
pub struct MarqueeController {
    /// Loop time is fixed per speed class, not derived from content width
    cycle: Duration,
    scrolled: Stopwatch,
}

impl MarqueeController {
    pub fn new(speed: SpeedClass, now: Timestamp) -> Self {
        Self {
            cycle: speed.marquee_cycle(),
            scrolled: Stopwatch::started(now),
        }
    }

    pub fn cycle(&self) -> Duration {
        self.cycle
    }

    pub fn is_paused(&self) -> bool {
        self.scrolled.is_paused()
    }

    /// Phase at `now`, always within `[0, cycle)`.
    pub fn phase(&self, now: Timestamp) -> ScrollPhase {
        let cycle_ms = self.cycle.as_millis().max(1);
        let phase_ms = self.scrolled.elapsed(now).as_millis() % cycle_ms;
        ScrollPhase {
            phase: Duration::from_millis(phase_ms as u64),
            cycle: self.cycle,
        }
    }

    pub fn pause(&mut self, now: Timestamp) {
        self.scrolled.pause(now);
    }

    pub fn resume(&mut self, now: Timestamp) {
        self.scrolled.resume(now);
    }

    /// Switch speed class, keeping the fractional position in the loop.
    pub fn set_speed(&mut self, speed: SpeedClass, now: Timestamp) {
        let cycle = speed.marquee_cycle();
        if cycle == self.cycle {
            return;
        }
        let fraction = self.phase(now).fraction();
        let rescaled = Duration::from_secs_f64(cycle.as_secs_f64() * fraction);
        self.cycle = cycle;
        self.scrolled.rebase(rescaled, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_cycle_per_speed_class() {
        assert_eq!(MarqueeController::new(SpeedClass::Fast, at(0)).cycle(), Duration::from_secs(20));
        assert_eq!(MarqueeController::new(SpeedClass::Normal, at(0)).cycle(), Duration::from_secs(40));
        assert_eq!(MarqueeController::new(SpeedClass::Slow, at(0)).cycle(), Duration::from_secs(60));
    }

    #[test]
    fn test_phase_wraps_within_cycle() {
        let m = MarqueeController::new(SpeedClass::Fast, at(0));
        assert_eq!(m.phase(at(5_000)).phase, Duration::from_secs(5));
        assert_eq!(m.phase(at(19_999)).phase, Duration::from_millis(19_999));
        assert_eq!(m.phase(at(20_000)).phase, Duration::ZERO);
        assert_eq!(m.phase(at(47_000)).phase, Duration::from_secs(7));
    }

    #[test]
    fn test_phase_monotonic_modulo_cycle() {
        let m = MarqueeController::new(SpeedClass::Normal, at(0));
        let mut last = Duration::ZERO;
        for t in (0..40_000).step_by(250) {
            let p = m.phase(at(t)).phase;
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let mut m = MarqueeController::new(SpeedClass::Normal, at(0));
        m.pause(at(12_000));
        let frozen = m.phase(at(12_000));
        assert_eq!(m.phase(at(22_000)), frozen);
        m.resume(at(22_000));
        assert_eq!(m.phase(at(22_000)), frozen);
        assert_eq!(m.phase(at(23_000)).phase, Duration::from_secs(13));
    }

    #[test]
    fn test_speed_change_keeps_fraction() {
        let mut m = MarqueeController::new(SpeedClass::Fast, at(0));
        // halfway through a 20s loop
        m.set_speed(SpeedClass::Slow, at(10_000));
        let p = m.phase(at(10_000));
        assert_eq!(p.cycle, Duration::from_secs(60));
        assert_eq!(p.phase, Duration::from_secs(30));
        assert!((p.fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fraction_bounds() {
        let m = MarqueeController::new(SpeedClass::Fast, at(0));
        let f = m.phase(at(19_999)).fraction();
        assert!((0.0..1.0).contains(&f));
    }
}
