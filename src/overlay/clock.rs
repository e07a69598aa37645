/*
 *  overlay/clock.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clock source shared by every widget - timestamps, monotonic system
 *  clock, manual clock and wall clock labels
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

use chrono::{DateTime, Local, TimeZone, Utc};
use std::cell::Cell;
use std::fmt;
use std::ops::Add;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Point in time, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_millis(ms: i64) -> Self {
        Timestamp(ms)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`; zero when `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        let diff = self.0.saturating_sub(earlier.0);
        if diff <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(diff as u64)
        }
    }

    /// Signed millisecond difference `self - earlier`.
    pub fn millis_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let ms = i64::try_from(rhs.as_millis()).unwrap_or(i64::MAX);
        Timestamp(self.0.saturating_add(ms))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Anything that can tell the engine what time it is.
pub trait ClockSource {
    fn now(&self) -> Timestamp;
}

/// Wall-aligned monotonic clock.
///
/// The wall clock is sampled once at construction, after that time only
/// moves forward with `Instant`, so NTP steps never make a widget jump back.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin_wall: Timestamp,
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin_wall: Timestamp::from(Utc::now()),
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin_wall + self.origin.elapsed()
    }
}

/// Hand-driven clock, clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) -> Timestamp {
        let next = self.now.get() + by;
        self.now.set(next);
        next
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Local `HH:MM` label for the ticker timestamp and score bug update time.
pub fn wall_label(now: Timestamp) -> String {
    match now.to_datetime() {
        Some(dt) => dt.with_timezone(&Local).format("%H:%M").to_string(),
        None => String::from("--:--"),
    }
}
