/*
 *  overlay/countdown.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Countdown/expiry controller - "{h}h {m}m" remaining label refreshed
 *  once a minute, with a permanent one-shot expired latch
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
use chrono::DateTime;
use std::time::Duration;

pub const EXPIRED_LABEL: &str = "Expired";

/// Label refresh cadence, minute granularity display needs nothing finer
pub const REFRESH_EVERY: Duration = Duration::from_secs(60);

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_MINUTE: i64 = 60 * 1000;

/// Expiry instant as supplied by the editing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(Timestamp),
    /// Could not be understood, treated as already expired
    Invalid,
}

impl Expiry {
    /// Parse an RFC 3339 / ISO-8601 instant such as `2024-05-01T18:00:00Z`.
    pub fn parse(s: &str) -> Self {
        match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(dt) => Expiry::At(Timestamp::from(dt)),
            Err(e) => {
                log::warn!("Unparsable expiry instant '{}': {} - treating as expired", s, e);
                Expiry::Invalid
            }
        }
    }
}

impl From<Timestamp> for Expiry {
    fn from(ts: Timestamp) -> Self {
        Expiry::At(ts)
    }
}

/// Remaining-time label for `remaining_ms`; zero or negative reads "Expired".
pub fn format_remaining(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return EXPIRED_LABEL.to_string();
    }
    let hours = remaining_ms / MS_PER_HOUR;
    let minutes = (remaining_ms % MS_PER_HOUR) / MS_PER_MINUTE;
    format!("{}h {}m", hours, minutes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownReading {
    pub label: String,
    pub expired: bool,
}

/// Countdown towards a single expiry instant
#[derive(Debug, Clone, Default)]
pub struct CountdownController {
    target: Option<Expiry>,
    /// Label as of the last refresh
    label: Option<String>,
    /// Once set, stays set for the life of the controller
    expired: bool,
}

impl CountdownController {
    pub fn new(target: Option<Expiry>, now: Timestamp) -> Self {
        let mut countdown = Self::default();
        countdown.set_target(target, now);
        countdown
    }

    pub fn target(&self) -> Option<Expiry> {
        self.target
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Replace the target and recompute straight away. A latched expiry
    /// is not undone by moving the target forward.
    pub fn set_target(&mut self, target: Option<Expiry>, now: Timestamp) {
        self.target = target;
        self.label = None;
        self.refresh(now);
    }

    /// Recompute the label. Returns true on the refresh that latches expiry.
    pub fn refresh(&mut self, now: Timestamp) -> bool {
        let Some(target) = self.target else {
            self.label = None;
            return false;
        };
        let remaining_ms = match target {
            Expiry::At(at) => at.millis_since(now),
            Expiry::Invalid => 0,
        };
        let newly_expired = !self.expired && remaining_ms <= 0;
        if remaining_ms <= 0 {
            self.expired = true;
        }
        self.label = Some(if self.expired {
            EXPIRED_LABEL.to_string()
        } else {
            format_remaining(remaining_ms)
        });
        newly_expired
    }

    /// Exact instant the expiry should fire, `None` once expired.
    pub fn deadline(&self) -> Option<Timestamp> {
        match (self.expired, self.target) {
            (false, Some(Expiry::At(at))) => Some(at),
            _ => None,
        }
    }

    /// Whether periodic label refresh is still needed.
    pub fn wants_refresh(&self) -> bool {
        self.deadline().is_some()
    }

    /// Pure read: the cached label, or "Expired" once the target has passed.
    /// A latched expiry keeps reading "Expired" even once the target is cleared.
    pub fn reading(&self, now: Timestamp) -> Option<CountdownReading> {
        if self.expired {
            return Some(CountdownReading {
                label: EXPIRED_LABEL.to_string(),
                expired: true,
            });
        }
        let target = self.target?;
        let passed = match target {
            Expiry::At(at) => now >= at,
            Expiry::Invalid => true,
        };
        if passed {
            return Some(CountdownReading {
                label: EXPIRED_LABEL.to_string(),
                expired: true,
            });
        }
        let label = match (&self.label, target) {
            (Some(label), _) => label.clone(),
            (None, Expiry::At(at)) => format_remaining(at.millis_since(now)),
            (None, Expiry::Invalid) => EXPIRED_LABEL.to_string(),
        };
        Some(CountdownReading { label, expired: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(90 * MIN), "1h 30m");
        assert_eq!(format_remaining(59 * MIN + 59_999), "0h 59m");
        assert_eq!(format_remaining(30_000), "0h 0m");
        assert_eq!(format_remaining(25 * 60 * MIN), "25h 0m");
        assert_eq!(format_remaining(0), EXPIRED_LABEL);
        assert_eq!(format_remaining(-5), EXPIRED_LABEL);
    }

    #[test]
    fn test_ninety_minutes_then_expired() {
        let mut c = CountdownController::new(Some(Expiry::At(at(90 * MIN))), at(0));
        let r = c.reading(at(0)).unwrap();
        assert_eq!(r.label, "1h 30m");
        assert!(!r.expired);

        assert!(c.refresh(at(91 * MIN)));
        let r = c.reading(at(91 * MIN)).unwrap();
        assert_eq!(r.label, EXPIRED_LABEL);
        assert!(r.expired);
    }

    #[test]
    fn test_expired_latch_survives_target_moved_forward() {
        let mut c = CountdownController::new(Some(Expiry::At(at(MIN))), at(0));
        c.refresh(at(2 * MIN));
        assert!(c.is_expired());
        c.set_target(Some(Expiry::At(at(600 * MIN))), at(3 * MIN));
        let r = c.reading(at(3 * MIN)).unwrap();
        assert!(r.expired);
        assert_eq!(r.label, EXPIRED_LABEL);
        assert_eq!(c.deadline(), None);
        assert!(!c.wants_refresh());
    }

    #[test]
    fn test_past_and_invalid_targets_expire_immediately() {
        let c = CountdownController::new(Some(Expiry::At(at(-1))), at(0));
        assert!(c.is_expired());

        let c = CountdownController::new(Some(Expiry::parse("not a date")), at(0));
        assert!(c.is_expired());
        assert_eq!(c.reading(at(0)).unwrap().label, EXPIRED_LABEL);
    }

    #[test]
    fn test_label_is_cached_between_refreshes() {
        let mut c = CountdownController::new(Some(Expiry::At(at(90 * MIN))), at(0));
        // 30s later the cached minute-granularity label is unchanged
        assert_eq!(c.reading(at(30_000)).unwrap().label, "1h 30m");
        c.refresh(at(MIN));
        assert_eq!(c.reading(at(MIN)).unwrap().label, "1h 29m");
    }

    #[test]
    fn test_reading_flips_exactly_at_deadline() {
        let c = CountdownController::new(Some(Expiry::At(at(10 * MIN))), at(0));
        assert!(!c.reading(at(10 * MIN - 1)).unwrap().expired);
        assert!(c.reading(at(10 * MIN)).unwrap().expired);
        // pure read, the latch itself only moves on refresh
        assert!(!c.is_expired());
    }

    #[test]
    fn test_expired_latch_survives_cleared_target() {
        let mut c = CountdownController::new(Some(Expiry::At(at(MIN))), at(0));
        assert!(c.refresh(at(MIN)));
        c.set_target(None, at(2 * MIN));
        let r = c.reading(at(2 * MIN)).unwrap();
        assert!(r.expired);
        assert_eq!(r.label, EXPIRED_LABEL);
        assert_eq!(c.deadline(), None);
    }

    #[test]
    fn test_no_target_no_label() {
        let mut c = CountdownController::new(None, at(0));
        assert_eq!(c.reading(at(0)), None);
        assert!(!c.refresh(at(MIN)));
        assert!(!c.is_expired());
    }

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(
            Expiry::parse("1970-01-01T01:30:00Z"),
            Expiry::At(at(90 * MIN))
        );
        assert_eq!(
            Expiry::parse(" 1970-01-01T02:30:00+01:00 "),
            Expiry::At(at(90 * MIN))
        );
    }
}
