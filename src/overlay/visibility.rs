/*
 *  overlay/visibility.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Visibility/lifecycle state - external visible flag combined with the
 *  one-shot auto-hide timer
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
use super::deadline::OneShot;
use std::time::Duration;

/// Alerts with auto-hide enabled disappear this long after being shown
pub const AUTO_HIDE_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPhase {
    VisibleArmed,
    VisibleUnarmed,
    HiddenByFlag,
    HiddenByTimer,
}

#[derive(Debug, Clone)]
pub struct VisibilityState {
    /// Flag as last set by the editing layer
    flag: bool,
    auto_hide: bool,
    timer: OneShot,
}

impl VisibilityState {
    pub fn new(flag: bool, auto_hide: bool, now: Timestamp) -> Self {
        let timer = if flag && auto_hide {
            OneShot::arm_after(now, AUTO_HIDE_AFTER)
        } else {
            OneShot::Disarmed
        };
        Self { flag, auto_hide, timer }
    }

    pub fn flag(&self) -> bool {
        self.flag
    }

    /// Set the external flag. Hiding wins immediately; showing re-arms
    /// auto-hide only on a hidden -> visible edge.
    pub fn set_flag(&mut self, visible: bool, now: Timestamp) {
        match (self.flag, visible) {
            (true, false) => {
                self.flag = false;
                self.timer.disarm();
            }
            (false, true) => {
                self.flag = true;
                self.timer = if self.auto_hide {
                    OneShot::arm_after(now, AUTO_HIDE_AFTER)
                } else {
                    OneShot::Disarmed
                };
            }
            _ => {}
        }
    }

    /// Toggle auto-hide. Turning it off cancels a pending or fired timer,
    /// turning it on while visible arms from `now`.
    pub fn set_auto_hide(&mut self, auto_hide: bool, now: Timestamp) {
        if auto_hide == self.auto_hide {
            return;
        }
        self.auto_hide = auto_hide;
        self.timer = if auto_hide && self.flag {
            OneShot::arm_after(now, AUTO_HIDE_AFTER)
        } else {
            OneShot::Disarmed
        };
    }

    /// Auto-hide deadline still pending.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.timer.deadline()
    }

    /// Fire the auto-hide timer if due. Returns true exactly once per arming.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        self.timer.poll(now)
    }

    pub fn phase(&self, now: Timestamp) -> VisibilityPhase {
        if !self.flag {
            VisibilityPhase::HiddenByFlag
        } else if self.timer.has_fired_by(now) {
            VisibilityPhase::HiddenByTimer
        } else if self.timer.is_armed() {
            VisibilityPhase::VisibleArmed
        } else {
            VisibilityPhase::VisibleUnarmed
        }
    }

    /// Effective visibility: flag AND NOT auto-hide fired.
    pub fn is_visible(&self, now: Timestamp) -> bool {
        matches!(
            self.phase(now),
            VisibilityPhase::VisibleArmed | VisibilityPhase::VisibleUnarmed
        )
    }
}
