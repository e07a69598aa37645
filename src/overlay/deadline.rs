/*
 *  overlay/deadline.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  One-shot deadline - arms, fires at most once, stays fired until
 *  explicitly disarmed and re-armed
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OneShot {
    #[default]
    Disarmed,
    Armed { at: Timestamp },
    Fired { at: Timestamp },
}

impl OneShot {
    pub fn arm_after(now: Timestamp, delay: Duration) -> Self {
        OneShot::Armed { at: now + delay }
    }

    pub fn deadline(&self) -> Option<Timestamp> {
        match *self {
            OneShot::Armed { at } => Some(at),
            _ => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, OneShot::Armed { .. })
    }

    /// Fired, or armed with the deadline already reached at `now`.
    pub fn has_fired_by(&self, now: Timestamp) -> bool {
        match *self {
            OneShot::Fired { .. } => true,
            OneShot::Armed { at } => now >= at,
            OneShot::Disarmed => false,
        }
    }

    /// Transition Armed -> Fired when due; returns true exactly once.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        match *self {
            OneShot::Armed { at } if now >= at => {
                *self = OneShot::Fired { at };
                true
            }
            _ => false,
        }
    }

    pub fn disarm(&mut self) {
        *self = OneShot::Disarmed;
    }
}
