/*
 *  pacer.rs
 *
 *  OnAir - broadcast overlay engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	Frame pacer - how often the runner asks the engine for snapshots,
 *	decoupled from the engine's own timer cadence
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use crate::overlay::Timestamp;
use std::time::Duration;

pub struct Pacer {
    next_deadline: Timestamp,
    frame: Duration,
}

fn frame_for(fps: u32) -> Duration {
    Duration::from_micros((1_000_000u32 / fps.max(1)) as u64)
}

// broadcast output is 25/30/50/60 - anything above 60 buys nothing
impl Pacer {
    pub fn new(target_fps: u32, now: Timestamp) -> Self {
        Self { next_deadline: now, frame: frame_for(target_fps) }
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    #[inline]
    pub fn next_deadline(&self) -> Timestamp {
        self.next_deadline
    }

    /// Returns true if a frame is due; if true, it also schedules the next deadline.
    #[inline]
    pub fn should_render(&mut self, now: Timestamp) -> bool {
        if now >= self.next_deadline {
            self.next_deadline = now + self.frame;
            true
        } else {
            false
        }
    }
}
