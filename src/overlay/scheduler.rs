/*
 *  overlay/scheduler.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Central timer registry - every periodic tick and one-shot deadline of
 *  every widget lives here, keyed by widget identity
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
use super::widget::WidgetId;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Next headline, re-armed after every advance
    Rotation,
    /// Wall clock label refresh (1s ticker timestamp, 1min score bug)
    ClockLabel,
    /// Remaining-time label refresh, once a minute
    CountdownRefresh,
    /// Exactly at the expiry instant
    Expiry,
    AutoHide,
}

impl TimerKind {
    pub const ALL: [TimerKind; 5] = [
        TimerKind::Rotation,
        TimerKind::ClockLabel,
        TimerKind::CountdownRefresh,
        TimerKind::Expiry,
        TimerKind::AutoHide,
    ];

    const fn slot(self) -> usize {
        match self {
            TimerKind::Rotation => 0,
            TimerKind::ClockLabel => 1,
            TimerKind::CountdownRefresh => 2,
            TimerKind::Expiry => 3,
            TimerKind::AutoHide => 4,
        }
    }
}

/// How a widget wants one of its timers to behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPlan {
    /// Fire once at the given instant
    At(Timestamp),
    /// Fire repeatedly, first one period after arming
    Every(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    due: Timestamp,
    period: Option<Duration>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    owner: WidgetId,
    entries: [Option<Entry>; TimerKind::ALL.len()],
}

impl Slot {
    fn new(owner: WidgetId) -> Self {
        Self { owner, entries: [None; TimerKind::ALL.len()] }
    }

    fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }
}

/// A timer that came due during `drain_due`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub owner: WidgetId,
    pub kind: TimerKind,
    pub due: Timestamp,
}

/// Arena of timer slots indexed by widget slot.
#[derive(Debug, Default)]
pub struct Scheduler {
    slots: Vec<Option<Slot>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, owner: WidgetId) -> &mut Slot {
        let idx = owner.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        let slot = &mut self.slots[idx];
        // a previous occupant of this index never leaks timers into the new one
        if slot.as_ref().is_none_or(|s| s.owner != owner) {
            *slot = Some(Slot::new(owner));
        }
        slot.get_or_insert_with(|| Slot::new(owner))
    }

    fn slot(&self, owner: WidgetId) -> Option<&Slot> {
        self.slots
            .get(owner.index() as usize)
            .and_then(Option::as_ref)
            .filter(|s| s.owner == owner)
    }

    /// Bring one timer in line with `plan`. Periodic timers that already
    /// run with the same period keep their phase.
    pub fn apply(&mut self, owner: WidgetId, kind: TimerKind, plan: Option<TimerPlan>, now: Timestamp) {
        let seq = self.next_seq;
        let slot = self.slot_mut(owner);
        let entry = &mut slot.entries[kind.slot()];
        match plan {
            None => *entry = None,
            Some(TimerPlan::At(due)) => {
                if entry.is_some_and(|e| e.due == due && e.period.is_none()) {
                    return;
                }
                *entry = Some(Entry { due, period: None, seq });
            }
            Some(TimerPlan::Every(period)) => {
                let period = period.max(Duration::from_millis(1));
                if entry.is_some_and(|e| e.period == Some(period)) {
                    return;
                }
                *entry = Some(Entry { due: now + period, period: Some(period), seq });
            }
        }
        self.next_seq += 1;
    }

    /// Drop every timer owned by `owner`. Returns how many were pending.
    pub fn cancel_owner(&mut self, owner: WidgetId) -> usize {
        let idx = owner.index() as usize;
        let Some(slot) = self.slots.get_mut(idx) else {
            return 0;
        };
        match slot.take() {
            Some(s) if s.owner == owner => s.entries.iter().flatten().count(),
            other => {
                *slot = other;
                0
            }
        }
    }

    pub fn pending(&self, owner: WidgetId) -> usize {
        self.slot(owner)
            .map(|s| s.entries.iter().flatten().count())
            .unwrap_or(0)
    }

    pub fn due_at(&self, owner: WidgetId, kind: TimerKind) -> Option<Timestamp> {
        self.slot(owner)
            .and_then(|s| s.entries[kind.slot()])
            .map(|e| e.due)
    }

    /// Earliest pending deadline across all widgets.
    pub fn next_wakeup(&self) -> Option<Timestamp> {
        self.slots
            .iter()
            .flatten()
            .flat_map(|s| s.entries.iter().flatten())
            .map(|e| e.due)
            .min()
    }

    /// Collect every timer due at `now`, ordered by due time then arming
    /// order. One-shots are removed, periodic timers move to their next
    /// period after `now` (missed periods collapse into one firing).
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<Fired> {
        let mut fired: Vec<(Timestamp, u64, Fired)> = Vec::new();

        for slot in self.slots.iter_mut() {
            let Some(s) = slot.as_mut() else { continue };
            for kind in TimerKind::ALL {
                let entry = &mut s.entries[kind.slot()];
                let Some(e) = entry.as_mut() else { continue };
                if e.due > now {
                    continue;
                }
                fired.push((e.due, e.seq, Fired { owner: s.owner, kind, due: e.due }));
                let period = e.period;
                match period {
                    Some(period) => e.due = next_after(e.due, period, now),
                    None => *entry = None,
                }
            }
            if s.is_empty() {
                *slot = None;
            }
        }

        fired.sort_by_key(|(due, seq, _)| (*due, *seq));
        fired.into_iter().map(|(_, _, f)| f).collect()
    }
}

/// First `due + k * period` strictly after `now`, collapsing missed periods.
/// Saturates at the end of time rather than looping.
fn next_after(due: Timestamp, period: Duration, now: Timestamp) -> Timestamp {
    let period_ms = i64::try_from(period.as_millis()).unwrap_or(i64::MAX).max(1);
    let periods = now.millis_since(due) / period_ms + 1;
    Timestamp::from_millis(due.as_millis().saturating_add(periods.saturating_mul(period_ms)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut s = Scheduler::new();
        let w = WidgetId::new(0, 1);
        s.apply(w, TimerKind::AutoHide, Some(TimerPlan::At(at(30_000))), at(0));
        assert!(s.drain_due(at(29_999)).is_empty());
        let fired = s.drain_due(at(30_000));
        assert_eq!(fired, vec![Fired { owner: w, kind: TimerKind::AutoHide, due: at(30_000) }]);
        assert!(s.drain_due(at(90_000)).is_empty());
        assert_eq!(s.pending(w), 0);
    }

    #[test]
    fn test_periodic_keeps_phase_and_collapses_missed() {
        let mut s = Scheduler::new();
        let w = WidgetId::new(3, 1);
        s.apply(w, TimerKind::CountdownRefresh, Some(TimerPlan::Every(Duration::from_secs(60))), at(0));
        // re-applying the same plan later must not reset the phase
        s.apply(w, TimerKind::CountdownRefresh, Some(TimerPlan::Every(Duration::from_secs(60))), at(30_000));
        assert_eq!(s.due_at(w, TimerKind::CountdownRefresh), Some(at(60_000)));

        assert_eq!(s.drain_due(at(200_000)).len(), 1);
        assert_eq!(s.due_at(w, TimerKind::CountdownRefresh), Some(at(240_000)));
    }

    #[test]
    fn test_periodic_at_end_of_time_terminates() {
        let mut s = Scheduler::new();
        let w = WidgetId::new(0, 1);
        s.apply(w, TimerKind::ClockLabel, Some(TimerPlan::Every(Duration::from_secs(1))), at(0));
        let end = Timestamp::from_millis(i64::MAX);
        assert_eq!(s.drain_due(end).len(), 1);
        assert_eq!(s.due_at(w, TimerKind::ClockLabel), Some(end));
    }

    #[test]
    fn test_next_after_lands_on_phase() {
        let p = Duration::from_secs(60);
        assert_eq!(next_after(at(60_000), p, at(60_000)), at(120_000));
        assert_eq!(next_after(at(60_000), p, at(200_000)), at(240_000));
    }

    #[test]
    fn test_cancel_owner_by_identity() {
        let mut s = Scheduler::new();
        let a = WidgetId::new(0, 1);
        let b = WidgetId::new(1, 1);
        s.apply(a, TimerKind::Rotation, Some(TimerPlan::At(at(2_000))), at(0));
        s.apply(a, TimerKind::ClockLabel, Some(TimerPlan::Every(Duration::from_secs(1))), at(0));
        s.apply(b, TimerKind::Rotation, Some(TimerPlan::At(at(2_000))), at(0));

        // a stale handle for the same slot removes nothing
        assert_eq!(s.cancel_owner(WidgetId::new(0, 0)), 0);
        assert_eq!(s.cancel_owner(a), 2);
        let fired = s.drain_due(at(10_000));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].owner, b);
    }

    #[test]
    fn test_reused_slot_starts_clean() {
        let mut s = Scheduler::new();
        let old = WidgetId::new(0, 1);
        let new = WidgetId::new(0, 2);
        s.apply(old, TimerKind::AutoHide, Some(TimerPlan::At(at(1_000))), at(0));
        s.apply(new, TimerKind::Rotation, Some(TimerPlan::At(at(2_000))), at(0));
        assert_eq!(s.pending(old), 0);
        assert_eq!(s.pending(new), 1);
        assert_eq!(s.next_wakeup(), Some(at(2_000)));
    }

    #[test]
    fn test_fired_in_due_order() {
        let mut s = Scheduler::new();
        let a = WidgetId::new(0, 1);
        let b = WidgetId::new(1, 1);
        s.apply(b, TimerKind::Expiry, Some(TimerPlan::At(at(500))), at(0));
        s.apply(a, TimerKind::Expiry, Some(TimerPlan::At(at(900))), at(0));
        s.apply(a, TimerKind::AutoHide, Some(TimerPlan::At(at(100))), at(0));
        let order: Vec<_> = s.drain_due(at(1_000)).into_iter().map(|f| (f.owner, f.kind)).collect();
        assert_eq!(
            order,
            vec![(a, TimerKind::AutoHide), (b, TimerKind::Expiry), (a, TimerKind::Expiry)]
        );
    }

    #[test]
    fn test_plan_none_cancels_single_timer() {
        let mut s = Scheduler::new();
        let w = WidgetId::new(0, 1);
        s.apply(w, TimerKind::Rotation, Some(TimerPlan::At(at(2_000))), at(0));
        s.apply(w, TimerKind::AutoHide, Some(TimerPlan::At(at(3_000))), at(0));
        s.apply(w, TimerKind::Rotation, None, at(0));
        assert_eq!(s.pending(w), 1);
        assert_eq!(s.next_wakeup(), Some(at(3_000)));
    }
}
