/*
 *  overlay/engine.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Overlay engine - owns every mounted widget and the central scheduler,
 *  dispatches due timers and answers snapshot requests
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
use super::countdown::Expiry;
use super::error::EngineError;
use super::scheduler::{Scheduler, TimerKind};
use super::snapshot::PresentationSnapshot;
use super::widget::{Widget, WidgetConfig, WidgetEvent, WidgetId};
use log::{debug, info, trace};

#[derive(Debug, Default)]
struct WidgetSlot {
    generation: u32,
    widget: Option<Widget>,
}

/// Single-threaded engine driving every widget on screen.
///
/// Every mutation takes `&mut self`, so a timer dispatch can never be
/// re-entered while a previous one is still writing state.
#[derive(Debug, Default)]
pub struct OverlayEngine {
    slots: Vec<WidgetSlot>,
    free: Vec<u32>,
    scheduler: Scheduler,
    mounted: usize,
}

impl OverlayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mounted
    }

    pub fn is_empty(&self) -> bool {
        self.mounted == 0
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widget(id).is_ok()
    }

    fn widget(&self, id: WidgetId) -> Result<&Widget, EngineError> {
        self.slots
            .get(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.widget.as_ref())
            .ok_or(EngineError::UnknownWidget(id))
    }

    fn widget_mut(&mut self, id: WidgetId) -> Result<&mut Widget, EngineError> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.widget.as_mut())
            .ok_or(EngineError::UnknownWidget(id))
    }

    /// Re-derive every timer of `id` from its controllers.
    fn sync_timers(&mut self, id: WidgetId, now: Timestamp) {
        let Some(widget) = self
            .slots
            .get(id.index() as usize)
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.widget.as_ref())
        else {
            return;
        };
        for kind in TimerKind::ALL {
            self.scheduler.apply(id, kind, widget.timer_plan(kind, now), now);
        }
    }

    /// Create a widget from `config` and arm its timers.
    pub fn mount(&mut self, config: WidgetConfig, now: Timestamp) -> WidgetId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(WidgetSlot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        let id = WidgetId::new(index, slot.generation);
        debug!("Mounting {} as {:?} with {} item(s)", id, config.kind, config.items.len());
        slot.widget = Some(Widget::new(config, now));
        self.mounted += 1;
        self.sync_timers(id, now);
        id
    }

    /// Destroy a widget. Its pending timers are dropped immediately and the
    /// handle goes stale for good.
    pub fn unmount(&mut self, id: WidgetId) -> Result<(), EngineError> {
        self.widget(id)?;
        let slot = &mut self.slots[id.index() as usize];
        slot.widget = None;
        self.free.push(id.index());
        self.mounted -= 1;
        let cancelled = self.scheduler.cancel_owner(id);
        debug!("Unmounted {} ({} pending timer(s) cancelled)", id, cancelled);
        Ok(())
    }

    pub fn config(&self, id: WidgetId) -> Option<&WidgetConfig> {
        self.widget(id).ok().map(Widget::config)
    }

    /// Replace the widget's configuration wholesale.
    pub fn update_config(&mut self, id: WidgetId, config: WidgetConfig, now: Timestamp) -> Result<(), EngineError> {
        let widget = self.widget_mut(id)?;
        if widget.kind() != config.kind {
            info!("{} changes kind {:?} -> {:?}", id, widget.kind(), config.kind);
        }
        widget.apply_config(config, now);
        self.sync_timers(id, now);
        Ok(())
    }

    /// External visible flag, independent of the rest of the config.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool, now: Timestamp) -> Result<(), EngineError> {
        self.widget_mut(id)?.set_visible(visible, now);
        self.sync_timers(id, now);
        Ok(())
    }

    pub fn set_expiry(&mut self, id: WidgetId, expiry: Option<Expiry>, now: Timestamp) -> Result<(), EngineError> {
        let widget = self.widget_mut(id)?;
        if !widget.set_expiry(expiry, now) {
            return Err(EngineError::NotApplicable {
                id,
                kind: widget.kind(),
                operation: "set_expiry",
            });
        }
        self.sync_timers(id, now);
        Ok(())
    }

    /// Hold the animation (hover or pause button). The pending advance is
    /// cancelled in the same call, so no stale advance can follow.
    pub fn pause(&mut self, id: WidgetId, now: Timestamp) -> Result<(), EngineError> {
        self.set_held(id, true, now)
    }

    pub fn resume(&mut self, id: WidgetId, now: Timestamp) -> Result<(), EngineError> {
        self.set_held(id, false, now)
    }

    fn set_held(&mut self, id: WidgetId, held: bool, now: Timestamp) -> Result<(), EngineError> {
        let animated = self.widget_mut(id)?.set_held(held, now);
        if !animated {
            trace!("{} has nothing to {}", id, if held { "pause" } else { "resume" });
        }
        self.sync_timers(id, now);
        Ok(())
    }

    /// Dispatch every timer due at `now` and return what changed.
    pub fn tick(&mut self, now: Timestamp) -> Vec<(WidgetId, WidgetEvent)> {
        let mut events = Vec::new();
        for fired in self.scheduler.drain_due(now) {
            // timers of unmounted widgets were cancelled, stale ones are ignored
            let Ok(widget) = self.widget_mut(fired.owner) else {
                continue;
            };
            // an earlier dispatch in this drain may have retired the timer
            if widget.timer_plan(fired.kind, now).is_none() {
                continue;
            }
            if let Some(event) = widget.on_timer(fired.kind, now) {
                match &event {
                    WidgetEvent::Expired => info!("{} expired", fired.owner),
                    WidgetEvent::AutoHidden => info!("{} auto-hidden", fired.owner),
                    WidgetEvent::Rotated { index } => debug!("{} rotated to item {}", fired.owner, index),
                    WidgetEvent::ClockLabel | WidgetEvent::CountdownRefreshed => {
                        trace!("{} {:?}", fired.owner, event)
                    }
                }
                events.push((fired.owner, event));
            }
            self.sync_timers(fired.owner, now);
        }
        events
    }

    /// Current presentation state, `None` once unmounted.
    pub fn snapshot(&self, id: WidgetId, now: Timestamp) -> Option<PresentationSnapshot> {
        self.widget(id)
            .ok()
            .map(|w| PresentationSnapshot::assemble(w, now))
    }

    /// Snapshots of every mounted widget, in slot order.
    pub fn snapshots(&self, now: Timestamp) -> Vec<(WidgetId, PresentationSnapshot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.widget.as_ref().map(|w| {
                    (
                        WidgetId::new(index as u32, slot.generation),
                        PresentationSnapshot::assemble(w, now),
                    )
                })
            })
            .collect()
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_wakeup(&self) -> Option<Timestamp> {
        self.scheduler.next_wakeup()
    }

    pub fn pending_timers(&self, id: WidgetId) -> usize {
        self.scheduler.pending(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::widget::{SpeedClass, WidgetKind};

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn breaking(n: usize) -> WidgetConfig {
        WidgetConfig::new(WidgetKind::BreakingTicker)
            .with_items((0..n).map(|i| format!("headline {}", i)))
            .with_speed(SpeedClass::Fast)
    }

    #[test]
    fn test_mount_arms_rotation() {
        let mut engine = OverlayEngine::new();
        let id = engine.mount(breaking(3), at(0));
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.next_wakeup(), Some(at(2_000)));
        assert_eq!(engine.pending_timers(id), 1);
    }

    #[test]
    fn test_tick_rotates_and_rearms() {
        let mut engine = OverlayEngine::new();
        let id = engine.mount(breaking(3), at(0));
        assert!(engine.tick(at(1_000)).is_empty());
        let events = engine.tick(at(2_000));
        assert_eq!(events, vec![(id, WidgetEvent::Rotated { index: 1 })]);
        assert_eq!(engine.next_wakeup(), Some(at(4_000)));
        assert_eq!(engine.snapshot(id, at(2_000)).unwrap().active_index, Some(1));
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut engine = OverlayEngine::new();
        let old = engine.mount(breaking(2), at(0));
        engine.unmount(old).unwrap();
        let new = engine.mount(breaking(5), at(0));
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert_eq!(engine.unmount(old), Err(EngineError::UnknownWidget(old)));
        assert!(engine.snapshot(old, at(0)).is_none());
        assert!(engine.contains(new));
    }

    #[test]
    fn test_set_expiry_on_ticker_not_applicable() {
        let mut engine = OverlayEngine::new();
        let id = engine.mount(breaking(2), at(0));
        let err = engine.set_expiry(id, None, at(0)).unwrap_err();
        assert!(matches!(err, EngineError::NotApplicable { operation: "set_expiry", .. }));
    }

    #[test]
    fn test_pause_cancels_pending_advance() {
        let mut engine = OverlayEngine::new();
        let id = engine.mount(breaking(3), at(0));
        engine.pause(id, at(1_500)).unwrap();
        assert_eq!(engine.next_wakeup(), None);
        assert!(engine.tick(at(60_000)).is_empty());
        engine.resume(id, at(60_000)).unwrap();
        assert_eq!(engine.next_wakeup(), Some(at(60_500)));
        assert!(engine.snapshot(id, at(60_000)).map(|s| !s.paused).unwrap());
    }

    #[test]
    fn test_expiry_on_refresh_boundary_reports_once() {
        let mut engine = OverlayEngine::new();
        let cfg = WidgetConfig::new(WidgetKind::WeatherAlert).with_expires("1970-01-01T00:02:00Z");
        let id = engine.mount(cfg, at(0));
        engine.tick(at(60_000));
        let events = engine.tick(at(120_000));
        assert_eq!(events, vec![(id, WidgetEvent::Expired)]);
        assert_eq!(engine.pending_timers(id), 0);
    }

    #[test]
    fn test_snapshots_lists_mounted_only() {
        let mut engine = OverlayEngine::new();
        let a = engine.mount(breaking(1), at(0));
        let b = engine.mount(WidgetConfig::new(WidgetKind::LowerThird), at(0));
        engine.unmount(a).unwrap();
        let all = engine.snapshots(at(0));
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, b);
        assert!(engine.config(a).is_none());
    }
}
