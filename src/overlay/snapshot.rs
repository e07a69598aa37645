/*
 *  overlay/snapshot.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Presentation snapshot - the read-only per-tick state handed to the
 *  rendering layer
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
use super::marquee::ScrollPhase;
use super::widget::{Position, Widget, WidgetKind};

/// Everything a renderer needs to draw one widget at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationSnapshot {
    pub kind: WidgetKind,
    pub position: Position,
    /// Effective visibility: external flag and not auto-hidden
    pub visible: bool,
    /// Rotating tickers only, `None` when there is nothing to show
    pub active_index: Option<usize>,
    /// Continuous marquee only
    pub scroll: Option<ScrollPhase>,
    pub remaining_label: Option<String>,
    pub expired: Option<bool>,
    /// Ticker timestamp or score bug "last update"
    pub clock_label: Option<String>,
    pub paused: bool,
}

impl PresentationSnapshot {
    /// Compose the widget's controller outputs as of `now`.
    ///
    /// Reads only; calling it any number of times for the same `now`
    /// yields the same snapshot.
    pub fn assemble(widget: &Widget, now: Timestamp) -> Self {
        let reading = widget.countdown().and_then(|c| c.reading(now));
        let active_index = widget.rotation().and_then(|r| {
            let len = r.item_count();
            r.index().filter(|_| len > 0).map(|i| i % len)
        });

        Self {
            kind: widget.kind(),
            position: widget.config().position,
            visible: widget.visibility().is_visible(now),
            active_index,
            scroll: widget.marquee().map(|m| m.phase(now)),
            remaining_label: reading.as_ref().map(|r| r.label.clone()),
            expired: reading.map(|r| r.expired),
            clock_label: widget.clock_label().map(str::to_owned),
            paused: widget.is_paused(),
        }
    }

    /// Active headline text for rotating tickers.
    pub fn active_item<'a>(&self, items: &'a [String]) -> Option<&'a str> {
        self.active_index
            .and_then(|i| items.get(i))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::widget::{TickerMode, WidgetConfig};
    use std::time::Duration;

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_idempotent_for_fixed_now() {
        let w = Widget::new(WidgetConfig::new(WidgetKind::NewsTicker).with_items(["a", "b"]), at(0));
        let a = PresentationSnapshot::assemble(&w, at(12_345));
        let b = PresentationSnapshot::assemble(&w, at(12_345));
        assert_eq!(a, b);
        assert_eq!(a.scroll.unwrap().phase, Duration::from_millis(12_345));
    }

    #[test]
    fn test_empty_rotation_is_inert() {
        let w = Widget::new(WidgetConfig::new(WidgetKind::BreakingTicker), at(0));
        let snap = PresentationSnapshot::assemble(&w, at(60_000));
        assert!(snap.visible);
        assert_eq!(snap.active_index, None);
        assert_eq!(snap.active_item(&[]), None);
    }

    #[test]
    fn test_discrete_mode_has_no_scroll() {
        let w = Widget::new(
            WidgetConfig::new(WidgetKind::NewsTicker).with_mode(TickerMode::Discrete),
            at(0),
        );
        let snap = PresentationSnapshot::assemble(&w, at(5_000));
        assert_eq!(snap.scroll, None);
        assert_eq!(snap.active_index, None);
        assert!(!snap.paused);
    }

    #[test]
    fn test_alert_fields() {
        let w = Widget::new(
            WidgetConfig::new(WidgetKind::WeatherAlert)
                .with_expires("1970-01-01T01:30:00Z")
                .with_position(20, 100),
            at(0),
        );
        let snap = PresentationSnapshot::assemble(&w, at(0));
        assert_eq!(snap.remaining_label.as_deref(), Some("1h 30m"));
        assert_eq!(snap.expired, Some(false));
        assert_eq!(snap.position, Position { x: 20, y: 100 });
        assert_eq!(snap.scroll, None);
    }

    #[test]
    fn test_active_item_lookup() {
        let items = vec!["first".to_string(), "second".to_string()];
        let w = Widget::new(WidgetConfig::new(WidgetKind::BreakingTicker).with_items(items.clone()), at(0));
        let snap = PresentationSnapshot::assemble(&w, at(0));
        assert_eq!(snap.active_item(&items), Some("first"));
    }
}
