/*
 *  overlay/widget.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Widget configuration and the per-widget bundle of controllers
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

use super::clock::{wall_label, Timestamp};
use super::countdown::{CountdownController, Expiry, REFRESH_EVERY};
use super::marquee::MarqueeController;
use super::rotation::RotationController;
use super::scheduler::{TimerKind, TimerPlan};
use super::visibility::VisibilityState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Generational handle for a mounted widget.
///
/// The slot index is reused after unmount, the generation is not, so a
/// stale handle never reaches the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

impl WidgetId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl SpeedClass {
    /// Time each headline stays up in a rotating ticker.
    pub const fn rotation_interval(self) -> Duration {
        match self {
            SpeedClass::Slow => Duration::from_millis(6_000),
            SpeedClass::Normal => Duration::from_millis(4_000),
            SpeedClass::Fast => Duration::from_millis(2_000),
        }
    }

    /// Time for one full marquee loop, whatever the amount of content.
    pub const fn marquee_cycle(self) -> Duration {
        match self {
            SpeedClass::Slow => Duration::from_secs(60),
            SpeedClass::Normal => Duration::from_secs(40),
            SpeedClass::Fast => Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerMode {
    #[default]
    Continuous,
    /// Static stacked list, no animation state at all
    Discrete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    News,
    Sports,
    Business,
    Weather,
    Entertainment,
}

impl Theme {
    pub const fn label(self) -> &'static str {
        match self {
            Theme::News => "NEWS",
            Theme::Sports => "SPORTS",
            Theme::Business => "BUSINESS",
            Theme::Weather => "WEATHER",
            Theme::Entertainment => "ENTERTAINMENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    Severe,
    Warning,
    Watch,
    Advisory,
}

impl AlertLevel {
    pub const fn label(self) -> &'static str {
        match self {
            AlertLevel::Severe => "SEVERE WEATHER ALERT",
            AlertLevel::Warning => "WEATHER WARNING",
            AlertLevel::Watch => "WEATHER WATCH",
            AlertLevel::Advisory => "WEATHER ADVISORY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// One headline at a time, rotating
    BreakingTicker,
    /// Continuous marquee or static list
    NewsTicker,
    LowerThird,
    /// Countdown to expiry, optional auto-hide
    WeatherAlert,
    ScoreBug,
}

fn default_true() -> bool {
    true
}

/// Everything the editing layer hands the engine for one widget.
/// Replacing it is always a full swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub kind: WidgetKind,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub speed: SpeedClass,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub mode: TickerMode,
    #[serde(default = "default_true")]
    pub auto_play: bool,
    #[serde(default)]
    pub auto_hide: bool,
    #[serde(default)]
    pub alert: AlertLevel,
    /// RFC 3339 expiry instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default = "default_true")]
    pub show_timestamp: bool,
}

impl WidgetConfig {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            speed: SpeedClass::default(),
            visible: true,
            position: Position::default(),
            theme: Theme::default(),
            mode: TickerMode::default(),
            auto_play: true,
            auto_hide: false,
            alert: AlertLevel::default(),
            expires: None,
            show_timestamp: true,
        }
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_speed(mut self, speed: SpeedClass) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_mode(mut self, mode: TickerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_auto_hide(mut self, auto_hide: bool) -> Self {
        self.auto_hide = auto_hide;
        self
    }

    pub fn with_expires(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Position { x, y };
        self
    }

    /// Caption drawn in the widget's label block.
    pub fn banner(&self) -> &'static str {
        match self.kind {
            WidgetKind::BreakingTicker => "BREAKING NEWS",
            WidgetKind::WeatherAlert => self.alert.label(),
            WidgetKind::NewsTicker | WidgetKind::LowerThird | WidgetKind::ScoreBug => {
                self.theme.label()
            }
        }
    }

    fn expiry(&self) -> Option<Expiry> {
        self.expires.as_deref().map(Expiry::parse)
    }

    fn clock_label_every(&self) -> Option<Duration> {
        match self.kind {
            WidgetKind::NewsTicker if self.show_timestamp => Some(Duration::from_secs(1)),
            WidgetKind::ScoreBug => Some(Duration::from_secs(60)),
            _ => None,
        }
    }

    fn wants_marquee(&self) -> bool {
        self.kind == WidgetKind::NewsTicker && self.mode == TickerMode::Continuous
    }
}

/// Something a timer dispatch changed, reported back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Rotated { index: usize },
    ClockLabel,
    CountdownRefreshed,
    Expired,
    AutoHidden,
}

/// Controllers owned by one mounted widget
#[derive(Debug, Clone)]
pub struct Widget {
    config: WidgetConfig,
    visibility: VisibilityState,
    rotation: Option<RotationController>,
    marquee: Option<MarqueeController>,
    countdown: Option<CountdownController>,
    clock_label: Option<String>,
    /// Interaction hold (hover or play/pause), survives config swaps
    held: bool,
}

impl Widget {
    pub fn new(config: WidgetConfig, now: Timestamp) -> Self {
        let auto_hide = config.kind == WidgetKind::WeatherAlert && config.auto_hide;
        let visibility = VisibilityState::new(config.visible, auto_hide, now);
        let rotation = (config.kind == WidgetKind::BreakingTicker).then(|| {
            RotationController::new(config.items.len(), config.speed, config.auto_play, now)
        });
        let marquee = config
            .wants_marquee()
            .then(|| MarqueeController::new(config.speed, now));
        let countdown = (config.kind == WidgetKind::WeatherAlert)
            .then(|| CountdownController::new(config.expiry(), now));
        let clock_label = config.clock_label_every().map(|_| wall_label(now));

        Self {
            config,
            visibility,
            rotation,
            marquee,
            countdown,
            clock_label,
            held: false,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn kind(&self) -> WidgetKind {
        self.config.kind
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn rotation(&self) -> Option<&RotationController> {
        self.rotation.as_ref()
    }

    pub fn marquee(&self) -> Option<&MarqueeController> {
        self.marquee.as_ref()
    }

    pub fn countdown(&self) -> Option<&CountdownController> {
        self.countdown.as_ref()
    }

    pub fn clock_label(&self) -> Option<&str> {
        self.clock_label.as_deref()
    }

    /// Pause/resume only means something for animated tickers.
    pub fn is_pausable(&self) -> bool {
        self.rotation.is_some() || self.marquee.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.held && self.is_pausable()
    }

    /// Full config swap. A kind change rebuilds every controller; otherwise
    /// controllers keep their progress and pick up the new parameters.
    pub fn apply_config(&mut self, config: WidgetConfig, now: Timestamp) {
        if config.kind != self.config.kind {
            let held = self.held;
            *self = Widget::new(config, now);
            self.set_held(held, now);
            return;
        }

        let auto_hide = config.kind == WidgetKind::WeatherAlert && config.auto_hide;
        self.visibility.set_auto_hide(auto_hide, now);
        self.visibility.set_flag(config.visible, now);

        if let Some(rotation) = self.rotation.as_mut() {
            rotation.reconfigure(config.items.len(), config.speed, config.auto_play, now);
        }

        self.marquee = match (self.marquee.take(), config.wants_marquee()) {
            (Some(mut marquee), true) => {
                marquee.set_speed(config.speed, now);
                Some(marquee)
            }
            (None, true) => {
                let mut marquee = MarqueeController::new(config.speed, now);
                if self.held {
                    marquee.pause(now);
                }
                Some(marquee)
            }
            (_, false) => None,
        };

        if config.expires != self.config.expires {
            if let Some(countdown) = self.countdown.as_mut() {
                countdown.set_target(config.expiry(), now);
            }
        }

        self.clock_label = match (config.clock_label_every(), self.clock_label.take()) {
            (Some(_), Some(label)) => Some(label),
            (Some(_), None) => Some(wall_label(now)),
            (None, _) => None,
        };

        self.config = config;
    }

    pub fn set_visible(&mut self, visible: bool, now: Timestamp) {
        self.config.visible = visible;
        self.visibility.set_flag(visible, now);
    }

    /// Returns false when the widget has no countdown.
    pub fn set_expiry(&mut self, expiry: Option<Expiry>, now: Timestamp) -> bool {
        match self.countdown.as_mut() {
            Some(countdown) => {
                countdown.set_target(expiry, now);
                true
            }
            None => false,
        }
    }

    /// Hold or release the animation. Returns false when nothing animates.
    pub fn set_held(&mut self, held: bool, now: Timestamp) -> bool {
        self.held = held;
        if let Some(rotation) = self.rotation.as_mut() {
            if held { rotation.pause(now) } else { rotation.resume(now) }
        }
        if let Some(marquee) = self.marquee.as_mut() {
            if held { marquee.pause(now) } else { marquee.resume(now) }
        }
        self.is_pausable()
    }

    /// What the scheduler should hold for `kind` right now.
    pub fn timer_plan(&self, kind: TimerKind, now: Timestamp) -> Option<TimerPlan> {
        match kind {
            TimerKind::Rotation => self
                .rotation
                .as_ref()
                .and_then(|r| r.next_due(now))
                .map(TimerPlan::At),
            TimerKind::ClockLabel => self.config.clock_label_every().map(TimerPlan::Every),
            TimerKind::CountdownRefresh => self
                .countdown
                .as_ref()
                .filter(|c| c.wants_refresh())
                .map(|_| TimerPlan::Every(REFRESH_EVERY)),
            TimerKind::Expiry => self
                .countdown
                .as_ref()
                .and_then(CountdownController::deadline)
                .map(TimerPlan::At),
            TimerKind::AutoHide => self.visibility.deadline().map(TimerPlan::At),
        }
    }

    /// Run the work for a fired timer.
    pub fn on_timer(&mut self, kind: TimerKind, now: Timestamp) -> Option<WidgetEvent> {
        match kind {
            TimerKind::Rotation => {
                let rotation = self.rotation.as_mut()?;
                if rotation.advance(now) {
                    rotation.index().map(|index| WidgetEvent::Rotated { index })
                } else {
                    None
                }
            }
            TimerKind::ClockLabel => {
                let label = wall_label(now);
                if self.clock_label.as_deref() == Some(label.as_str()) {
                    return None;
                }
                self.clock_label = Some(label);
                Some(WidgetEvent::ClockLabel)
            }
            TimerKind::CountdownRefresh | TimerKind::Expiry => {
                let countdown = self.countdown.as_mut()?;
                if countdown.refresh(now) {
                    Some(WidgetEvent::Expired)
                } else {
                    Some(WidgetEvent::CountdownRefreshed)
                }
            }
            TimerKind::AutoHide => self.visibility.poll(now).then_some(WidgetEvent::AutoHidden),
        }
    }
}
