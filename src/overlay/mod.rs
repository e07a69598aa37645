/*
 *  overlay/mod.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Overlay presentation engine - per-widget timing and animation state
 *  for tickers, lower thirds, weather alerts and score bugs
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

// Time and shared primitives
pub mod clock;
pub mod stopwatch;
pub mod deadline;

// Controllers
pub mod rotation;
pub mod marquee;
pub mod countdown;
pub mod visibility;

// Composition
pub mod widget;
pub mod scheduler;
pub mod snapshot;
pub mod engine;
pub mod error;

// Re-exports for convenience
pub use clock::{ClockSource, ManualClock, SystemClock, Timestamp};
pub use countdown::{Expiry, EXPIRED_LABEL};
pub use engine::OverlayEngine;
pub use error::EngineError;
pub use marquee::ScrollPhase;
pub use snapshot::PresentationSnapshot;
pub use visibility::{VisibilityPhase, AUTO_HIDE_AFTER};
pub use widget::{
    AlertLevel, Position, SpeedClass, Theme, TickerMode, WidgetConfig, WidgetEvent, WidgetId,
    WidgetKind,
};
