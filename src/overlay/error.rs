/*
 *  overlay/error.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the overlay engine
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

use super::widget::{WidgetId, WidgetKind};
use thiserror::Error;

/// Content and timing problems never surface here, they degrade to a
/// benign display state. Only addressing mistakes do.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Never mounted, or unmounted since
    #[error("unknown widget {0}")]
    UnknownWidget(WidgetId),

    /// Operation has no meaning for this kind of widget
    #[error("{operation} is not supported by {kind:?} widget {id}")]
    NotApplicable {
        id: WidgetId,
        kind: WidgetKind,
        operation: &'static str,
    },
}
