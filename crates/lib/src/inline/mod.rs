//! Inline rich-text rendering.
//!
//! A [`TextRef`](crate::crdt::TextRef) delta is split into keyed [`Line`]s
//! and pushed to a host [`LineRenderer`] by the [`RenderService`]. The
//! [`RangeService`] keeps the user's selection attached to the same
//! characters across edits, and [`InlineEditor`] wires the three together
//! behind a text subscription.

mod delta;
mod editor;
mod range;
mod render;

pub use delta::{DeltaInsert, Line, delta_to_lines};
pub use editor::InlineEditor;
pub use range::{InlineRange, RangeService};
pub use render::{LineRenderer, RenderConfig, RenderError, RenderService, RenderState};
