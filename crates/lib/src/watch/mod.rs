//! Path-addressed observation of shared containers.
//!
//! - [`parse_path`] turns `"pages.[0].tags"` into a [`Path`].
//! - [`watch_path`] streams the value at a path, re-emitting only when it
//!   changes and following the structure as containers are replaced.
//! - [`watch_path_pattern`] streams the root container whenever a
//!   transaction touches something under a (possibly wildcarded) pattern.
//! - [`observe`] and [`observe_deep`] stream a container on every shallow or
//!   deep mutation.
//!
//! Every stream emits once synchronously on subscription.

mod deep;
mod errors;
mod observe;
mod path;
mod pattern;

pub use deep::{resolve_path, resolve_segment, watch_path, watch_path_str};
pub use errors::PathError;
pub use observe::{observe, observe_deep};
pub use path::{Path, Segment, parse_path};
pub use pattern::{changed_paths, path_matches, watch_path_pattern, watch_path_pattern_str};
