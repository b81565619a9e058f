//! Path watching tests
//!
//! Deep path watchers, subtree pattern matching and the container streams.

mod deep_tests;
mod scenario_tests;
