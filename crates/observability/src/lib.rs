//! Process-wide tracing setup.

/// Tracing/logging initialization.
pub mod logging;

pub use logging::{init, init_for_tests};
