//! Test utilities for planning tests.

#[allow(unused_imports)]
pub use reel_testing::{MockModel, Responder};
