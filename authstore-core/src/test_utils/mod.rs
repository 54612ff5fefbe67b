//! Test utilities and helpers for authstore
//!
//! Fixtures and assertion helpers shared by unit tests and the integration
//! tests under `tests/`.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
