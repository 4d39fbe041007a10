//! Shared fixtures for the integration tests.
//!
//! Each test binary uses a subset of these types.
#![allow(dead_code, reason = "each test binary uses a different subset")]

pub mod catalog;
pub mod commerce;
pub mod fleet;
pub mod graph;
pub mod people;

use mapweave::Mapper;
use rstest::fixture;

/// Mapper with default declarations and no services.
#[fixture]
pub fn mapper() -> Mapper {
    Mapper::new()
}
