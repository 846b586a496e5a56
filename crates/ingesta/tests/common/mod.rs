//! Shared test utilities for ingesta integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp directories and a SQLite file
//! - Builders for job definitions and spreadsheet fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
