//! # Intake Common Library
//!
//! Shared code for the center file intake pipeline:
//! - Error taxonomy and `Result` alias
//! - Configuration loading (TOML + environment overrides)
//! - Tracing initialization for embedders and tests
//! - Generic snapshot diff engine (`TableDiff`)

pub mod config;
pub mod diff;
pub mod error;
pub mod logging;

pub use diff::{diff_rows, TableDiff, TableRow};
pub use error::{Error, Result};
