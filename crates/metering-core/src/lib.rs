//! Core domain layer for the BTU metering pipeline.
//!
//! Defines the shared data model (readings, diagnostics, meter and block
//! statistics), the error taxonomy, the command-line settings and the
//! immutable pipeline configuration derived from them, plus the naming,
//! timestamp and number-formatting helpers every other crate builds on.

pub mod error;
pub mod formatting;
pub mod models;
pub mod naming;
pub mod settings;
pub mod time_utils;

pub use error::{MeteringError, Result};
