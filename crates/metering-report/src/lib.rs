//! Report generation for the BTU metering pipeline.
//!
//! Renders the operator-facing text reports, the per-block diagnostics
//! logs, the CSV exports and the district summary from the runtime layer's
//! outcomes. All writers create the output directory on demand and surface
//! filesystem trouble as `ReportWrite` errors.

pub mod block_report;
pub mod csv_export;
pub mod diagnostics_log;
pub mod summary;

mod text;

pub use metering_core as core;
pub use metering_runtime as runtime;
