//! Runtime orchestration layer for the BTU metering pipeline.
//!
//! Runs each configured block's ingestion plan on a bounded blocking-task
//! pool, drives the block data lifecycle through aggregation and release,
//! and rolls the per-block outcomes up into a district summary.

pub mod block_processor;
pub mod district;

pub use metering_core as core;
pub use metering_data as data;
