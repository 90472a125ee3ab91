//! Data ingestion layer for the BTU metering pipeline.
//!
//! Responsible for decoding raw meter-log lines, tracking sensor health
//! markers, parsing monthly files into typed readings, rolling readings up
//! into per-meter and per-block statistics, and discovering meter folders
//! on disk.

pub mod block_data;
pub mod block_stats;
pub mod decoder;
pub mod discovery;
pub mod health;
pub mod meter_stats;
pub mod parser;

pub use metering_core as core;
