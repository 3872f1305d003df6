//! Data layer for meter consumption reports.
//!
//! Responsible for discovering and parsing device catalogs and JSONL reading
//! files, holding per-device reading histories, aggregating them into
//! period reports and exporting report series as CSV.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod reader;
pub mod store;

pub use meter_core as core;
