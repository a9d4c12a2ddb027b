//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the configuration schema and `ParameterRecord` / `Template` views of it
//! - located runs (`RunDirectory`) and per-run statistics (`PerRunStatistics`)
//! - aggregation outputs (`AggregatedStatistics`, `Estimate`)

pub mod types;

pub use types::*;
