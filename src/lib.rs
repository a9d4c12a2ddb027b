//! `mhc-aggregate` library crate.
//!
//! The binary (`mhca`) is a thin wrapper around this library so that:
//!
//! - the scan / extract / aggregate pipeline is testable without spawning processes
//! - the aggregated tables can be consumed by other front-ends (plotting, notebooks)
//!
//! Data flows strictly left to right: run tree -> `scan` -> `extract` -> `aggregate`.

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod extract;
pub mod io;
pub mod math;
pub mod report;
pub mod scan;
