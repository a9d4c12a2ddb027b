//! Terminal reporting for scan results and aggregated tables.

pub mod format;

pub use format::*;
