//! Input/output helpers.
//!
//! - run configuration + template loading (`params`)
//! - simulator time-series tables (`series`)
//! - data slice write/reload (`export`)
//! - aggregated summary JSON for the rendering layer (`summary`)

pub mod export;
pub mod params;
pub mod series;
pub mod summary;

pub use export::*;
pub use params::*;
pub use series::*;
pub use summary::*;
