//! Mathematical utilities: least squares and summary moments.

pub mod moments;
pub mod ols;

pub use moments::*;
pub use ols::*;
