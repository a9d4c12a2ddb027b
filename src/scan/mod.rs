//! Run discovery: template matching (`matcher`) and tree traversal (`locator`).

pub mod locator;
pub mod matcher;

pub use locator::*;
pub use matcher::*;
