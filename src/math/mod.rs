//! Mathematical utilities: trailing-window percentile ranks.

pub mod percentile;

pub use percentile::*;
