//! Series alignment: resampling, forward fill and inner joins.

pub mod align;

pub use align::*;
