//! Input/output helpers.
//!
//! - derived series exports (CSV)
//! - scored results (JSON)

pub mod export;

pub use export::*;
