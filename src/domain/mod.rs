//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - dated observations and immutable series (`TimePoint`, `Series`, `Unit`)
//! - indicator configuration (`IndicatorKind`, `IndicatorSpec`, `Lookback`, `Direction`)
//! - indicator outputs and live overrides (`IndicatorResult`, `IndicatorSet`, `Overrides`)

pub mod types;

pub use types::*;
