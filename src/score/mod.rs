//! Composite scoring: gated basis bonus, verdict and severity bands.

pub mod composite;

pub use composite::*;
