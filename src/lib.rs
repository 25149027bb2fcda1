//! `squeeze-monitor` library crate.
//!
//! The binary (`squeeze`) is a thin wrapper around this library so that:
//!
//! - the indicator engine and scorer are testable without network access
//! - acquisition adapters can be swapped (web, CSV) without touching the core
//! - other front-ends can reuse `MarketSnapshot` directly

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod io;
pub mod math;
pub mod report;
pub mod score;
pub mod series;
