//! Shared scoring pipeline used by every subcommand.
//!
//! acquire -> build snapshot -> rank (snapshot or live) -> score
//!
//! The snapshot is built once and reused, so a live run and a snapshot run in
//! the same session rank against exactly the same history.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::{DataConfig, load_market_data};
use crate::domain::{IndicatorSet, Overrides};
use crate::error::AppError;
use crate::indicators::MarketSnapshot;
use crate::score::{CompositeScore, score};

/// Which evaluation mode produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Snapshot,
    Live,
}

/// Indicator results plus their composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRun {
    pub mode: RunMode,
    pub results: IndicatorSet,
    pub score: CompositeScore,
}

impl ScoredRun {
    /// `{indicator key: displayed percentile}`.
    pub fn percentiles(&self) -> BTreeMap<&'static str, f64> {
        self.results.to_map()
    }
}

/// Acquire all inputs and build the session snapshot.
pub fn build_snapshot(config: &DataConfig) -> Result<MarketSnapshot, AppError> {
    let data = load_market_data(config)?;
    Ok(MarketSnapshot::build(data)?)
}

/// Score the latest stored observations.
pub fn run_snapshot(snapshot: &MarketSnapshot) -> Result<ScoredRun, AppError> {
    let results = snapshot.get_all()?;
    Ok(scored(RunMode::Snapshot, results))
}

/// Score caller-supplied raw values against the stored history.
pub fn run_live(snapshot: &MarketSnapshot, overrides: &Overrides) -> Result<ScoredRun, AppError> {
    let results = snapshot.compute_from_raw(overrides)?;
    Ok(scored(RunMode::Live, results))
}

fn scored(mode: RunMode, results: IndicatorSet) -> ScoredRun {
    let score = score(&results);
    ScoredRun { mode, results, score }
}
