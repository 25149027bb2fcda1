//! The per-session market snapshot and its two read operations.
//!
//! A `MarketSnapshot` is built once from a `MarketData` bundle. Construction
//! derives every indicator series up front; afterwards the snapshot is
//! read-only and both evaluation modes borrow the same stored history:
//!
//! - `get_all`: each indicator is ranked by its own latest observation
//! - `compute_from_raw`: caller-supplied raw values replace the reference
//!   for the indicators they feed; the rest fall back to `get_all` behavior

use tracing::{debug, info};

use crate::domain::{IndicatorKind, IndicatorResult, IndicatorSet, MarketData, Overrides, Series};
use crate::error::CoreError;
use crate::indicators::derive::{
    backwardation_ratio, backwardation_series, basis_frame, basis_series, basis_spread, lme_price_frame,
    visible_inventory_series,
};
use crate::math::percentile_rank;
use crate::series::AlignedPair;

/// Immutable view over one session's market data and derived indicator series.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    data: MarketData,
    lme_prices: AlignedPair,
    backwardation: Series,
    inventory: Series,
    basis: Series,
}

impl MarketSnapshot {
    /// Derive all indicator series from raw inputs.
    ///
    /// Fails if any derived series is empty or the raw inputs do not overlap.
    pub fn build(data: MarketData) -> Result<Self, CoreError> {
        let lme_prices = lme_price_frame(&data.lme_cash, &data.lme_three_month)?;
        let backwardation = backwardation_series(&lme_prices)?;
        let inventory = visible_inventory_series(&data.lme_stocks, &data.comex_stocks)?;
        let basis_inputs = basis_frame(&data.comex_price, &data.lme_three_month)?;
        let basis = basis_series(&basis_inputs)?;

        data.net_shorts.require_last()?;

        for s in [&backwardation, &inventory, &data.net_shorts, &basis] {
            if let (Some(first), Some(last)) = (s.first(), s.last()) {
                debug!(
                    series = s.name(),
                    unit = s.unit().label(),
                    n = s.len(),
                    first = %first.date,
                    last = %last.date,
                    "derived series"
                );
            }
        }
        info!(
            backwardation = backwardation.len(),
            inventory = inventory.len(),
            net_shorts = data.net_shorts.len(),
            basis = basis.len(),
            "market snapshot built"
        );

        Ok(Self {
            data,
            lme_prices,
            backwardation,
            inventory,
            basis,
        })
    }

    /// `(cash - 3m) / 3m` per LME trading day.
    pub fn backwardation_series(&self) -> &Series {
        &self.backwardation
    }

    /// LME + COMEX stocks per week ending Friday.
    pub fn inventory_series(&self) -> &Series {
        &self.inventory
    }

    pub fn net_shorts_series(&self) -> &Series {
        &self.data.net_shorts
    }

    /// COMEX (USD/t) minus LME 3-month per business day.
    pub fn basis_series(&self) -> &Series {
        &self.basis
    }

    /// The series an indicator is ranked against.
    pub fn series(&self, kind: IndicatorKind) -> &Series {
        match kind {
            IndicatorKind::Backwardation => self.backwardation_series(),
            IndicatorKind::InventoryTightness => self.inventory_series(),
            IndicatorKind::NetShorts => self.net_shorts_series(),
            IndicatorKind::BasisSpread => self.basis_series(),
        }
    }

    /// Rank every indicator by its own latest observation.
    pub fn get_all(&self) -> Result<IndicatorSet, CoreError> {
        Ok(IndicatorSet {
            backwardation: self.evaluate(IndicatorKind::Backwardation, None)?,
            inventory: self.evaluate(IndicatorKind::InventoryTightness, None)?,
            net_shorts: self.evaluate(IndicatorKind::NetShorts, None)?,
            basis: self.evaluate(IndicatorKind::BasisSpread, None)?,
        })
    }

    /// Rank fresh raw values against the stored history.
    ///
    /// Missing fields fall back to the latest stored value of the same
    /// quantity; an indicator with no relevant override is ranked exactly as
    /// in [`MarketSnapshot::get_all`].
    pub fn compute_from_raw(&self, overrides: &Overrides) -> Result<IndicatorSet, CoreError> {
        validate_overrides(overrides)?;

        // One fallback per raw quantity, shared by every indicator it feeds.
        let latest_lme = || {
            self.lme_prices.last().ok_or_else(|| CoreError::EmptySeries {
                name: "lme_prices".to_string(),
            })
        };

        let backwardation_ref = match (overrides.cash_price, overrides.three_month_price) {
            (None, None) => None,
            (cash, three_m) => {
                let (_, last_cash, last_three_m) = latest_lme()?;
                Some(backwardation_ratio(
                    cash.unwrap_or(last_cash),
                    three_m.unwrap_or(last_three_m),
                )?)
            }
        };

        let basis_ref = match (overrides.comex_price_usd_lb, overrides.three_month_price) {
            (None, None) => None,
            (comex, three_m) => {
                let three_m = match three_m {
                    Some(v) => v,
                    None => latest_lme()?.2,
                };
                let comex = match comex {
                    Some(v) => v,
                    None => self.data.comex_price.require_last()?.value,
                };
                Some(basis_spread(comex, three_m))
            }
        };

        Ok(IndicatorSet {
            backwardation: self.evaluate(IndicatorKind::Backwardation, backwardation_ref)?,
            inventory: self.evaluate(IndicatorKind::InventoryTightness, overrides.inventory_tonnes)?,
            net_shorts: self.evaluate(IndicatorKind::NetShorts, overrides.net_shorts)?,
            basis: self.evaluate(IndicatorKind::BasisSpread, basis_ref)?,
        })
    }

    fn evaluate(&self, kind: IndicatorKind, reference: Option<f64>) -> Result<IndicatorResult, CoreError> {
        let spec = kind.spec();
        let series = self.series(kind);
        let overridden = reference.is_some();
        let reference = match reference {
            Some(v) => v,
            None => series.require_last()?.value,
        };

        let rank = percentile_rank(series, spec.lookback, reference, spec.direction)?;
        debug!(
            indicator = kind.key(),
            reference,
            raw = rank.percentile,
            window = rank.window_len,
            overridden,
            "ranked indicator"
        );

        Ok(IndicatorResult {
            kind,
            raw_percentile: rank.percentile,
            value: spec.transform.apply(rank.percentile),
            reference,
            as_of: rank.window_end,
            window_start: rank.window_start,
            window_len: rank.window_len,
            overridden,
        })
    }
}

fn validate_overrides(overrides: &Overrides) -> Result<(), CoreError> {
    let fields = [
        ("cash_price", overrides.cash_price),
        ("three_month_price", overrides.three_month_price),
        ("inventory_tonnes", overrides.inventory_tonnes),
        ("net_shorts", overrides.net_shorts),
        ("comex_price_usd_lb", overrides.comex_price_usd_lb),
    ];
    for (name, value) in fields {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(CoreError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("override {v} is not finite"),
                });
            }
        }
    }
    Ok(())
}
