//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - handed from acquisition adapters to the indicator engine
//! - exported to JSON/CSV for charting
//! - printed by the terminal report

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Semantic unit attached to a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    UsdPerTonne,
    UsdPerPound,
    Tonnes,
    Contracts,
    /// Unitless ratio (e.g. backwardation).
    Ratio,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::UsdPerTonne => "USD/t",
            Unit::UsdPerPound => "USD/lb",
            Unit::Tonnes => "t",
            Unit::Contracts => "contracts",
            Unit::Ratio => "ratio",
        }
    }
}

/// A single dated observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An immutable, strictly date-ordered series of finite observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    name: String,
    unit: Unit,
    points: Vec<TimePoint>,
}

impl Series {
    /// Build a series from points already in ascending date order.
    ///
    /// Fails on duplicate or decreasing dates and on non-finite values.
    pub fn new(name: impl Into<String>, unit: Unit, points: Vec<TimePoint>) -> Result<Self, CoreError> {
        let name = name.into();
        for (i, p) in points.iter().enumerate() {
            if !p.value.is_finite() {
                return Err(CoreError::InvalidValue {
                    name,
                    reason: format!("non-finite value on {}", p.date),
                });
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(CoreError::UnsortedDates { name, date: p.date });
            }
        }
        Ok(Self { name, unit, points })
    }

    /// Build a series from adapter output in arbitrary order.
    ///
    /// Rows are sorted by date; duplicate dates are still rejected.
    pub fn from_unsorted(
        name: impl Into<String>,
        unit: Unit,
        mut rows: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, CoreError> {
        rows.sort_by_key(|(d, _)| *d);
        let points = rows.into_iter().map(|(d, v)| TimePoint::new(d, v)).collect();
        Self::new(name, unit, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TimePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }

    /// Last observation, or `EmptySeries` if there is none.
    pub fn require_last(&self) -> Result<&TimePoint, CoreError> {
        self.points.last().ok_or_else(|| CoreError::EmptySeries {
            name: self.name.clone(),
        })
    }

    /// Points dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[TimePoint] {
        let idx = self.points.partition_point(|p| p.date < start);
        &self.points[idx..]
    }

    /// Value observed exactly on `date`, if any.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].value)
    }
}

/// Raw inputs handed over by the acquisition layer, already unit-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    /// LME cash settlement, USD/t, daily.
    pub lme_cash: Series,
    /// LME 3-month price, USD/t, daily.
    pub lme_three_month: Series,
    /// LME warehouse stocks, tonnes.
    pub lme_stocks: Series,
    /// COMEX warehouse stocks, metric tonnes.
    pub comex_stocks: Series,
    /// CFTC reported short minus long contracts, weekly.
    pub net_shorts: Series,
    /// COMEX front-month price, USD/lb, daily.
    pub comex_price: Series,
}

/// Which side of the reference value counts as "more extreme".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// A lower value is riskier; counts observations `>= reference`.
    LowerIsWorse,
    /// A higher value is riskier; counts observations `<= reference`.
    HigherIsWorse,
}

/// Post-ranking transform applied to obtain the displayed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Identity,
    /// `100 - raw`.
    Invert,
}

impl Transform {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Transform::Identity => raw,
            Transform::Invert => 100.0 - raw,
        }
    }
}

/// Trailing lookback window in calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    pub years: u32,
}

impl Lookback {
    pub const fn years(years: u32) -> Self {
        Self { years }
    }

    /// First date included in a window ending at `end`.
    ///
    /// Same month/day `years` earlier; 29 Feb clamps to 28 Feb.
    pub fn start_from(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.years * 12))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// The four squeeze indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Backwardation,
    InventoryTightness,
    NetShorts,
    BasisSpread,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [
        IndicatorKind::Backwardation,
        IndicatorKind::InventoryTightness,
        IndicatorKind::NetShorts,
        IndicatorKind::BasisSpread,
    ];

    /// Key used in the `{name: percentile}` map handed to consumers.
    pub fn key(self) -> &'static str {
        match self {
            IndicatorKind::Backwardation => "backwardation_pct",
            IndicatorKind::InventoryTightness => "inventory_tightness",
            IndicatorKind::NetShorts => "cftc_pct",
            IndicatorKind::BasisSpread => "basis_pct",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            IndicatorKind::Backwardation => "Backwardation",
            IndicatorKind::InventoryTightness => "Inventory Tightness",
            IndicatorKind::NetShorts => "CFTC Net Shorts",
            IndicatorKind::BasisSpread => "COMEX-LME Basis",
        }
    }

    pub fn spec(self) -> IndicatorSpec {
        match self {
            IndicatorKind::Backwardation => IndicatorSpec {
                kind: self,
                lookback: Lookback::years(5),
                direction: Direction::HigherIsWorse,
                transform: Transform::Identity,
            },
            IndicatorKind::InventoryTightness => IndicatorSpec {
                kind: self,
                lookback: Lookback::years(10),
                direction: Direction::LowerIsWorse,
                transform: Transform::Invert,
            },
            IndicatorKind::NetShorts => IndicatorSpec {
                kind: self,
                lookback: Lookback::years(8),
                direction: Direction::HigherIsWorse,
                transform: Transform::Identity,
            },
            IndicatorKind::BasisSpread => IndicatorSpec {
                kind: self,
                lookback: Lookback::years(10),
                direction: Direction::HigherIsWorse,
                transform: Transform::Identity,
            },
        }
    }
}

/// Ranking configuration of one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub lookback: Lookback,
    pub direction: Direction,
    pub transform: Transform,
}

/// Outcome of ranking one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorResult {
    pub kind: IndicatorKind,
    /// Percentile rank in `[0, 100]` before any display transform, full precision.
    pub raw_percentile: f64,
    /// Value after the indicator's transform, full precision.
    pub value: f64,
    /// Reference value the window was compared against.
    pub reference: f64,
    /// Last date of the ranked series (the window end).
    pub as_of: NaiveDate,
    pub window_start: NaiveDate,
    pub window_len: usize,
    /// `true` when the reference came from a caller override.
    pub overridden: bool,
}

/// Results for all four indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub backwardation: IndicatorResult,
    pub inventory: IndicatorResult,
    pub net_shorts: IndicatorResult,
    pub basis: IndicatorResult,
}

impl IndicatorSet {
    pub fn get(&self, kind: IndicatorKind) -> &IndicatorResult {
        match kind {
            IndicatorKind::Backwardation => &self.backwardation,
            IndicatorKind::InventoryTightness => &self.inventory,
            IndicatorKind::NetShorts => &self.net_shorts,
            IndicatorKind::BasisSpread => &self.basis,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorResult> {
        IndicatorKind::ALL.into_iter().map(|k| self.get(k))
    }

    /// `{indicator key: displayed percentile}`, rounded to one decimal.
    ///
    /// The basis entry is its raw percentile; the bonus is the scorer's job.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.iter()
            .map(|r| (r.kind.key(), crate::math::round1(r.value)))
            .collect()
    }
}

/// Caller-supplied fresh values for live computations.
///
/// Each field overrides one raw quantity; `None` falls back to the stored
/// series. Units must already be normalized by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    /// LME cash price, USD/t.
    pub cash_price: Option<f64>,
    /// LME 3-month price, USD/t.
    pub three_month_price: Option<f64>,
    /// Visible inventory (LME + COMEX), metric tonnes.
    pub inventory_tonnes: Option<f64>,
    /// CFTC short minus long contracts.
    pub net_shorts: Option<f64>,
    /// COMEX front-month price, USD/lb.
    pub comex_price_usd_lb: Option<f64>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        *self == Overrides::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn series_rejects_duplicate_and_unsorted_dates() {
        let pts = vec![TimePoint::new(d(2024, 1, 2), 1.0), TimePoint::new(d(2024, 1, 2), 2.0)];
        assert!(matches!(
            Series::new("x", Unit::Tonnes, pts),
            Err(CoreError::UnsortedDates { .. })
        ));

        let rows = vec![(d(2024, 1, 3), 1.0), (d(2024, 1, 2), 2.0)];
        let s = Series::from_unsorted("x", Unit::Tonnes, rows).unwrap();
        assert_eq!(s.first().unwrap().date, d(2024, 1, 2));
    }

    #[test]
    fn series_rejects_non_finite_values() {
        let pts = vec![TimePoint::new(d(2024, 1, 2), f64::NAN)];
        assert!(matches!(
            Series::new("x", Unit::Tonnes, pts),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn since_is_inclusive() {
        let s = Series::from_unsorted(
            "x",
            Unit::Ratio,
            vec![(d(2024, 1, 1), 1.0), (d(2024, 1, 2), 2.0), (d(2024, 1, 3), 3.0)],
        )
        .unwrap();
        assert_eq!(s.since(d(2024, 1, 2)).len(), 2);
        assert_eq!(s.since(d(2025, 1, 1)).len(), 0);
        assert_eq!(s.value_on(d(2024, 1, 3)), Some(3.0));
    }

    #[test]
    fn lookback_uses_calendar_anchor() {
        assert_eq!(Lookback::years(5).start_from(d(2025, 11, 15)), d(2020, 11, 15));
        assert_eq!(Lookback::years(1).start_from(d(2024, 2, 29)), d(2023, 2, 28));
    }

    #[test]
    fn invert_transform() {
        assert_eq!(Transform::Invert.apply(100.0), 0.0);
        assert_eq!(Transform::Identity.apply(42.5), 42.5);
    }
}
