//! Composite squeeze score and verdict.
//!
//! ```text
//! composite = backwardation + inventory_tightness + net_shorts + bonus
//! bonus     = 25 if basis raw percentile >= 90 else 0
//! ```
//!
//! Range is `[0, 325]`. The basis percentile only gates the bonus; it never
//! contributes partial points.

use serde::Serialize;

use crate::domain::IndicatorSet;

/// Points awarded when the basis gate is met.
pub const BASIS_BONUS: f64 = 25.0;

/// Basis raw percentile at or above which the bonus applies.
pub const BASIS_BONUS_THRESHOLD: f64 = 90.0;

/// Highest attainable composite.
pub const MAX_COMPOSITE: f64 = 300.0 + BASIS_BONUS;

/// Overall squeeze-risk verdict, banded on the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Low,
    Elevated,
    High,
    Extreme,
}

impl Verdict {
    /// Lower bounds are inclusive: 150 is Elevated, 250 is Extreme.
    pub fn from_composite(composite: f64) -> Self {
        if composite < 150.0 {
            Verdict::Low
        } else if composite < 200.0 {
            Verdict::Elevated
        } else if composite < 250.0 {
            Verdict::High
        } else {
            Verdict::Extreme
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Low => "Low risk",
            Verdict::Elevated => "Elevated risk",
            Verdict::High => "High squeeze risk",
            Verdict::Extreme => "Extreme squeeze risk",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Verdict::Low => "green",
            Verdict::Elevated => "yellow",
            Verdict::High => "orange",
            Verdict::Extreme => "red",
        }
    }
}

/// Per-indicator presentation band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Elevated,
    High,
    Extreme,
}

impl Severity {
    pub fn from_percentile(value: f64) -> Self {
        if value < 50.0 {
            Severity::Low
        } else if value < 75.0 {
            Severity::Elevated
        } else if value < 90.0 {
            Severity::High
        } else {
            Severity::Extreme
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Elevated => "elevated",
            Severity::High => "high",
            Severity::Extreme => "extreme",
        }
    }
}

/// Scored outcome of one indicator set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeScore {
    pub composite: f64,
    pub bonus_applied: f64,
    pub verdict: Verdict,
}

/// `25` when the basis raw percentile reaches the threshold, else `0`.
pub fn basis_bonus(basis_raw_percentile: f64) -> f64 {
    if basis_raw_percentile >= BASIS_BONUS_THRESHOLD {
        BASIS_BONUS
    } else {
        0.0
    }
}

/// Combine the four indicator results into a composite score and verdict.
pub fn score(results: &IndicatorSet) -> CompositeScore {
    let bonus_applied = basis_bonus(results.basis.raw_percentile);
    let composite =
        results.backwardation.value + results.inventory.value + results.net_shorts.value + bonus_applied;

    CompositeScore {
        composite,
        bonus_applied,
        verdict: Verdict::from_composite(composite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndicatorKind, IndicatorResult};
    use chrono::NaiveDate;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn result(kind: IndicatorKind, raw: f64) -> IndicatorResult {
        let date = NaiveDate::from_ymd_opt(2025, 11, 14).unwrap();
        IndicatorResult {
            kind,
            raw_percentile: raw,
            value: kind.spec().transform.apply(raw),
            reference: 0.0,
            as_of: date,
            window_start: date,
            window_len: 1,
            overridden: false,
        }
    }

    fn set(bck: f64, inv_raw: f64, cftc: f64, basis: f64) -> IndicatorSet {
        IndicatorSet {
            backwardation: result(IndicatorKind::Backwardation, bck),
            inventory: result(IndicatorKind::InventoryTightness, inv_raw),
            net_shorts: result(IndicatorKind::NetShorts, cftc),
            basis: result(IndicatorKind::BasisSpread, basis),
        }
    }

    #[test]
    fn bonus_gate_is_binary_and_capped() {
        assert_eq!(basis_bonus(89.9), 0.0);
        assert_eq!(basis_bonus(90.0), 25.0);
        assert_eq!(basis_bonus(100.0), 25.0);
        assert_eq!(basis_bonus(0.0), 0.0);
    }

    #[test]
    fn verdict_boundaries_are_lower_inclusive() {
        let cases = [
            (0.0, Verdict::Low),
            (149.9, Verdict::Low),
            (150.0, Verdict::Elevated),
            (199.9, Verdict::Elevated),
            (200.0, Verdict::High),
            (249.9, Verdict::High),
            (250.0, Verdict::Extreme),
            (325.0, Verdict::Extreme),
        ];
        for (composite, expected) in cases {
            assert_eq!(Verdict::from_composite(composite), expected, "composite {composite}");
        }
        assert_eq!(Verdict::Elevated.label(), "Elevated risk");
        assert_eq!(Verdict::Extreme.color(), "red");
    }

    #[test]
    fn composite_uses_displayed_inventory() {
        // Inventory raw 20 → tightness 80.
        let s = score(&set(60.0, 20.0, 70.0, 95.0));
        assert!((s.composite - (60.0 + 80.0 + 70.0 + 25.0)).abs() < 1e-12);
        assert_eq!(s.bonus_applied, 25.0);
        assert_eq!(s.verdict, Verdict::High);
    }

    #[test]
    fn basis_below_gate_adds_nothing() {
        let s = score(&set(50.0, 50.0, 50.0, 89.99));
        assert_eq!(s.bonus_applied, 0.0);
        assert!((s.composite - 150.0).abs() < 1e-12);
        assert_eq!(s.verdict, Verdict::Elevated);
    }

    #[test]
    fn composite_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let s = score(&set(
                rng.gen_range(0.0..=100.0),
                rng.gen_range(0.0..=100.0),
                rng.gen_range(0.0..=100.0),
                rng.gen_range(0.0..=100.0),
            ));
            assert!(s.composite >= 0.0 && s.composite <= MAX_COMPOSITE);
        }
        assert_eq!(score(&set(100.0, 0.0, 100.0, 100.0)).composite, MAX_COMPOSITE);
    }

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::from_percentile(49.9), Severity::Low);
        assert_eq!(Severity::from_percentile(50.0), Severity::Elevated);
        assert_eq!(Severity::from_percentile(75.0), Severity::High);
        assert_eq!(Severity::from_percentile(90.0), Severity::Extreme);
    }
}
