//! Trailing-window empirical percentile rank.
//!
//! For a series `S`, lookback `N` years and reference value `v`:
//!
//! ```text
//! window = { p in S : p.date >= S.last_date - N years }
//! rank   = |{ p in window : p.value <= v }| / |window| * 100   (higher is worse)
//! rank   = |{ p in window : p.value >= v }| / |window| * 100   (lower is worse)
//! ```
//!
//! The window is always anchored on the series' own last date, so two series
//! updated on different days are each ranked against their own history.

use chrono::NaiveDate;

use crate::domain::{Direction, Lookback, Series};
use crate::error::CoreError;

/// Outcome of a single ranking, with the window that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rank {
    pub percentile: f64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub window_len: usize,
}

/// Rank `reference` against the trailing `lookback` window of `series`.
///
/// Full precision is returned; round with [`round1`] only for display.
pub fn percentile_rank(
    series: &Series,
    lookback: Lookback,
    reference: f64,
    direction: Direction,
) -> Result<Rank, CoreError> {
    if !reference.is_finite() {
        return Err(CoreError::InvalidValue {
            name: series.name().to_string(),
            reason: format!("reference value {reference} is not finite"),
        });
    }

    let window_end = series.require_last()?.date;
    let window_start = lookback.start_from(window_end);
    let window = series.since(window_start);

    if window.is_empty() {
        return Err(CoreError::EmptyWindow {
            name: series.name().to_string(),
            start: window_start,
            end: window_end,
        });
    }

    let hits = match direction {
        Direction::HigherIsWorse => window.iter().filter(|p| p.value <= reference).count(),
        Direction::LowerIsWorse => window.iter().filter(|p| p.value >= reference).count(),
    };

    Ok(Rank {
        percentile: hits as f64 / window.len() as f64 * 100.0,
        window_start,
        window_end,
        window_len: window.len(),
    })
}

/// Rank the series' own last value (snapshot mode).
pub fn latest_rank(series: &Series, lookback: Lookback, direction: Direction) -> Result<Rank, CoreError> {
    let reference = series.require_last()?.value;
    percentile_rank(series, lookback, reference, direction)
}

/// Round to one decimal place for reporting.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Unit;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn yearly(values: &[f64], first_year: i32) -> Series {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| (d(first_year + i as i32, 6, 30), *v))
            .collect();
        Series::from_unsorted("test", Unit::Ratio, rows).unwrap()
    }

    #[test]
    fn window_excludes_points_before_start() {
        // 2015..=2025; a 5y window ending 2025-06-30 starts 2020-06-30.
        let s = yearly(&[100.0, 100.0, 100.0, 100.0, 100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2015);
        let r = latest_rank(&s, Lookback::years(5), Direction::HigherIsWorse).unwrap();
        assert_eq!(r.window_start, d(2020, 6, 30));
        assert_eq!(r.window_len, 6);
        assert!((r.percentile - 100.0).abs() < 1e-12);
    }

    #[test]
    fn lower_is_worse_counts_greater_or_equal() {
        let s = yearly(&[5.0, 4.0, 3.0, 2.0, 1.0], 2021);
        // Latest is the minimum: every point is >= it.
        let r = latest_rank(&s, Lookback::years(10), Direction::LowerIsWorse).unwrap();
        assert!((r.percentile - 100.0).abs() < 1e-12);
        let r = latest_rank(&s, Lookback::years(10), Direction::HigherIsWorse).unwrap();
        assert!((r.percentile - 20.0).abs() < 1e-12);
    }

    #[test]
    fn ties_are_inclusive() {
        let s = yearly(&[2.0, 2.0, 2.0, 2.0], 2021);
        for dir in [Direction::HigherIsWorse, Direction::LowerIsWorse] {
            let r = latest_rank(&s, Lookback::years(10), dir).unwrap();
            assert_eq!(r.percentile, 100.0);
        }
    }

    #[test]
    fn override_outside_history_hits_bounds() {
        let s = yearly(&[1.0, 2.0, 3.0], 2023);
        let hi = percentile_rank(&s, Lookback::years(5), 99.0, Direction::HigherIsWorse).unwrap();
        let lo = percentile_rank(&s, Lookback::years(5), -99.0, Direction::HigherIsWorse).unwrap();
        assert_eq!(hi.percentile, 100.0);
        assert_eq!(lo.percentile, 0.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        let s = Series::new("empty", Unit::Tonnes, Vec::new()).unwrap();
        assert!(matches!(
            percentile_rank(&s, Lookback::years(5), 1.0, Direction::HigherIsWorse),
            Err(CoreError::EmptySeries { .. })
        ));
    }

    #[test]
    fn non_finite_reference_is_rejected() {
        let s = yearly(&[1.0], 2024);
        assert!(percentile_rank(&s, Lookback::years(5), f64::NAN, Direction::HigherIsWorse).is_err());
    }

    #[test]
    fn snapshot_rank_is_positive_and_finite() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let n = rng.gen_range(1..40);
            let values: Vec<f64> = (0..n).map(|_| rng.gen_range(-10.0..10.0)).collect();
            let s = yearly(&values, 1990);
            for dir in [Direction::HigherIsWorse, Direction::LowerIsWorse] {
                let r = latest_rank(&s, Lookback::years(8), dir).unwrap();
                assert!(r.percentile.is_finite());
                assert!(r.percentile > 0.0 && r.percentile <= 100.0);
            }
        }
    }

    #[test]
    fn rank_is_monotone_in_reference() {
        let mut rng = StdRng::seed_from_u64(11);
        let values: Vec<f64> = (0..30).map(|_| rng.gen_range(0.0..100.0)).collect();
        let s = yearly(&values, 1996);

        let mut refs: Vec<f64> = (0..200).map(|_| rng.gen_range(-10.0..110.0)).collect();
        refs.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut prev_hi = -1.0;
        let mut prev_lo = 101.0;
        for v in refs {
            let hi = percentile_rank(&s, Lookback::years(10), v, Direction::HigherIsWorse).unwrap();
            let lo = percentile_rank(&s, Lookback::years(10), v, Direction::LowerIsWorse).unwrap();
            assert!(hi.percentile >= prev_hi);
            assert!(lo.percentile <= prev_lo);
            prev_hi = hi.percentile;
            prev_lo = lo.percentile;
        }
    }

    #[test]
    fn round1_rounds_half_away_from_zero() {
        assert_eq!(round1(66.66666), 66.7);
        assert_eq!(round1(12.25), 12.3);
        assert_eq!(round1(0.04), 0.0);
    }
}
