//! Derived indicator series built from raw market inputs.

use crate::domain::{Series, Unit};
use crate::error::CoreError;
use crate::series::{AlignedPair, Frequency, align, inner_join};

/// Pounds per metric tonne, used to quote COMEX (USD/lb) in USD/t.
pub const LB_PER_TONNE: f64 = 2204.62;

/// COMEX USD/lb → USD/t, rounded to cents.
pub fn comex_usd_per_tonne(usd_per_lb: f64) -> f64 {
    (usd_per_lb * LB_PER_TONNE * 100.0).round() / 100.0
}

/// `(cash - 3m) / 3m`.
pub fn backwardation_ratio(cash: f64, three_month: f64) -> Result<f64, CoreError> {
    if three_month == 0.0 {
        return Err(CoreError::InvalidValue {
            name: "lme_three_month".to_string(),
            reason: "3-month price is zero".to_string(),
        });
    }
    Ok((cash - three_month) / three_month)
}

/// COMEX price (USD/lb) minus LME 3-month (USD/t), in USD/t.
pub fn basis_spread(comex_usd_per_lb: f64, lme_three_month: f64) -> f64 {
    comex_usd_per_tonne(comex_usd_per_lb) - lme_three_month
}

/// LME cash and 3-month quotes on their shared dates.
pub fn lme_price_frame(cash: &Series, three_month: &Series) -> Result<AlignedPair, CoreError> {
    inner_join(cash, three_month)
}

/// Daily backwardation ratio series.
pub fn backwardation_series(prices: &AlignedPair) -> Result<Series, CoreError> {
    if let Some(p) = prices.right.points().iter().find(|p| p.value == 0.0) {
        return Err(CoreError::InvalidValue {
            name: prices.right.name().to_string(),
            reason: format!("3-month price is zero on {}", p.date),
        });
    }
    prices.combine("backwardation", Unit::Ratio, |cash, three_m| (cash - three_m) / three_m)
}

/// Weekly visible inventory: LME + COMEX stocks on a Friday calendar.
pub fn visible_inventory_series(lme_stocks: &Series, comex_stocks: &Series) -> Result<Series, CoreError> {
    let pair = align(lme_stocks, comex_stocks, Frequency::WeeklyFriday)?;
    pair.combine("visible_inventory", Unit::Tonnes, |lme, comex| lme + comex)
}

/// COMEX USD/lb and LME 3-month USD/t on a shared business-day calendar.
pub fn basis_frame(comex_price: &Series, lme_three_month: &Series) -> Result<AlignedPair, CoreError> {
    align(comex_price, lme_three_month, Frequency::BusinessDay)
}

/// Daily COMEX-LME basis spread series, USD/t.
pub fn basis_series(frame: &AlignedPair) -> Result<Series, CoreError> {
    frame.combine("basis_spread", Unit::UsdPerTonne, basis_spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn comex_conversion_rounds_to_cents() {
        assert_eq!(comex_usd_per_tonne(5.0), 11023.1);
        assert!((basis_spread(5.0, 10_000.0) - 1023.1).abs() < 1e-9);
    }

    #[test]
    fn backwardation_of_contango_is_negative() {
        let r = backwardation_ratio(9_900.0, 10_000.0).unwrap();
        assert!((r + 0.01).abs() < 1e-12);
        assert!(backwardation_ratio(1.0, 0.0).is_err());
    }

    #[test]
    fn inventory_sums_weekly_aligned_stocks() {
        // LME daily Mon/Thu, COMEX only on Wednesday.
        let lme = Series::from_unsorted(
            "lme_stocks",
            Unit::Tonnes,
            vec![(d(2025, 11, 3), 100.0), (d(2025, 11, 6), 110.0), (d(2025, 11, 13), 120.0)],
        )
        .unwrap();
        let comex = Series::from_unsorted(
            "comex_stocks",
            Unit::Tonnes,
            vec![(d(2025, 11, 5), 50.0)],
        )
        .unwrap();
        let inv = visible_inventory_series(&lme, &comex).unwrap();
        // COMEX has a single bucket (2025-11-07), so only that week survives the join.
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.value_on(d(2025, 11, 7)), Some(160.0));
    }

    #[test]
    fn basis_uses_business_day_calendar() {
        let comex = Series::from_unsorted(
            "comex_price",
            Unit::UsdPerPound,
            // Friday and Saturday quotes land in the same bucket; Saturday wins.
            vec![(d(2025, 11, 14), 5.0), (d(2025, 11, 15), 5.1), (d(2025, 11, 17), 5.2)],
        )
        .unwrap();
        let lme = Series::from_unsorted(
            "lme_three_month",
            Unit::UsdPerTonne,
            vec![(d(2025, 11, 14), 11_000.0), (d(2025, 11, 17), 11_100.0)],
        )
        .unwrap();
        let frame = basis_frame(&comex, &lme).unwrap();
        let basis = basis_series(&frame).unwrap();
        assert_eq!(basis.len(), 2);
        let fri = basis.value_on(d(2025, 11, 14)).unwrap();
        assert!((fri - (comex_usd_per_tonne(5.1) - 11_000.0)).abs() < 1e-9);
    }
}
