//! Calendar alignment of series with different native frequencies.
//!
//! Two steps:
//! - `resample`: bucket each observation into a target calendar (last value
//!   per bucket wins), then forward-fill empty buckets
//! - `inner_join`: keep only dates present in both series
//!
//! `align` runs both so the result can be combined point-by-point.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{Series, TimePoint, Unit};
use crate::error::CoreError;

/// Target calendar for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Monday..Friday; weekend observations roll back to the preceding Friday.
    BusinessDay,
    /// Weeks ending on Friday; an observation belongs to the next Friday on or after it.
    WeeklyFriday,
}

impl Frequency {
    /// Label of the bucket that `date` falls into.
    pub fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::BusinessDay => match date.weekday() {
                Weekday::Sat => date - Duration::days(1),
                Weekday::Sun => date - Duration::days(2),
                _ => date,
            },
            Frequency::WeeklyFriday => {
                let from_monday = date.weekday().num_days_from_monday() as i64;
                let ahead = (4 - from_monday).rem_euclid(7);
                date + Duration::days(ahead)
            }
        }
    }

    /// Label of the bucket following `label`.
    pub fn next(self, label: NaiveDate) -> NaiveDate {
        match self {
            Frequency::BusinessDay => match label.weekday() {
                Weekday::Fri => label + Duration::days(3),
                Weekday::Sat => label + Duration::days(2),
                _ => label + Duration::days(1),
            },
            Frequency::WeeklyFriday => label + Duration::days(7),
        }
    }
}

/// Resample onto `freq`, keeping the last observation per bucket and
/// forward-filling buckets without observations.
pub fn resample(series: &Series, freq: Frequency) -> Result<Series, CoreError> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for p in series.points() {
        // Points are date-ordered, so later observations overwrite earlier ones.
        buckets.insert(freq.bucket(p.date), p.value);
    }

    let (Some((&start, _)), Some((&end, _))) = (buckets.first_key_value(), buckets.last_key_value()) else {
        return Ok(series.clone());
    };

    let mut points = Vec::new();
    let mut carry: Option<f64> = None;
    let mut label = start;
    while label <= end {
        if let Some(v) = buckets.get(&label) {
            carry = Some(*v);
        }
        if let Some(v) = carry {
            points.push(TimePoint::new(label, v));
        }
        label = freq.next(label);
    }

    Series::new(series.name(), series.unit(), points)
}

/// Two series sharing exactly the same dates.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub left: Series,
    pub right: Series,
}

impl AlignedPair {
    /// Last shared row as `(date, left, right)`.
    pub fn last(&self) -> Option<(NaiveDate, f64, f64)> {
        let l = self.left.last()?;
        let r = self.right.last()?;
        Some((l.date, l.value, r.value))
    }

    /// Combine both sides row by row into a new series.
    pub fn combine(
        &self,
        name: impl Into<String>,
        unit: Unit,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Series, CoreError> {
        let points = self
            .left
            .points()
            .iter()
            .zip(self.right.points())
            .map(|(l, r)| TimePoint::new(l.date, f(l.value, r.value)))
            .collect();
        Series::new(name, unit, points)
    }
}

/// Keep only the dates present in both series.
///
/// No overlap is reported as `NoAlignedData` rather than an empty pair.
pub fn inner_join(left: &Series, right: &Series) -> Result<AlignedPair, CoreError> {
    let (a, b) = (left.points(), right.points());
    let mut out_l = Vec::new();
    let mut out_r = Vec::new();

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out_l.push(a[i]);
                out_r.push(b[j]);
                i += 1;
                j += 1;
            }
        }
    }

    if out_l.is_empty() {
        return Err(CoreError::NoAlignedData {
            left: left.name().to_string(),
            right: right.name().to_string(),
        });
    }

    Ok(AlignedPair {
        left: Series::new(left.name(), left.unit(), out_l)?,
        right: Series::new(right.name(), right.unit(), out_r)?,
    })
}

/// Resample both series onto `freq`, then inner-join them.
pub fn align(left: &Series, right: &Series, freq: Frequency) -> Result<AlignedPair, CoreError> {
    let left = resample(left, freq)?;
    let right = resample(right, freq)?;
    inner_join(&left, &right)
}
