//! Series generators for testing.
//!
//! Values follow simple patterns so tests can assert exact numbers after
//! alignment, windowing and merging.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lis_common::{Provenance, TimeSeries};

/// Midnight UTC on the given date.
///
/// Panics on an invalid date; intended for literal dates in tests.
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test date {}-{}-{}", year, month, day))
}

/// `n` consecutive daily timestamps starting at `start`.
pub fn daily_timestamps(start: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

/// Daily model series where value = `base + day offset`.
pub fn model_series(variable: &str, start: DateTime<Utc>, n: usize, base: f64) -> TimeSeries {
    ramp_series(Provenance::model(variable), start, n, base)
}

/// Daily gage series where value = `base + day offset`.
pub fn gage_series(gage_id: &str, start: DateTime<Utc>, n: usize, base: f64) -> TimeSeries {
    ramp_series(Provenance::gage(gage_id), start, n, base)
}

fn ramp_series(provenance: Provenance, start: DateTime<Utc>, n: usize, base: f64) -> TimeSeries {
    let times = daily_timestamps(start, n);
    let values = (0..n).map(|i| base + i as f64).collect();
    TimeSeries::new(provenance, times, values)
        .unwrap_or_else(|e| panic!("generated series is invalid: {}", e))
}

/// Series over explicit timestamps, values `0, 1, 2, ...`.
///
/// Timestamps must be strictly increasing.
pub fn series_at(provenance: Provenance, times: &[DateTime<Utc>]) -> TimeSeries {
    let values = (0..times.len()).map(|i| i as f64).collect();
    TimeSeries::new(provenance, times.to_vec(), values)
        .unwrap_or_else(|e| panic!("generated series is invalid: {}", e))
}

/// Gage data file body (`date value` rows) for a series.
pub fn gage_rows(series: &TimeSeries) -> String {
    series
        .iter()
        .map(|(t, v)| format!("{} {}\n", t.format("%Y-%m-%d"), v))
        .collect()
}
