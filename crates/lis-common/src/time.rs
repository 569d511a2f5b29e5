//! Time handling for gage files and gridded time axes.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LisError, Result};

/// Parse a timestamp token from a gage file or configuration.
///
/// Supports RFC 3339, date-times with a `T` or space separator (seconds
/// optional) and plain dates (`2020-01-03`, `2020/01/03`). Values without a
/// zone are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    Err(LisError::parse(format!("invalid timestamp: {}", s)))
}

/// Inclusive time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Parse `start/end`.
    pub fn parse(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| LisError::parse(format!("time range must be start/end: {}", s)))?;
        Ok(Self::new(parse_timestamp(start)?, parse_timestamp(end)?))
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }
}

/// Step size of a CF-style time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeStep {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeStep {
    fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86400.0,
        }
    }
}

/// Decoded CF `units` attribute of a time coordinate, e.g.
/// `"minutes since 2000-01-01 00:00:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeUnits {
    pub step: TimeStep,
    pub epoch: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self> {
        let parts: Vec<&str> = units.trim().splitn(3, ' ').collect();
        if parts.len() < 3 || !parts[1].eq_ignore_ascii_case("since") {
            return Err(LisError::parse(format!(
                "unexpected time units format: '{}'",
                units
            )));
        }

        let step = match parts[0].to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => TimeStep::Seconds,
            "minutes" | "minute" | "mins" | "min" => TimeStep::Minutes,
            "hours" | "hour" | "hrs" | "h" => TimeStep::Hours,
            "days" | "day" | "d" => TimeStep::Days,
            other => {
                return Err(LisError::parse(format!("unsupported time step: '{}'", other)));
            }
        };

        // Some writers append a zone suffix ("2000-01-01 00:00:00 UTC")
        let epoch_str = parts[2].trim().trim_end_matches(" UTC").trim_end_matches('Z');
        let epoch = parse_timestamp(epoch_str)
            .map_err(|_| LisError::parse(format!("invalid time units epoch: '{}'", parts[2])))?;

        Ok(Self { step, epoch })
    }

    /// Convert an offset in this unit to an absolute timestamp.
    ///
    /// Offsets are rounded to whole milliseconds.
    pub fn decode(&self, offset: f64) -> Result<DateTime<Utc>> {
        if !offset.is_finite() {
            return Err(LisError::parse(format!("non-finite time offset: {}", offset)));
        }
        let overflow = || LisError::parse(format!("time offset overflows: {}", offset));
        let millis = (offset * self.step.seconds() * 1000.0).round();
        if millis.abs() >= i64::MAX as f64 {
            return Err(overflow());
        }
        Duration::try_milliseconds(millis as i64)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .ok_or_else(overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2020-01-03").unwrap(), expected);
        assert_eq!(parse_timestamp("2020/01/03").unwrap(), expected);
        assert_eq!(parse_timestamp("2020-01-03T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2020-01-03T00:00").unwrap(), expected);

        let dt = parse_timestamp("2020-01-03T12:30:00").unwrap();
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2020-13-45").is_err());
    }

    #[test]
    fn test_time_units_decode() {
        let units = TimeUnits::parse("minutes since 2000-01-01 00:00:00").unwrap();
        assert_eq!(units.step, TimeStep::Minutes);

        let dt = units.decode(1440.0).unwrap();
        assert_eq!(dt.year(), 2000);
        assert_eq!(dt.day(), 2);

        let units = TimeUnits::parse("days since 2020-01-01").unwrap();
        assert_eq!(
            units.decode(2.0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_time_units_invalid() {
        assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(TimeUnits::parse("days after 2000-01-01").is_err());
        assert!(TimeUnits::parse("days").is_err());
        let units = TimeUnits::parse("hours since 2000-01-01").unwrap();
        assert!(units.decode(f64::NAN).is_err());
    }

    #[test]
    fn test_time_units_decode_out_of_range() {
        let units = TimeUnits::parse("minutes since 2000-01-01 00:00:00").unwrap();
        assert!(matches!(units.decode(-1.0e30), Err(LisError::ParseError(_))));
        assert!(matches!(units.decode(1.0e30), Err(LisError::ParseError(_))));
        // Representable as milliseconds but past chrono's calendar
        assert!(matches!(units.decode(1.0e14), Err(LisError::ParseError(_))));
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::parse("2020-01-01/2020-01-05").unwrap();
        assert!(range.contains(&Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap()));
        assert!(range.contains(&range.end));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2020, 1, 6, 0, 0, 0).unwrap()));
        assert!(TimeRange::parse("2020-01-01").is_err());
    }
}
