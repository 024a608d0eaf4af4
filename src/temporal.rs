//! Temporal axis handling: frequency specs, timestamp parsing, and
//! resolution of the timestamp column that anchors a time-series table.

use crate::error::{PrepError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A fixed interval defining the spacing of the uniform grid.
///
/// Serializes as its shorthand string (`"1h"`, `"15min"`), so configuration
/// files go through the same validation as [`Frequency::from_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    millis: i64,
}

impl TryFrom<String> for Frequency {
    type Error = PrepError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_str(&s)
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> String {
        freq.to_string()
    }
}

impl Frequency {
    /// Build from a raw millisecond interval. Zero or negative intervals
    /// are a configuration error.
    pub fn from_millis(millis: i64) -> Result<Self> {
        if millis <= 0 {
            return Err(PrepError::ConfigError(format!(
                "frequency must be positive, got {millis}ms"
            )));
        }
        Ok(Self { millis })
    }

    pub fn seconds(n: i64) -> Result<Self> {
        Self::from_millis(n.saturating_mul(1_000))
    }

    pub fn minutes(n: i64) -> Result<Self> {
        Self::from_millis(n.saturating_mul(60_000))
    }

    pub fn hours(n: i64) -> Result<Self> {
        Self::from_millis(n.saturating_mul(3_600_000))
    }

    pub fn days(n: i64) -> Result<Self> {
        Self::from_millis(n.saturating_mul(86_400_000))
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }
}

impl Default for Frequency {
    /// Hourly, matching the most common sampling of demand data.
    fn default() -> Self {
        Self { millis: 3_600_000 }
    }
}

impl FromStr for Frequency {
    type Err = PrepError;

    /// Parse interval shorthand such as `"h"`, `"15min"`, `"30s"`, `"1d"`.
    /// A missing count means one unit.
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let digits: String = lowered.chars().take_while(|c| c.is_ascii_digit()).collect();
        let unit = &lowered[digits.len()..];

        let count: i64 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| PrepError::ConfigError(format!("unrecognized frequency `{s}`")))?
        };

        let unit_millis = match unit {
            "ms" => 1,
            "s" | "sec" => 1_000,
            "m" | "min" => 60_000,
            "h" | "hour" => 3_600_000,
            "d" | "day" => 86_400_000,
            _ => {
                return Err(PrepError::ConfigError(format!(
                    "unrecognized frequency `{s}`"
                )))
            }
        };

        Self::from_millis(count.saturating_mul(unit_millis))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis % 86_400_000 == 0 {
            write!(f, "{}d", self.millis / 86_400_000)
        } else if self.millis % 3_600_000 == 0 {
            write!(f, "{}h", self.millis / 3_600_000)
        } else if self.millis % 60_000 == 0 {
            write!(f, "{}min", self.millis / 60_000)
        } else if self.millis % 1_000 == 0 {
            write!(f, "{}s", self.millis / 1_000)
        } else {
            write!(f, "{}ms", self.millis)
        }
    }
}

/// Parse a timestamp string into epoch milliseconds. Accepts the formats the
/// source exports use: `2021-06-01 13:00:00`, ISO `T` separator with optional
/// fractional seconds, minute precision, and bare dates.
pub(crate) fn parse_timestamp(raw: &str) -> Option<i64> {
    let s = raw.trim();
    const FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

pub(crate) fn millis_to_naive(ms: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// Build a millisecond-unit datetime series from epoch values.
pub(crate) fn datetime_from_millis(name: &str, ms: Vec<i64>) -> Series {
    Int64Chunked::from_vec(name.into(), ms)
        .into_datetime(TimeUnit::Milliseconds, None)
        .into_series()
}

/// Resolve which column is the temporal axis, promoting it to a datetime
/// column when a source column is named.
///
/// With `source = Some(name)` the column is parsed (strings) or accepted
/// (already datetime). With `source = None` the table must carry exactly one
/// datetime-typed column.
pub(crate) fn resolve_temporal_axis(
    df: &DataFrame,
    source: Option<&str>,
) -> Result<(DataFrame, String)> {
    match source {
        Some(name) => {
            let col = df.column(name).map_err(|_| {
                PrepError::MissingTemporalAxis(format!("column `{name}` not present"))
            })?;
            let series = col.as_materialized_series();
            match series.dtype() {
                DataType::Datetime(_, _) => Ok((df.clone(), name.to_string())),
                DataType::String => {
                    let ca = series.str()?;
                    let mut n_bad = 0usize;
                    let parsed: Vec<Option<i64>> = ca
                        .into_iter()
                        .map(|opt| {
                            let ms = opt.and_then(parse_timestamp);
                            if ms.is_none() {
                                n_bad += 1;
                            }
                            ms
                        })
                        .collect();
                    if n_bad > 0 {
                        warn!(
                            "{n_bad} value(s) in `{name}` could not be parsed as timestamps"
                        );
                    }
                    let dt = Int64Chunked::from_iter_options(name.into(), parsed.into_iter())
                        .into_datetime(TimeUnit::Milliseconds, None)
                        .into_series();
                    let mut out = df.clone();
                    out.with_column(dt)?;
                    Ok((out, name.to_string()))
                }
                other => Err(PrepError::MissingTemporalAxis(format!(
                    "column `{name}` has dtype {other}, expected datetime or string"
                ))),
            }
        }
        None => {
            let mut datetime_cols = df
                .get_columns()
                .iter()
                .filter(|c| matches!(c.dtype(), DataType::Datetime(_, _)));
            match (datetime_cols.next(), datetime_cols.next()) {
                (Some(c), None) => Ok((df.clone(), c.name().to_string())),
                (Some(_), Some(_)) => Err(PrepError::MissingTemporalAxis(
                    "more than one datetime column; name the timestamp source explicitly"
                        .to_string(),
                )),
                (None, _) => Err(PrepError::MissingTemporalAxis(
                    "no datetime column present and no timestamp source named".to_string(),
                )),
            }
        }
    }
}

/// Read the temporal axis as epoch milliseconds, normalizing the time unit.
pub(crate) fn axis_millis(df: &DataFrame, time_col: &str) -> Result<Vec<Option<i64>>> {
    let col = df.column(time_col).map_err(|_| {
        PrepError::MissingTemporalAxis(format!("column `{time_col}` not present"))
    })?;
    let series = col.as_materialized_series();
    let time_unit = match series.dtype() {
        DataType::Datetime(tu, _) => *tu,
        other => {
            return Err(PrepError::MissingTemporalAxis(format!(
                "column `{time_col}` has dtype {other}, expected datetime"
            )))
        }
    };
    let ca = series.datetime()?;
    let to_millis = |v: i64| match time_unit {
        TimeUnit::Nanoseconds => v / 1_000_000,
        TimeUnit::Microseconds => v / 1_000,
        TimeUnit::Milliseconds => v,
    };
    Ok(ca.into_iter().map(|opt| opt.map(to_millis)).collect())
}

/// Sort rows ascending by the temporal axis; null timestamps sort first.
pub(crate) fn sort_by_time(df: &DataFrame, time_col: &str) -> Result<DataFrame> {
    let ts = axis_millis(df, time_col)?;
    let mut order: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    order.sort_by_key(|&i| ts[i as usize].unwrap_or(i64::MIN));
    let idx = IdxCa::from_vec("sort_idx".into(), order);
    Ok(df.take(&idx)?)
}
