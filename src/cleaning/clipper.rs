//! Percentile-based outlier clipping.

use crate::error::{PrepError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Window of the rolling mean handed to observers, matching a full day of
/// hourly samples.
pub const ROLLING_MEAN_WINDOW: usize = 24;

/// Receives the rolling mean of a clipped column. Implementations render or
/// record it; they never influence the returned table.
pub trait RollingMeanObserver {
    fn observe(&self, column: &str, rolling_mean: &[Option<f64>]);
}

/// Saturating bounds computed from a column's observed percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub low: f64,
    pub high: f64,
}

/// Saturates extreme values of one column into its empirical percentile
/// range. Rows are never dropped and missing cells stay missing; the
/// percentile computation ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierClipper {
    column: String,
    low_pct: f64,
    high_pct: f64,
}

impl OutlierClipper {
    /// Clip `column` to its 1st/99th percentile range.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            low_pct: 0.01,
            high_pct: 0.99,
        }
    }

    /// Override the percentile range, as fractions in `[0, 1]`.
    pub fn with_percentiles(mut self, low_pct: f64, high_pct: f64) -> Self {
        self.low_pct = low_pct;
        self.high_pct = high_pct;
        self
    }

    pub fn clip(&self, df: &DataFrame) -> Result<DataFrame> {
        self.clip_inner(df, None)
    }

    /// Clip and hand the 24-sample rolling mean of the clipped column to
    /// `observer`.
    pub fn clip_observed(
        &self,
        df: &DataFrame,
        observer: &dyn RollingMeanObserver,
    ) -> Result<DataFrame> {
        self.clip_inner(df, Some(observer))
    }

    fn clip_inner(
        &self,
        df: &DataFrame,
        observer: Option<&dyn RollingMeanObserver>,
    ) -> Result<DataFrame> {
        if !(0.0..=1.0).contains(&self.low_pct)
            || !(0.0..=1.0).contains(&self.high_pct)
            || self.high_pct <= self.low_pct
        {
            return Err(PrepError::ConfigError(format!(
                "percentile range [{}, {}] is not an ordered pair within [0, 1]",
                self.low_pct, self.high_pct
            )));
        }

        let col = df
            .column(&self.column)
            .map_err(|_| PrepError::ColumnNotFound(self.column.clone()))?;
        let ca = col.as_materialized_series().cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = ca
            .f64()?
            .into_iter()
            .map(|opt| opt.filter(|v| !v.is_nan()))
            .collect();

        let clipped = match self.bounds_of(&values) {
            Some(bounds) => values
                .iter()
                .map(|opt| opt.map(|v| v.clamp(bounds.low, bounds.high)))
                .collect(),
            // A column with no observations has no bounds to apply.
            None => values,
        };

        if let Some(observer) = observer {
            let rolling = rolling_mean(&clipped, ROLLING_MEAN_WINDOW);
            observer.observe(&self.column, &rolling);
        }

        let mut out = df.clone();
        out.with_column(
            Float64Chunked::from_iter_options(self.column.as_str().into(), clipped.into_iter())
                .into_series(),
        )?;
        Ok(out)
    }

    /// Percentile bounds of the non-missing observations.
    pub fn bounds(&self, df: &DataFrame) -> Result<Option<ClipBounds>> {
        let col = df
            .column(&self.column)
            .map_err(|_| PrepError::ColumnNotFound(self.column.clone()))?;
        let ca = col.as_materialized_series().cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = ca
            .f64()?
            .into_iter()
            .map(|opt| opt.filter(|v| !v.is_nan()))
            .collect();
        Ok(self.bounds_of(&values))
    }

    fn bounds_of(&self, values: &[Option<f64>]) -> Option<ClipBounds> {
        let mut observed: Vec<f64> = values.iter().copied().flatten().collect();
        if observed.is_empty() {
            return None;
        }
        observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Some(ClipBounds {
            low: percentile(&observed, self.low_pct),
            high: percentile(&observed, self.high_pct),
        })
    }
}

/// Empirical percentile with linear interpolation between order statistics.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Rolling mean over full windows only; positions without `window`
/// consecutive non-missing values are missing.
pub(crate) fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().all(|v| v.is_some()) {
            let sum: f64 = slice.iter().flatten().sum();
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn ramp_df() -> DataFrame {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        df!("demand" => values).unwrap()
    }

    fn demand(df: &DataFrame) -> Vec<Option<f64>> {
        df.column("demand").unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_bounds_match_percentiles() {
        let df = ramp_df();
        let bounds = OutlierClipper::new("demand").bounds(&df).unwrap().unwrap();
        assert!((bounds.low - 1.99).abs() < 1e-9);
        assert!((bounds.high - 99.01).abs() < 1e-9);
    }

    #[test]
    fn test_clip_saturates_to_bounds() {
        let mut df = ramp_df();
        df.with_column(Series::new(
            "demand".into(),
            (1..=99)
                .map(|v| v as f64)
                .chain(std::iter::once(1000.0))
                .collect::<Vec<f64>>(),
        ))
        .unwrap();

        let clipper = OutlierClipper::new("demand");
        let bounds = clipper.bounds(&df).unwrap().unwrap();
        let clipped = clipper.clip(&df).unwrap();

        let values: Vec<f64> = demand(&clipped).into_iter().flatten().collect();
        assert!(values.iter().all(|&v| v >= bounds.low && v <= bounds.high));
        assert_eq!(values[99], bounds.high);
    }

    #[test]
    fn test_in_bounds_values_unchanged() {
        let df = ramp_df();
        let clipped = OutlierClipper::new("demand").clip(&df).unwrap();
        assert_eq!(demand(&clipped)[49], Some(50.0));
    }

    #[test]
    fn test_missing_cells_stay_missing() {
        let df = df!("demand" => &[Some(1.0), None, Some(3.0), Some(100.0)]).unwrap();
        let clipped = OutlierClipper::new("demand").clip(&df).unwrap();
        assert_eq!(demand(&clipped)[1], None);
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let df = ramp_df();
        let err = OutlierClipper::new("load").clip(&df).unwrap_err();
        assert!(matches!(err, PrepError::ColumnNotFound(_)));
    }

    #[test]
    fn test_bad_percentile_range_is_an_error() {
        let df = ramp_df();
        let err = OutlierClipper::new("demand")
            .with_percentiles(0.9, 0.1)
            .clip(&df)
            .unwrap_err();
        assert!(matches!(err, PrepError::ConfigError(_)));
    }

    #[test]
    fn test_rolling_mean_needs_full_window() {
        let values: Vec<Option<f64>> = (0..30).map(|v| Some(v as f64)).collect();
        let rolling = rolling_mean(&values, 24);
        assert!(rolling[..23].iter().all(|v| v.is_none()));
        // Mean of 0..=23 is 11.5.
        assert_eq!(rolling[23], Some(11.5));
    }

    #[test]
    fn test_rolling_mean_gap_voids_window() {
        let mut values: Vec<Option<f64>> = (0..6).map(|v| Some(v as f64)).collect();
        values[2] = None;
        let rolling = rolling_mean(&values, 3);
        assert_eq!(rolling, vec![None, None, None, None, None, Some(4.0)]);
    }

    struct Recorder {
        seen: RefCell<Vec<(String, usize)>>,
    }

    impl RollingMeanObserver for Recorder {
        fn observe(&self, column: &str, rolling_mean: &[Option<f64>]) {
            self.seen
                .borrow_mut()
                .push((column.to_string(), rolling_mean.len()));
        }
    }

    #[test]
    fn test_observer_sees_rolling_mean_without_affecting_output() {
        let df = ramp_df();
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
        };
        let clipper = OutlierClipper::new("demand");

        let observed = clipper.clip_observed(&df, &recorder).unwrap();
        let plain = clipper.clip(&df).unwrap();

        assert_eq!(demand(&observed), demand(&plain));
        assert_eq!(recorder.seen.borrow().as_slice(), &[("demand".to_string(), 100)]);
    }
}
