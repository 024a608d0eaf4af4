//! Uniform-grid regularization of irregular time series.

use crate::cleaning::filler::{FillPolicy, ValueFiller};
use crate::error::{PrepError, Result};
use crate::temporal::{axis_millis, datetime_from_millis, resolve_temporal_axis, Frequency};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// How rows sharing one timestamp are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Duplicated timestamps are errors: keep the first-encountered row,
    /// drop the rest irrespective of content.
    KeepFirst,
    /// Duplicated timestamps are extra observations: let the resampling
    /// mean aggregate them.
    Average,
}

impl FromStr for DuplicatePolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep_first" | "first" | "reject" => Ok(DuplicatePolicy::KeepFirst),
            "average" | "mean" => Ok(DuplicatePolicy::Average),
            other => Err(PrepError::InvalidPolicy(format!(
                "unknown duplicate policy `{other}`"
            ))),
        }
    }
}

/// Rebuilds a table onto a strictly increasing, evenly spaced timeline.
///
/// The stages run in a fixed order: resolve the temporal axis, sort,
/// apply the duplicate policy, resample each frequency window to the mean
/// of its rows, then delegate gap filling to [`ValueFiller`].
///
/// ```
/// use chronoprep::cleaning::{DuplicatePolicy, FillPolicy, TimeRegularizer};
/// use chronoprep::temporal::Frequency;
///
/// let regularizer = TimeRegularizer::new(Frequency::hours(1).unwrap())
///     .with_timestamp_column("Datetime")
///     .with_duplicate_policy(DuplicatePolicy::Average)
///     .with_fill_policy(FillPolicy::Interpolate);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRegularizer {
    frequency: Frequency,
    timestamp_column: Option<String>,
    duplicate_policy: DuplicatePolicy,
    fill_policy: FillPolicy,
}

impl TimeRegularizer {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            timestamp_column: None,
            duplicate_policy: DuplicatePolicy::Average,
            fill_policy: FillPolicy::Interpolate,
        }
    }

    /// Name the column to parse and promote to the temporal axis. Without
    /// this the table must already carry exactly one datetime column.
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = Some(column.into());
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_fill_policy(mut self, policy: FillPolicy) -> Self {
        self.fill_policy = policy;
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Produce a table indexed by a strictly increasing timeline spaced
    /// exactly at the configured frequency, gap-filled per the fill policy.
    pub fn regularize(&self, df: &DataFrame) -> Result<DataFrame> {
        let (df, time_col) = resolve_temporal_axis(df, self.timestamp_column.as_deref())?;
        let ts = axis_millis(&df, &time_col)?;

        // Row order: sorted by timestamp, null timestamps dropped.
        let mut order: Vec<(i64, usize)> = ts
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (t, i)))
            .collect();
        let n_dropped = df.height() - order.len();
        if n_dropped > 0 {
            warn!("dropping {n_dropped} row(s) without a usable timestamp");
        }
        order.sort_by_key(|&(t, _)| t);

        if self.duplicate_policy == DuplicatePolicy::KeepFirst {
            let before = order.len();
            order.dedup_by_key(|&mut (t, _)| t);
            let removed = before - order.len();
            if removed > 0 {
                debug!("duplicate policy removed {removed} row(s)");
            }
        }

        let resampled = self.resample(&df, &time_col, &order)?;
        ValueFiller::new(self.fill_policy).fill(&resampled, &time_col)
    }

    /// Mean-aggregate rows into consecutive half-open windows of width
    /// `frequency`, anchored at the floor of the first timestamp. Empty
    /// windows become all-missing rows; non-numeric columns keep the first
    /// value observed in the window.
    fn resample(
        &self,
        df: &DataFrame,
        time_col: &str,
        order: &[(i64, usize)],
    ) -> Result<DataFrame> {
        let freq = self.frequency.as_millis();

        let (grid, bin_of_row): (Vec<i64>, Vec<(usize, usize)>) = if order.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let start = floor_to(order[0].0, freq);
            let end = floor_to(order[order.len() - 1].0, freq);
            let n_bins = ((end - start) / freq + 1) as usize;
            let grid = (0..n_bins as i64).map(|i| start + i * freq).collect();
            let bins = order
                .iter()
                .map(|&(t, row)| (((t - start) / freq) as usize, row))
                .collect();
            (grid, bins)
        };
        let n_bins = grid.len();
        debug!(
            "resampling {} row(s) onto {} grid position(s) at {}",
            order.len(),
            n_bins,
            self.frequency
        );

        let mut columns: Vec<Column> = Vec::with_capacity(df.width());
        columns.push(datetime_from_millis(time_col, grid).into());

        for col in df.get_columns() {
            let name = col.name().clone();
            if name.as_str() == time_col {
                continue;
            }
            if col.dtype().is_primitive_numeric() {
                let ca = col.as_materialized_series().cast(&DataType::Float64)?;
                let ca = ca.f64()?;
                let mut sums = vec![0.0f64; n_bins];
                let mut counts = vec![0usize; n_bins];
                for &(bin, row) in &bin_of_row {
                    if let Some(v) = ca.get(row) {
                        if !v.is_nan() {
                            sums[bin] += v;
                            counts[bin] += 1;
                        }
                    }
                }
                let means = (0..n_bins).map(|b| {
                    (counts[b] > 0).then(|| sums[b] / counts[b] as f64)
                });
                columns.push(
                    Float64Chunked::from_iter_options(name, means)
                        .into_series()
                        .into(),
                );
            } else {
                // Keep-first inside each window, for both duplicate policies.
                let mut first_row: Vec<Option<IdxSize>> = vec![None; n_bins];
                for &(bin, row) in &bin_of_row {
                    if first_row[bin].is_none() {
                        first_row[bin] = Some(row as IdxSize);
                    }
                }
                let idx = IdxCa::from_iter_options("first".into(), first_row.into_iter());
                let taken = col.as_materialized_series().take(&idx)?;
                columns.push(taken.with_name(name).into());
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Floor `t` to a multiple of `step` since the epoch; exact for the
/// pre-epoch timestamps negative division would otherwise round up.
fn floor_to(t: i64, step: i64) -> i64 {
    t.div_euclid(step) * step
}
