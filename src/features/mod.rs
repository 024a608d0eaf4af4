//! Covariate derivation for a regularized series: calendar features and
//! lagged targets.

mod calendar;
mod lags;

pub use calendar::{CalendarFeatures, Season};
pub use lags::add_lag_features;

use crate::error::Result;
use crate::temporal::resolve_temporal_axis;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Derives calendar and lag covariates in one pass.
///
/// Calendar columns are appended first, then lag columns; the leading
/// `n_lags` rows are dropped so every remaining row has a complete lag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDeriver {
    target_column: String,
    timestamp_column: Option<String>,
    n_lags: usize,
    calendar: CalendarFeatures,
}

impl FeatureDeriver {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            timestamp_column: None,
            n_lags: 0,
            calendar: CalendarFeatures::default(),
        }
    }

    /// Name the column to promote to the temporal axis, as in
    /// [`crate::cleaning::TimeRegularizer::with_timestamp_column`].
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = Some(column.into());
        self
    }

    pub fn with_n_lags(mut self, n_lags: usize) -> Self {
        self.n_lags = n_lags;
        self
    }

    pub fn with_calendar(mut self, calendar: CalendarFeatures) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn derive(&self, df: &DataFrame) -> Result<DataFrame> {
        let (df, time_col) = resolve_temporal_axis(df, self.timestamp_column.as_deref())?;
        let df = self.calendar.augment(&df, &time_col)?;
        add_lag_features(&df, &self.target_column, self.n_lags)
    }
}
