//! Lagged-target covariates.

use crate::error::{PrepError, Result};
use polars::prelude::*;

/// Append `lag_1..=lag_<n_lags>` columns holding the target value that many
/// grid steps earlier, then drop the leading rows that have no complete lag
/// set. The drop is a deliberate sample-count reduction, not an imputation.
pub fn add_lag_features(df: &DataFrame, target_col: &str, n_lags: usize) -> Result<DataFrame> {
    if n_lags == 0 {
        return Ok(df.clone());
    }

    let col = df
        .column(target_col)
        .map_err(|_| PrepError::ColumnNotFound(target_col.to_string()))?;
    let target: Vec<Option<f64>> = col
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect();

    let mut out = df.clone();
    for lag in 1..=n_lags {
        let lagged = (0..target.len()).map(|i| {
            if i >= lag {
                target[i - lag]
            } else {
                None
            }
        });
        out.with_column(
            Float64Chunked::from_iter_options(format!("lag_{lag}").as_str().into(), lagged)
                .into_series(),
        )?;
    }

    let height = out.height();
    Ok(out.slice(n_lags as i64, height.saturating_sub(n_lags)))
}
