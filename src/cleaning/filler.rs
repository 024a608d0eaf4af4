//! Gap filling strategies for regularized and raw series.

use crate::error::{PrepError, Result};
use crate::temporal::axis_millis;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Strategy for replacing missing cells in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Take the nearest preceding non-missing value; leading gaps stay missing.
    Forward,
    /// Take the nearest following non-missing value; trailing gaps stay missing.
    Backward,
    /// Linear interpolation between the nearest non-missing neighbors,
    /// weighted by elapsed time. One-sided gaps stay missing.
    Interpolate,
    /// Leave missing cells as they are.
    None,
}

impl FromStr for FillPolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffill" | "forward" => Ok(FillPolicy::Forward),
            "bfill" | "backward" => Ok(FillPolicy::Backward),
            "interpolate" | "time" => Ok(FillPolicy::Interpolate),
            "none" => Ok(FillPolicy::None),
            other => Err(PrepError::InvalidPolicy(format!(
                "unknown fill policy `{other}`"
            ))),
        }
    }
}

/// Fills gaps in every numeric column of a table according to a [`FillPolicy`].
///
/// The temporal axis column itself is never filled; non-numeric columns pass
/// through untouched. NaN cells are treated the same as missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFiller {
    policy: FillPolicy,
}

impl ValueFiller {
    pub fn new(policy: FillPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FillPolicy {
        self.policy
    }

    /// Apply the fill policy to `df`. `time_col` names the temporal axis,
    /// which is skipped and, for [`FillPolicy::Interpolate`], supplies the
    /// interpolation weights.
    pub fn fill(&self, df: &DataFrame, time_col: &str) -> Result<DataFrame> {
        if self.policy == FillPolicy::None {
            return Ok(df.clone());
        }

        let ts = match self.policy {
            FillPolicy::Interpolate => Some(axis_millis(df, time_col)?),
            _ => None,
        };

        let mut out = df.clone();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        for name in names {
            if name == time_col {
                continue;
            }
            let column = out.column(&name)?;
            if !column.dtype().is_primitive_numeric() {
                continue;
            }
            let ca = column
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let mut values: Vec<Option<f64>> = ca
                .f64()?
                .into_iter()
                .map(|opt| opt.filter(|v| !v.is_nan()))
                .collect();

            match self.policy {
                FillPolicy::Forward => fill_forward(&mut values),
                FillPolicy::Backward => fill_backward(&mut values),
                FillPolicy::Interpolate => {
                    interpolate_by_time(&mut values, ts.as_deref().unwrap_or(&[]))
                }
                FillPolicy::None => unreachable!(),
            }

            let filled =
                Float64Chunked::from_iter_options(name.as_str().into(), values.into_iter())
                    .into_series();
            out.with_column(filled)?;
        }

        Ok(out)
    }
}

fn fill_forward(values: &mut [Option<f64>]) {
    let mut last = None;
    for cell in values.iter_mut() {
        match cell {
            Some(v) => last = Some(*v),
            None => *cell = last,
        }
    }
}

fn fill_backward(values: &mut [Option<f64>]) {
    let mut next = None;
    for cell in values.iter_mut().rev() {
        match cell {
            Some(v) => next = Some(*v),
            None => *cell = next,
        }
    }
}

/// Fill each missing cell between two known neighbors by linear interpolation
/// over elapsed time. Cells without a timestamp, or without a known neighbor
/// on both sides, are left missing.
fn interpolate_by_time(values: &mut [Option<f64>], ts: &[Option<i64>]) {
    let known: Vec<(usize, i64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| match (v, ts.get(i).copied().flatten()) {
            (Some(v), Some(t)) => Some((i, t, *v)),
            _ => None,
        })
        .collect();

    for pair in known.windows(2) {
        let (i0, t0, v0) = pair[0];
        let (i1, t1, v1) = pair[1];
        if t1 <= t0 {
            continue;
        }
        for i in (i0 + 1)..i1 {
            if values[i].is_none() {
                if let Some(Some(t)) = ts.get(i) {
                    let weight = (t - t0) as f64 / (t1 - t0) as f64;
                    values[i] = Some(v0 + (v1 - v0) * weight);
                }
            }
        }
    }
}
