//! Visualization collaborators. The cleaning stages never render anything
//! themselves; they hand series to a [`RollingMeanObserver`] and this module
//! supplies a chart-file implementation.

use crate::cleaning::{RollingMeanObserver, ROLLING_MEAN_WINDOW};
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Renders the rolling mean handed over by the clipping stage as an SVG
/// line chart. Render failures are logged, never propagated: the chart is a
/// side channel and must not affect the data path.
pub struct RollingMeanChart {
    path: PathBuf,
    size: (u32, u32),
}

impl RollingMeanChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: (900, 300),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    fn render(&self, column: &str, rolling_mean: &[Option<f64>]) -> Result<(), String> {
        let points: Vec<(f64, f64)> = rolling_mean
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect();
        if points.is_empty() {
            debug!("rolling mean of `{column}` has no full windows; skipping chart");
            return Ok(());
        }

        let x_max = rolling_mean.len().max(1) as f64;
        let (mut y_min, mut y_max) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)),
        );
        if y_min == y_max {
            y_min -= 1.0;
            y_max += 1.0;
        }

        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                format!("Rolling mean ({ROLLING_MEAN_WINDOW} samples) of {column}"),
                ("sans-serif", 18),
            )
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 30)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_desc("grid position")
            .y_desc(column)
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(LineSeries::new(points, &BLUE))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
        debug!("wrote rolling-mean chart to {}", self.path.display());
        Ok(())
    }
}

impl RollingMeanObserver for RollingMeanChart {
    fn observe(&self, column: &str, rolling_mean: &[Option<f64>]) {
        if let Err(err) = self.render(column, rolling_mean) {
            warn!("rolling-mean chart for `{column}` failed: {err}");
        }
    }
}
