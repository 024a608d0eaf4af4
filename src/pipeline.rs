//! Staged preparation pipeline: regularize, clip, derive.

use crate::cleaning::{
    DuplicatePolicy, FillPolicy, OutlierClipper, RollingMeanObserver, TimeRegularizer,
};
use crate::error::Result;
use crate::features::{CalendarFeatures, FeatureDeriver};
use crate::temporal::Frequency;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outlier-clipping stage options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSpec {
    pub column: String,
    pub low_pct: f64,
    pub high_pct: f64,
    /// Hand the clipped column's rolling mean to the attached observer.
    pub show_rolling_mean: bool,
}

impl ClipSpec {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            low_pct: 0.01,
            high_pct: 0.99,
            show_rolling_mean: false,
        }
    }
}

/// Feature-derivation stage options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub target_column: String,
    pub n_lags: usize,
    /// Omit the reference season indicator.
    pub drop_reference: bool,
}

impl FeatureSpec {
    /// Defaults to one day of hourly lags.
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            n_lags: 24,
            drop_reference: false,
        }
    }
}

/// The single configuration surface enumerating every recognized option of
/// the preparation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Column to promote to the temporal axis; `None` expects an existing
    /// datetime column.
    pub timestamp_column: Option<String>,
    pub frequency: Frequency,
    pub duplicate_policy: DuplicatePolicy,
    pub fill_policy: FillPolicy,
    /// Clipping stage, skipped when absent.
    pub clip: Option<ClipSpec>,
    /// Feature stage, skipped when absent.
    pub features: Option<FeatureSpec>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            timestamp_column: None,
            frequency: Frequency::default(),
            duplicate_policy: DuplicatePolicy::Average,
            fill_policy: FillPolicy::Interpolate,
            clip: None,
            features: None,
        }
    }
}

impl PrepConfig {
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = Some(column.into());
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
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

    pub fn with_clip(mut self, clip: ClipSpec) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn with_features(mut self, features: FeatureSpec) -> Self {
        self.features = Some(features);
        self
    }
}

/// Runs the configured stages in order over one table. Each stage consumes
/// the previous stage's output; nothing is shared or mutated in place.
pub struct PrepPipeline {
    config: PrepConfig,
    observer: Option<Box<dyn RollingMeanObserver>>,
}

impl PrepPipeline {
    pub fn new(config: PrepConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach the collaborator that receives rolling-mean series when
    /// [`ClipSpec::show_rolling_mean`] is set.
    pub fn with_observer(mut self, observer: Box<dyn RollingMeanObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    pub fn run(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut regularizer = TimeRegularizer::new(self.config.frequency)
            .with_duplicate_policy(self.config.duplicate_policy)
            .with_fill_policy(self.config.fill_policy);
        if let Some(column) = &self.config.timestamp_column {
            regularizer = regularizer.with_timestamp_column(column);
        }
        let mut table = regularizer.regularize(df)?;
        info!(
            "regularized {} input row(s) to {} grid row(s) at {}",
            df.height(),
            table.height(),
            self.config.frequency
        );

        if let Some(spec) = &self.config.clip {
            let clipper = OutlierClipper::new(&spec.column)
                .with_percentiles(spec.low_pct, spec.high_pct);
            table = match (&self.observer, spec.show_rolling_mean) {
                (Some(observer), true) => clipper.clip_observed(&table, observer.as_ref())?,
                (None, true) => {
                    warn!("show_rolling_mean is set but no observer is attached");
                    clipper.clip(&table)?
                }
                _ => clipper.clip(&table)?,
            };
            info!("clipped `{}` to its percentile bounds", spec.column);
        }

        if let Some(spec) = &self.config.features {
            // The regularized table carries exactly one datetime column, so
            // the deriver resolves the axis without being told its name.
            let deriver = FeatureDeriver::new(&spec.target_column)
                .with_n_lags(spec.n_lags)
                .with_calendar(CalendarFeatures {
                    drop_reference: spec.drop_reference,
                    ..Default::default()
                });
            table = deriver.derive(&table)?;
            info!(
                "derived calendar and lag features; {} row(s) remain",
                table.height()
            );
        }

        Ok(table)
    }
}
