//! Preparation Example
//!
//! Demonstrates regularizing a messy demand series, clipping outliers, and
//! deriving forecasting features.

use chronoprep::cleaning::{DuplicatePolicy, FillPolicy};
use chronoprep::pipeline::{ClipSpec, FeatureSpec, PrepConfig, PrepPipeline};
use chronoprep::temporal::Frequency;
use chronoprep::viz::RollingMeanChart;
use polars::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Two days of hourly readings: shuffled, a duplicated hour, two missing
    // hours, and one impossible spike.
    let mut stamps = Vec::new();
    let mut demand = Vec::new();
    for day in 1..=2u32 {
        for hour in 0..24u32 {
            if (day, hour) == (1, 7) || (day, hour) == (2, 16) {
                continue;
            }
            stamps.push(format!("2021-06-{day:02} {hour:02}:00:00"));
            demand.push(if (day, hour) == (2, 3) {
                7500.0
            } else {
                100.0 + 20.0 * ((hour as f64 - 14.0) / 24.0 * std::f64::consts::TAU).cos()
            });
        }
    }
    stamps.push("2021-06-01 12:00:00".to_string());
    demand.push(130.0);
    stamps.rotate_right(5);
    demand.rotate_right(5);

    let raw = df!("Datetime" => stamps, "demand" => demand)?;
    println!("Raw readings:");
    println!("{raw}");

    let mut clip = ClipSpec::new("demand");
    clip.show_rolling_mean = true;

    let config = PrepConfig::default()
        .with_timestamp_column("Datetime")
        .with_frequency(Frequency::hours(1)?)
        .with_duplicate_policy(DuplicatePolicy::Average)
        .with_fill_policy(FillPolicy::Interpolate)
        .with_clip(clip)
        .with_features(FeatureSpec {
            target_column: "demand".to_string(),
            n_lags: 3,
            drop_reference: false,
        });

    println!("\nConfiguration:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    let pipeline = PrepPipeline::new(config)
        .with_observer(Box::new(RollingMeanChart::new("demand_rolling.svg")));
    let prepared = pipeline.run(&raw)?;

    println!("\nPrepared table:");
    println!("{prepared}");
    println!("\nRolling-mean chart written to demand_rolling.svg");

    Ok(())
}
