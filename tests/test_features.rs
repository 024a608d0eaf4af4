//! Integration test: feature derivation on a regularized series

use chronoprep::features::{CalendarFeatures, FeatureDeriver, Season};
use polars::prelude::*;

const HOUR: i64 = 3_600_000;

fn hourly_frame(start_ms: i64, n: usize) -> DataFrame {
    let ts = Int64Chunked::from_vec(
        "ts".into(),
        (0..n as i64).map(|i| start_ms + i * HOUR).collect(),
    )
    .into_datetime(TimeUnit::Milliseconds, None)
    .into_series();
    let demand: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    DataFrame::new(vec![ts.into(), Series::new("demand".into(), demand).into()]).unwrap()
}

#[test]
fn test_lag_columns_shift_target() {
    let df = hourly_frame(0, 10);
    let out = FeatureDeriver::new("demand").with_n_lags(2).derive(&df).unwrap();

    assert_eq!(out.height(), 8);
    let target: Vec<f64> = out.column("demand").unwrap().f64().unwrap().into_iter().flatten().collect();
    let lag_1: Vec<f64> = out.column("lag_1").unwrap().f64().unwrap().into_iter().flatten().collect();
    for i in 0..out.height() {
        assert_eq!(lag_1[i], target[i] - 1.0);
    }
}

#[test]
fn test_hour_cycles_through_day() {
    // Start at midnight UTC on an hour-aligned epoch multiple.
    let df = hourly_frame(0, 30);
    let out = FeatureDeriver::new("demand").derive(&df).unwrap();
    let hours: Vec<i32> = out.column("hour").unwrap().i32().unwrap().into_iter().flatten().collect();
    assert_eq!(hours[0], 0);
    assert_eq!(hours[23], 23);
    assert_eq!(hours[24], 0);
}

#[test]
fn test_season_labels_cover_the_year() {
    assert_eq!(Season::from_month(1), Season::Winter);
    assert_eq!(Season::from_month(4), Season::Spring);
    assert_eq!(Season::from_month(7), Season::Summer);
    assert_eq!(Season::from_month(10), Season::Fall);
    assert_eq!(Season::ALL.map(|s| s.label()), ["winter", "spring", "summer", "fall"]);
}

#[test]
fn test_calendar_only_preserves_row_count() {
    let df = hourly_frame(0, 12);
    let out = FeatureDeriver::new("demand")
        .with_calendar(CalendarFeatures::default())
        .derive(&df)
        .unwrap();
    assert_eq!(out.height(), 12);
}

#[test]
fn test_drop_reference_removes_one_indicator() {
    let df = hourly_frame(0, 4);
    let full = FeatureDeriver::new("demand").derive(&df).unwrap();
    let dropped = FeatureDeriver::new("demand")
        .with_calendar(CalendarFeatures {
            drop_reference: true,
            ..Default::default()
        })
        .derive(&df)
        .unwrap();
    assert_eq!(full.width() - dropped.width(), 1);
    assert!(dropped.column("season_winter").is_err());
}
