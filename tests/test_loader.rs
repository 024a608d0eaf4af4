//! Integration test: loading region exports and preparing them

use chronoprep::cleaning::DuplicatePolicy;
use chronoprep::io::CsvLoader;
use chronoprep::pipeline::{PrepConfig, PrepPipeline};
use chronoprep::temporal::Frequency;
use chronoprep::PrepError;
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn write_csv(dir: &Path, name: &str, rows: &[&str]) {
    let mut file = File::create(dir.join(name)).unwrap();
    writeln!(file, "Datetime,demand").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
}

#[test]
fn test_concatenated_regions_survive_regularization() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "east.csv",
        &[
            "2021-01-01 00:00:00,100.0",
            "2021-01-01 01:00:00,110.0",
            "2021-01-01 03:00:00,130.0",
        ],
    );

    let df = CsvLoader::new().load_concatenated(dir.path()).unwrap();
    assert_eq!(df.height(), 3);

    let config = PrepConfig::default()
        .with_frequency(Frequency::hours(1).unwrap())
        .with_duplicate_policy(DuplicatePolicy::Average);
    let out = PrepPipeline::new(config).run(&df).unwrap();

    // The gap at 02:00 became a row and the region tag survived onto it
    // via the keep-first window rule (empty windows stay untagged).
    assert_eq!(out.height(), 4);
    let regions: Vec<Option<&str>> = out
        .column("region")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(regions[0], Some("east"));
    assert_eq!(regions[2], None);

    let demand: Vec<Option<f64>> = out
        .column("demand")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(demand[2], Some(120.0));
}

#[test]
fn test_multiple_files_concatenate_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "b_south.csv", &["2021-01-01 00:00:00,2.0"]);
    write_csv(dir.path(), "a_north.csv", &["2021-01-01 00:00:00,1.0"]);

    let df = CsvLoader::new().load_concatenated(dir.path()).unwrap();
    let regions: Vec<&str> = df
        .column("region")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(regions, vec!["a_north", "b_south"]);
}

#[test]
fn test_empty_directory_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let err = CsvLoader::new().load_concatenated(dir.path()).unwrap_err();
    assert!(matches!(err, PrepError::NoInputData(_)));
}

#[test]
fn test_non_csv_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "north.csv", &["2021-01-01 00:00:00,1.0"]);
    std::fs::write(dir.path().join("notes.txt"), "not data").unwrap();

    let frames = CsvLoader::new().load_dir(dir.path()).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, "north");
}
