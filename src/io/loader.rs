//! Loading of delimited source files into time-series tables.

use crate::error::{PrepError, Result};
use crate::temporal::{resolve_temporal_axis, sort_by_time};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads CSV exports, parses the designated timestamp column, and
/// establishes chronological order.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    timestamp_column: String,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    /// Loader expecting the source exports' `Datetime` column.
    pub fn new() -> Self {
        Self {
            timestamp_column: "Datetime".to_string(),
        }
    }

    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    /// Load one CSV file, promote the timestamp column, and sort
    /// chronologically.
    pub fn load_file(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()?;

        let (df, time_col) = resolve_temporal_axis(&df, Some(&self.timestamp_column))?;
        let df = sort_by_time(&df, &time_col)?;
        debug!("loaded {} row(s) from {}", df.height(), path.display());
        Ok(df)
    }

    /// Load every `*.csv` in a directory as `(file stem, table)` pairs,
    /// ordered by file name.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<(String, DataFrame)>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            frames.push((stem, self.load_file(&path)?));
        }
        Ok(frames)
    }

    /// Load and vertically concatenate every CSV in a directory, tagging
    /// each row with a `region` column holding its file stem.
    pub fn load_concatenated(&self, dir: &Path) -> Result<DataFrame> {
        let mut combined: Option<DataFrame> = None;
        for (region, mut df) in self.load_dir(dir)? {
            let height = df.height();
            df.with_column(Series::new("region".into(), vec![region; height]))?;
            combined = Some(match combined {
                None => df,
                Some(acc) => acc.vstack(&df)?,
            });
        }
        combined.ok_or_else(|| {
            PrepError::NoInputData(format!("no CSV files found in {}", dir.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, rows: &[&str]) {
        let mut file = File::create(dir.join(name)).unwrap();
        writeln!(file, "Datetime,demand").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    #[test]
    fn test_load_file_sorts_chronologically() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "north.csv",
            &["2021-01-01 02:00:00,3.0", "2021-01-01 00:00:00,1.0", "2021-01-01 01:00:00,2.0"],
        );

        let df = CsvLoader::new().load_file(&dir.path().join("north.csv")).unwrap();
        let demand: Vec<f64> = df.column("demand").unwrap().f64().unwrap().into_iter().flatten().collect();
        assert_eq!(demand, vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            df.column("Datetime").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn test_load_dir_maps_file_stems() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "north.csv", &["2021-01-01 00:00:00,1.0"]);
        write_csv(dir.path(), "south.csv", &["2021-01-01 00:00:00,2.0"]);

        let frames = CsvLoader::new().load_dir(dir.path()).unwrap();
        let names: Vec<&str> = frames.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["north", "south"]);
    }

    #[test]
    fn test_load_concatenated_tags_region() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "north.csv", &["2021-01-01 00:00:00,1.0"]);
        write_csv(dir.path(), "south.csv", &["2021-01-01 00:00:00,2.0"]);

        let df = CsvLoader::new().load_concatenated(dir.path()).unwrap();
        assert_eq!(df.height(), 2);
        let regions: Vec<&str> = df.column("region").unwrap().str().unwrap().into_iter().flatten().collect();
        assert_eq!(regions, vec!["north", "south"]);
    }

    #[test]
    fn test_empty_dir_is_no_input_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvLoader::new().load_concatenated(dir.path()).unwrap_err();
        assert!(matches!(err, PrepError::NoInputData(_)));
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let err = CsvLoader::new()
            .load_dir(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, PrepError::IoError(_)));
    }
}
