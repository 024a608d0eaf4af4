//! Calendar-derived covariates.

use crate::error::Result;
use crate::temporal::{axis_millis, millis_to_naive};
use chrono::{Datelike, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Meteorological season of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Indicator-encoding order; `Winter` is the reference category when one
    /// is dropped.
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

/// Which calendar columns to derive from the temporal axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Hour of day, 0-23.
    pub hour: bool,
    /// Day of week, 0=Monday through 6=Sunday.
    pub day_of_week: bool,
    /// True on Saturday and Sunday.
    pub is_weekend: bool,
    /// Month, 1-12.
    pub month: bool,
    pub year: bool,
    /// Season indicator columns, one per category.
    pub season: bool,
    /// Omit the first season category as the reference level.
    pub drop_reference: bool,
}

impl Default for CalendarFeatures {
    fn default() -> Self {
        Self {
            hour: true,
            day_of_week: true,
            is_weekend: true,
            month: true,
            year: true,
            season: true,
            drop_reference: false,
        }
    }
}

impl CalendarFeatures {
    /// Append the enabled calendar columns, each a pure function of the
    /// temporal axis. Rows without a timestamp get missing features.
    pub fn augment(&self, df: &DataFrame, time_col: &str) -> Result<DataFrame> {
        let stamps: Vec<_> = axis_millis(df, time_col)?
            .into_iter()
            .map(|opt| opt.and_then(millis_to_naive))
            .collect();

        let mut out = df.clone();

        if self.hour {
            out.with_column(
                Int32Chunked::from_iter_options(
                    "hour".into(),
                    stamps.iter().map(|s| s.map(|dt| dt.hour() as i32)),
                )
                .into_series(),
            )?;
        }
        if self.day_of_week {
            out.with_column(
                Int32Chunked::from_iter_options(
                    "day_of_week".into(),
                    stamps
                        .iter()
                        .map(|s| s.map(|dt| dt.weekday().num_days_from_monday() as i32)),
                )
                .into_series(),
            )?;
        }
        if self.is_weekend {
            out.with_column(
                BooleanChunked::from_iter_options(
                    "is_weekend".into(),
                    stamps
                        .iter()
                        .map(|s| s.map(|dt| dt.weekday().num_days_from_monday() >= 5)),
                )
                .into_series(),
            )?;
        }
        if self.month {
            out.with_column(
                Int32Chunked::from_iter_options(
                    "month".into(),
                    stamps.iter().map(|s| s.map(|dt| dt.month() as i32)),
                )
                .into_series(),
            )?;
        }
        if self.year {
            out.with_column(
                Int32Chunked::from_iter_options(
                    "year".into(),
                    stamps.iter().map(|s| s.map(|dt| dt.year())),
                )
                .into_series(),
            )?;
        }
        if self.season {
            let seasons: Vec<Option<Season>> = stamps
                .iter()
                .map(|s| s.map(|dt| Season::from_month(dt.month())))
                .collect();
            let skip = usize::from(self.drop_reference);
            for category in &Season::ALL[skip..] {
                out.with_column(
                    BooleanChunked::from_iter_options(
                        format!("season_{}", category.label()).as_str().into(),
                        seasons.iter().map(|s| s.map(|season| season == *category)),
                    )
                    .into_series(),
                )?;
            }
        }

        Ok(out)
    }
}
