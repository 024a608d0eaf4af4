//! Cleaning stages: gap filling, grid regularization, outlier clipping.

mod clipper;
mod filler;
mod regularizer;

pub use clipper::{
    ClipBounds, OutlierClipper, RollingMeanObserver, ROLLING_MEAN_WINDOW,
};
pub use filler::{FillPolicy, ValueFiller};
pub use regularizer::{DuplicatePolicy, TimeRegularizer};
