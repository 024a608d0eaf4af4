//! Input boundary: file loading collaborators around the core stages.

mod loader;

pub use loader::CsvLoader;
