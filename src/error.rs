//! Error handling for TransProtel
//!
//! The drill model has its own typed errors (`excellon::DrillError`). This
//! module covers the application layer, which uses anyhow for propagation and
//! adds file path context on the way up.

use anyhow::Context;
use std::path::Path;

use crate::excellon::DrillError;

pub type Result<T> = anyhow::Result<T>;

/// Extension trait for Results to add context with file paths
pub trait ResultExt<T> {
    /// Add context with file path information
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T>;

    /// Add context naming the drill group being processed
    fn with_group_context(self, base_name: &str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error> + Send + Sync + 'static,
{
    fn with_path_context<P: AsRef<Path>>(self, operation: &str, path: P) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Failed to {} file: {}", operation, path.as_ref().display()))
    }

    fn with_group_context(self, base_name: &str) -> Result<T> {
        self.map_err(|e| e.into())
            .with_context(|| format!("Error processing drill group '{}'", base_name))
    }
}

/// Specific error types for TransProtel operations
#[derive(Debug, thiserror::Error)]
pub enum TransProtelError {
    #[error("No input files found in: {path}")]
    NoInputFiles { path: String },

    #[error("ZIP extraction failed: {reason}")]
    ZipExtractionFailed { reason: String },

    #[error("Drill group '{base_name}' failed in {file}: {source}")]
    DrillGroupFailed {
        base_name: String,
        file: String,
        #[source]
        source: DrillError,
    },
}
