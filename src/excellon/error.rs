//! Structural errors raised while parsing and merging drill programs.

use std::path::PathBuf;

use thiserror::Error;

use super::program::MeasurementMode;
use super::tool::ToolId;

pub type DrillResult<T> = std::result::Result<T, DrillError>;

/// Every way a drill program can be rejected.
///
/// Each variant is fatal for the file (or merge group) it was raised for and
/// for nothing else; the converter keeps going with the remaining groups.
#[derive(Debug, Error)]
pub enum DrillError {
    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("malformed body: {reason}")]
    MalformedBody { reason: String },

    #[error("tool {id} redefined with diameter {redefined} (was {existing})")]
    DuplicateToolId {
        id: ToolId,
        existing: String,
        redefined: String,
    },

    #[error("unknown tool selected: {id}")]
    UnknownTool { id: String },

    #[error("coordinate command '{line}' appears before any tool selection")]
    NoToolSelected { line: String },

    #[error("cannot merge {secondary} program into {primary} program")]
    IncompatibleMeasurementModes {
        primary: MeasurementMode,
        secondary: MeasurementMode,
    },

    #[error("invalid tool definition '{line}': {reason}")]
    InvalidToolDefinition { line: String, reason: String },

    #[error("invalid measurement mode line '{line}'")]
    InvalidMeasurementMode { line: String },

    #[error("failed to read drill file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DrillError {
    pub(crate) fn malformed_header(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_body(reason: impl Into<String>) -> Self {
        Self::MalformedBody {
            reason: reason.into(),
        }
    }

    /// Short, stable name of the error kind, used in conversion reports.
    pub fn kind(&self) -> &'static str {
        match self {
            DrillError::MalformedHeader { .. } => "MalformedHeader",
            DrillError::MalformedBody { .. } => "MalformedBody",
            DrillError::DuplicateToolId { .. } => "DuplicateToolId",
            DrillError::UnknownTool { .. } => "UnknownTool",
            DrillError::NoToolSelected { .. } => "NoToolSelected",
            DrillError::IncompatibleMeasurementModes { .. } => "IncompatibleMeasurementModes",
            DrillError::InvalidToolDefinition { .. } => "InvalidToolDefinition",
            DrillError::InvalidMeasurementMode { .. } => "InvalidMeasurementMode",
            DrillError::Io { .. } => "Io",
        }
    }
}
