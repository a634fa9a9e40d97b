//! Excellon drill program model
//!
//! Parsing, merging, tool deduplication and serialization of NC drill files.
//! The typical flow for one board is:
//!
//! ```text
//! parse_file(plated) ─┐
//!                     ├─ merge_all ─ to_excellon ─ <board>.txt
//! parse_file(npth) ───┘
//! ```

pub mod diagnostics;
pub mod error;
pub mod merge;
pub mod optimize;
pub mod parser;
pub mod program;
pub mod serialize;
pub mod tool;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{DrillError, DrillResult};
pub use merge::{merge, merge_all};
pub use optimize::{optimize, optimize_registry, Optimized, ToolRemap};
pub use parser::{parse_file, parse_lines, parse_str};
pub use program::{DrillProgram, MeasurementMode, Toolpaths};
pub use serialize::to_excellon;
pub use tool::{ParseToolIdError, Tool, ToolId, ToolRegistry};
