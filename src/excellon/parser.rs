//! Excellon text to [`DrillProgram`].
//!
//! Only the subset needed to merge drill files is understood: tool
//! definitions and the unit line in the header, tool selections and
//! coordinate commands in the body. Everything else is skipped and, unless
//! it is a well-known harmless code, reported through [`Diagnostics`].

use std::path::Path;

use super::diagnostics::Diagnostics;
use super::error::{DrillError, DrillResult};
use super::program::{DrillProgram, MeasurementMode};
use super::tool::{Tool, ToolId, ToolRegistry};

/// Header codes that carry nothing this model keeps.
const QUIET_HEADER_CODES: &[&str] = &["FMAT", "VER", "ICI", "TCST", "DETECT", "ATC"];

/// Body codes that the serializer writes back on its own.
const QUIET_BODY_CODES: &[&str] = &["G90", "G05", "M71", "M72"];

/// A trimmed, non-blank source line with its 1-based line number.
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    number: usize,
    text: &'a str,
}

enum HeaderLine<'a> {
    Comment,
    Tool,
    Measurement(&'a str),
    Other,
}

enum BodyLine {
    Comment,
    SelectTool,
    Coordinate,
    Other,
}

fn classify_header(text: &str) -> HeaderLine<'_> {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b';') => HeaderLine::Comment,
        Some(b'T') if bytes.get(1).is_some_and(u8::is_ascii_digit) => HeaderLine::Tool,
        _ if text.starts_with("INCH") || text.starts_with("METRIC") => {
            HeaderLine::Measurement(text)
        }
        _ => HeaderLine::Other,
    }
}

fn classify_body(text: &str) -> BodyLine {
    match text.as_bytes().first() {
        Some(b';') => BodyLine::Comment,
        Some(b'T') => BodyLine::SelectTool,
        Some(b'X') | Some(b'Y') => BodyLine::Coordinate,
        _ => BodyLine::Other,
    }
}

/// Parse a whole drill file held in memory. CRLF line endings are accepted.
pub fn parse_str(text: &str, diagnostics: &mut Diagnostics) -> DrillResult<DrillProgram> {
    parse_lines(text.lines(), diagnostics)
}

/// Read and parse a drill file from disk.
pub fn parse_file(path: &Path, diagnostics: &mut Diagnostics) -> DrillResult<DrillProgram> {
    let text = std::fs::read_to_string(path).map_err(|source| DrillError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text, diagnostics)
}

/// Parse raw drill file lines. Lines are trimmed and blank lines dropped
/// before anything else happens.
pub fn parse_lines<I, S>(lines: I, diagnostics: &mut Diagnostics) -> DrillResult<DrillProgram>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let owned: Vec<S> = lines.into_iter().collect();
    let lines: Vec<SourceLine<'_>> = owned
        .iter()
        .enumerate()
        .map(|(idx, line)| SourceLine {
            number: idx + 1,
            text: line.as_ref().trim(),
        })
        .filter(|line| !line.text.is_empty())
        .collect();

    let header_start = lines
        .iter()
        .position(|line| line.text == "M48")
        .ok_or_else(|| DrillError::malformed_header("missing M48 header start"))?;
    let delimiter = lines[header_start + 1..]
        .iter()
        .position(|line| line.text == "%")
        .map(|offset| header_start + 1 + offset)
        .ok_or_else(|| DrillError::malformed_header("missing '%' header terminator"))?;

    let mut program = parse_header(&lines[header_start + 1..delimiter], diagnostics)?;

    let body_end = lines[delimiter + 1..]
        .iter()
        .position(|line| line.text == "M30")
        .map(|offset| delimiter + 1 + offset)
        .ok_or_else(|| DrillError::malformed_body("missing M30 program end"))?;

    parse_body(&lines[delimiter + 1..body_end], &mut program, diagnostics)?;

    Ok(program)
}

fn parse_header(lines: &[SourceLine<'_>], diagnostics: &mut Diagnostics) -> DrillResult<DrillProgram> {
    let mut registry = ToolRegistry::new();
    let mut measurement: Option<(MeasurementMode, Option<String>)> = None;

    for line in lines {
        match classify_header(line.text) {
            HeaderLine::Comment => {}
            HeaderLine::Tool => {
                let tool = Tool::parse_definition(line.text)?;
                let id = tool.id();
                if !registry.insert(tool)? {
                    diagnostics.info(
                        Some(line.number),
                        format!("identical redefinition of {id} ignored"),
                    );
                }
            }
            HeaderLine::Measurement(text) => {
                let (mode, zero_style) = match text.split_once(',') {
                    Some((mode, zero_style)) => (mode, Some(zero_style.to_string())),
                    None => (text, None),
                };
                let mode = mode
                    .parse::<MeasurementMode>()
                    .map_err(|_| DrillError::InvalidMeasurementMode {
                        line: text.to_string(),
                    })?;
                if let Some((previous, _)) = &measurement {
                    diagnostics.warn(
                        Some(line.number),
                        format!("measurement mode {previous} overridden by {mode}"),
                    );
                }
                measurement = Some((mode, zero_style));
            }
            HeaderLine::Other => {
                let code = line.text.split(',').next().unwrap_or(line.text);
                if !QUIET_HEADER_CODES.contains(&code) {
                    diagnostics.warn(
                        Some(line.number),
                        format!("ignored header line '{}'", line.text),
                    );
                }
            }
        }
    }

    let (mode, zero_style) = measurement
        .ok_or_else(|| DrillError::malformed_header("missing INCH or METRIC declaration"))?;

    Ok(DrillProgram::new(mode, zero_style, registry))
}

fn parse_body(
    lines: &[SourceLine<'_>],
    program: &mut DrillProgram,
    diagnostics: &mut Diagnostics,
) -> DrillResult<()> {
    let mut current: Option<ToolId> = None;

    for line in lines {
        match classify_body(line.text) {
            BodyLine::Comment => {}
            BodyLine::SelectTool => {
                let id = line
                    .text
                    .parse::<ToolId>()
                    .map_err(|_| DrillError::UnknownTool {
                        id: line.text.to_string(),
                    })?;
                if id.is_none() {
                    current = None;
                } else if program.registry().contains(id) {
                    current = Some(id);
                } else {
                    return Err(DrillError::UnknownTool { id: id.to_string() });
                }
            }
            BodyLine::Coordinate => {
                let id = current.ok_or_else(|| DrillError::NoToolSelected {
                    line: line.text.to_string(),
                })?;
                // `current` only ever holds registered tools.
                program.push_command(id, line.text);
            }
            BodyLine::Other => {
                if !QUIET_BODY_CODES.contains(&line.text) {
                    diagnostics.warn(
                        Some(line.number),
                        format!("ignored body line '{}'", line.text),
                    );
                }
            }
        }
    }

    Ok(())
}
