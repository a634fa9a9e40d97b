//! [`DrillProgram`] back to Excellon text.

use super::program::DrillProgram;
use super::tool::ToolId;

/// Render a program in the fixed layout the parser reads back.
///
/// Lines are separated by a single `\n` with no trailing newline.
pub fn to_excellon(program: &DrillProgram) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(program.command_count() + program.registry().len() * 2 + 9);

    lines.push("M48".to_string());
    lines.push(match program.zero_style() {
        Some(zero_style) => format!("{},{}", program.measurement_mode(), zero_style),
        None => program.measurement_mode().to_string(),
    });
    lines.extend(program.tools().map(ToString::to_string));
    lines.push("%".to_string());

    lines.push("G90".to_string());
    lines.push("G05".to_string());
    lines.push(program.measurement_mode().body_code().to_string());

    for (id, commands) in program.toolpaths() {
        lines.push(id.to_string());
        lines.extend(commands.iter().cloned());
    }

    lines.push(ToolId::NONE.to_string());
    lines.push("M30".to_string());

    lines.join("\n")
}
