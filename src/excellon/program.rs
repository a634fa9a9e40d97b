//! The in-memory drill program.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::tool::{Tool, ToolId, ToolRegistry};

/// Unit system declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementMode {
    Inch,
    Metric,
}

impl MeasurementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementMode::Inch => "INCH",
            MeasurementMode::Metric => "METRIC",
        }
    }

    /// Body code selecting the unit system (`M72` inch, `M71` metric).
    pub fn body_code(&self) -> &'static str {
        match self {
            MeasurementMode::Inch => "M72",
            MeasurementMode::Metric => "M71",
        }
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCH" => Ok(MeasurementMode::Inch),
            "METRIC" => Ok(MeasurementMode::Metric),
            _ => Err(()),
        }
    }
}

/// Tool commands keyed by tool, each list in drilling order.
pub type Toolpaths = BTreeMap<ToolId, Vec<String>>;

/// A parsed Excellon drill program.
///
/// Every registered tool owns exactly one (possibly empty) toolpath and
/// every toolpath belongs to a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillProgram {
    measurement_mode: MeasurementMode,
    zero_style: Option<String>,
    registry: ToolRegistry,
    toolpaths: Toolpaths,
}

impl DrillProgram {
    /// Create a program whose tools have no commands yet.
    pub fn new(
        measurement_mode: MeasurementMode,
        zero_style: Option<String>,
        registry: ToolRegistry,
    ) -> Self {
        let toolpaths = registry.ids().map(|id| (id, Vec::new())).collect();
        Self {
            measurement_mode,
            zero_style,
            registry,
            toolpaths,
        }
    }

    /// Reassemble a program from parts that already satisfy the
    /// registry/toolpath invariant.
    pub(crate) fn from_parts(
        measurement_mode: MeasurementMode,
        zero_style: Option<String>,
        registry: ToolRegistry,
        toolpaths: Toolpaths,
    ) -> Self {
        debug_assert!(registry.ids().eq(toolpaths.keys().copied()));
        Self {
            measurement_mode,
            zero_style,
            registry,
            toolpaths,
        }
    }

    pub(crate) fn into_parts(self) -> (MeasurementMode, Option<String>, ToolRegistry, Toolpaths) {
        (
            self.measurement_mode,
            self.zero_style,
            self.registry,
            self.toolpaths,
        )
    }

    /// Append a coordinate command to a registered tool.
    ///
    /// Returns `false` and leaves the program untouched when `id` is not
    /// registered.
    pub(crate) fn push_command(&mut self, id: ToolId, command: &str) -> bool {
        match self.toolpaths.get_mut(&id) {
            Some(commands) => {
                commands.push(command.to_string());
                true
            }
            None => false,
        }
    }

    pub fn measurement_mode(&self) -> MeasurementMode {
        self.measurement_mode
    }

    pub fn zero_style(&self) -> Option<&str> {
        self.zero_style.as_deref()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.registry.iter()
    }

    /// Commands drilled with `id`, empty for unknown tools.
    pub fn toolpath(&self, id: ToolId) -> &[String] {
        self.toolpaths.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn toolpaths(&self) -> &Toolpaths {
        &self.toolpaths
    }

    /// Total number of coordinate commands across all tools.
    pub fn command_count(&self) -> usize {
        self.toolpaths.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(lines: &[&str]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for line in lines {
            registry.insert(Tool::parse_definition(line).unwrap()).unwrap();
        }
        registry
    }

    #[test]
    fn test_new_program_has_empty_toolpath_per_tool() {
        let program = DrillProgram::new(
            MeasurementMode::Metric,
            Some("TZ".to_string()),
            registry(&["T1C0.8", "T2C1.0"]),
        );

        assert_eq!(program.toolpaths().len(), 2);
        assert!(program.toolpath(ToolId::new(1)).is_empty());
        assert_eq!(program.command_count(), 0);
        assert_eq!(program.zero_style(), Some("TZ"));
    }

    #[test]
    fn test_push_command_only_for_registered_tools() {
        let mut program =
            DrillProgram::new(MeasurementMode::Inch, None, registry(&["T1C0.035"]));

        assert!(program.push_command(ToolId::new(1), "X1000Y1000"));
        assert!(!program.push_command(ToolId::new(2), "X2000Y2000"));
        assert_eq!(program.toolpath(ToolId::new(1)), ["X1000Y1000"]);
        assert_eq!(program.command_count(), 1);
    }

    #[test]
    fn test_measurement_mode_codes() {
        assert_eq!("METRIC".parse::<MeasurementMode>(), Ok(MeasurementMode::Metric));
        assert_eq!("INCH".parse::<MeasurementMode>(), Ok(MeasurementMode::Inch));
        assert!("MM".parse::<MeasurementMode>().is_err());
        assert_eq!(MeasurementMode::Metric.body_code(), "M71");
        assert_eq!(MeasurementMode::Inch.body_code(), "M72");
    }
}
