//! Tool identifiers, tool definitions and the per-program tool registry.

use std::cmp::Ordering;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::str::FromStr;

use super::error::{DrillError, DrillResult};

/// A tool identifier such as `T7`.
///
/// Identifiers compare by their numeric value, so `T2` sorts before `T10`
/// and `T07` is the same tool as `T7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolId(u32);

impl ToolId {
    /// The `T0` sentinel that ends a program. Never a registry key.
    pub const NONE: ToolId = ToolId(0);

    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Text that is not a `T<digits>` tool identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a tool identifier")]
pub struct ParseToolIdError(String);

impl FromStr for ToolId {
    type Err = ParseToolIdError;

    /// Parses exactly `T<digits>`; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseToolIdError(s.to_string());
        let digits = s.strip_prefix('T').ok_or_else(err)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        digits.parse::<u32>().map(ToolId).map_err(|_| err())
    }
}

/// One drilling tool: identifier plus diameter.
///
/// The diameter is kept as the text it was read from so that it is written
/// back byte for byte. Comparisons use the numeric value.
#[derive(Debug, Clone)]
pub struct Tool {
    id: ToolId,
    diameter: String,
    value: f64,
}

impl Tool {
    pub fn new(id: ToolId, diameter: impl Into<String>) -> DrillResult<Self> {
        let diameter = diameter.into();
        let value = diameter
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| DrillError::InvalidToolDefinition {
                line: format!("{id}C{diameter}"),
                reason: format!("diameter '{diameter}' is not a positive number"),
            })?;

        Ok(Self {
            id,
            diameter,
            value,
        })
    }

    /// Parse a header definition such as `T1C0.800`.
    ///
    /// Feed and speed parameters (`T1F200S65C0.8`, `T1C0.8F200`) are accepted
    /// but not kept.
    pub fn parse_definition(line: &str) -> DrillResult<Self> {
        let invalid = |reason: &str| DrillError::InvalidToolDefinition {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let rest = line
            .strip_prefix('T')
            .ok_or_else(|| invalid("missing T prefix"))?;
        let id_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if id_len == 0 {
            return Err(invalid("missing tool number"));
        }
        let number = rest[..id_len]
            .parse::<u32>()
            .map_err(|_| invalid("tool number out of range"))?;
        if number == 0 {
            return Err(invalid("T0 cannot be defined"));
        }

        let params = &rest[id_len..];
        let c_pos = params
            .find('C')
            .ok_or_else(|| invalid("missing C<diameter>"))?;
        let after_c = &params[c_pos + 1..];
        let diameter_len = after_c
            .bytes()
            .take_while(|b| b.is_ascii_digit() || *b == b'.')
            .count();
        if diameter_len == 0 {
            return Err(invalid("empty diameter"));
        }

        Tool::new(ToolId(number), &after_c[..diameter_len]).map_err(|_| invalid("bad diameter"))
    }

    pub fn id(&self) -> ToolId {
        self.id
    }

    /// The diameter exactly as it appeared in the source file.
    pub fn diameter(&self) -> &str {
        &self.diameter
    }

    pub fn diameter_value(&self) -> f64 {
        self.value
    }

    /// Same definition under another identifier.
    pub fn with_id(&self, id: ToolId) -> Self {
        Self {
            id,
            diameter: self.diameter.clone(),
            value: self.value,
        }
    }
}

impl PartialEq for Tool {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Tool {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C{}", self.id, self.diameter)
    }
}

/// Tools of one drill program, enumerated in ascending numeric id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolId, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Returns `Ok(false)` when the same identifier is already registered
    /// with an equal diameter, and `DuplicateToolId` when the diameters
    /// differ.
    pub fn insert(&mut self, tool: Tool) -> DrillResult<bool> {
        match self.tools.entry(tool.id) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(tool);
                Ok(true)
            }
            btree_map::Entry::Occupied(slot) if *slot.get() == tool => Ok(false),
            btree_map::Entry::Occupied(slot) => Err(DrillError::DuplicateToolId {
                id: tool.id,
                existing: slot.get().diameter.clone(),
                redefined: tool.diameter,
            }),
        }
    }

    /// Store `tool` under its identifier, replacing any previous entry.
    pub(crate) fn replace(&mut self, tool: Tool) -> Option<Tool> {
        self.tools.insert(tool.id, tool)
    }

    pub fn get(&self, id: ToolId) -> Option<&Tool> {
        self.tools.get(&id)
    }

    pub fn contains(&self, id: ToolId) -> bool {
        self.tools.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Highest identifier in use, `T0` when empty.
    pub fn max_id(&self) -> ToolId {
        self.tools.keys().next_back().copied().unwrap_or(ToolId::NONE)
    }

    pub fn ids(&self) -> impl Iterator<Item = ToolId> + '_ {
        self.tools.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }
}

impl IntoIterator for ToolRegistry {
    type Item = Tool;
    type IntoIter = btree_map::IntoValues<ToolId, Tool>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_id_numeric_order() {
        let t2: ToolId = "T2".parse().unwrap();
        let t10: ToolId = "T10".parse().unwrap();
        assert!(t2 < t10);
        assert_eq!("T07".parse::<ToolId>().unwrap(), ToolId::new(7));
        assert_eq!(ToolId::new(7).to_string(), "T7");
    }

    #[test]
    fn test_tool_id_rejects_garbage() {
        assert!("T".parse::<ToolId>().is_err());
        assert!("7".parse::<ToolId>().is_err());
        assert!("T1C0.8".parse::<ToolId>().is_err());
        assert!("TX".parse::<ToolId>().is_err());
        assert!("T0".parse::<ToolId>().unwrap().is_none());
    }

    #[test]
    fn test_parse_definition() {
        let tool = Tool::parse_definition("T3C0.800").unwrap();
        assert_eq!(tool.id(), ToolId::new(3));
        assert_eq!(tool.diameter(), "0.800");
        assert_eq!(tool.to_string(), "T3C0.800");

        let with_feed = Tool::parse_definition("T12F200S65C0.0300").unwrap();
        assert_eq!(with_feed.id(), ToolId::new(12));
        assert_eq!(with_feed.diameter(), "0.0300");
    }

    #[test]
    fn test_parse_definition_errors() {
        for line in ["T1", "TC0.8", "T1C", "T0C0.8", "T1C..", "T1CX", "T1C0", "T1C0.000"] {
            assert!(
                matches!(
                    Tool::parse_definition(line),
                    Err(DrillError::InvalidToolDefinition { .. })
                ),
                "expected {line} to be rejected"
            );
        }
    }

    #[test]
    fn test_tool_equality_is_by_diameter() {
        let a = Tool::parse_definition("T1C0.30").unwrap();
        let b = Tool::parse_definition("T9C0.3").unwrap();
        let c = Tool::parse_definition("T2C0.5").unwrap();
        assert_eq!(a, b);
        assert!(a < c);
    }

    #[test]
    fn test_registry_duplicate_handling() {
        let mut registry = ToolRegistry::new();
        assert!(registry.insert(Tool::parse_definition("T1C0.8").unwrap()).unwrap());
        assert!(!registry.insert(Tool::parse_definition("T1C0.80").unwrap()).unwrap());

        let err = registry
            .insert(Tool::parse_definition("T1C1.0").unwrap())
            .unwrap_err();
        assert!(matches!(err, DrillError::DuplicateToolId { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(ToolId::new(1)).unwrap().diameter(), "0.8");
    }

    #[test]
    fn test_registry_orders_numerically() {
        let mut registry = ToolRegistry::new();
        for line in ["T10C1.0", "T2C0.5", "T1C0.3"] {
            registry.insert(Tool::parse_definition(line).unwrap()).unwrap();
        }
        let ids: Vec<String> = registry.ids().map(|id| id.to_string()).collect();
        assert_eq!(ids, ["T1", "T2", "T10"]);
        assert_eq!(registry.max_id(), ToolId::new(10));
    }
}
