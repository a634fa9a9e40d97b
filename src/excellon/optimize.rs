//! Tool deduplication.
//!
//! Tools that share a diameter are collapsed into one and the survivors are
//! renumbered `T1..Tn` by ascending diameter. Toolpaths follow their tools;
//! when several old tools collapse, their command lists are concatenated in
//! ascending old identifier order.

use std::collections::BTreeMap;

use super::program::{DrillProgram, Toolpaths};
use super::tool::{Tool, ToolId, ToolRegistry};

/// Old identifier to new identifier, covering every tool of the source
/// registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRemap {
    map: BTreeMap<ToolId, ToolId>,
}

impl ToolRemap {
    pub fn get(&self, old: ToolId) -> Option<ToolId> {
        self.map.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// `(old, new)` pairs in ascending old identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (ToolId, ToolId)> + '_ {
        self.map.iter().map(|(old, new)| (*old, *new))
    }

    /// Old identifiers that were folded into `new`, ascending.
    pub fn sources(&self, new: ToolId) -> Vec<ToolId> {
        self.iter()
            .filter(|(_, target)| *target == new)
            .map(|(old, _)| old)
            .collect()
    }

    /// Re-key toolpaths, concatenating the lists of collapsed tools in
    /// ascending old identifier order.
    pub fn apply(&self, toolpaths: Toolpaths) -> Toolpaths {
        let mut remapped: Toolpaths = self.map.values().map(|new| (*new, Vec::new())).collect();

        for (old, commands) in toolpaths {
            match self.get(old) {
                Some(new) => remapped.entry(new).or_default().extend(commands),
                None => debug_assert!(false, "toolpath {old} has no registered tool"),
            }
        }

        remapped
    }
}

/// A deduplicated registry together with the remap that produced it.
#[derive(Debug, Clone)]
pub struct Optimized {
    pub registry: ToolRegistry,
    pub remap: ToolRemap,
}

/// Collapse tools with identical diameters into one tool per diameter.
pub fn optimize_registry(registry: &ToolRegistry) -> Optimized {
    let mut tools: Vec<&Tool> = registry.iter().collect();
    tools.sort_by(|a, b| {
        a.diameter_value()
            .total_cmp(&b.diameter_value())
            .then(a.id().cmp(&b.id()))
    });

    let mut optimized = ToolRegistry::new();
    let mut remap = ToolRemap::default();
    let mut next_number = 0;
    let mut representative: Option<&Tool> = None;

    for tool in tools {
        // Sorted by diameter, so equal diameters are adjacent and the
        // lowest old identifier of each run comes first.
        if representative.map_or(true, |rep| rep != tool) {
            next_number += 1;
            representative = Some(tool);
            optimized.replace(tool.with_id(ToolId::new(next_number)));
        }
        remap.map.insert(tool.id(), ToolId::new(next_number));
    }

    Optimized {
        registry: optimized,
        remap,
    }
}

/// Deduplicate a program's tools and move its toolpaths accordingly.
pub fn optimize(program: DrillProgram) -> DrillProgram {
    let (mode, zero_style, registry, toolpaths) = program.into_parts();
    let Optimized { registry, remap } = optimize_registry(&registry);
    let toolpaths = remap.apply(toolpaths);
    DrillProgram::from_parts(mode, zero_style, registry, toolpaths)
}
