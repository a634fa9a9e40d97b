//! Pattern matching for KiCad plot output file names
//!
//! This module maps KiCad Gerber layer suffixes to their Protel extensions
//! and recognises the drill files that are merged per board.

use regex::Regex;
use tracing::{debug, warn};

/// Represents a Gerber layer in PCB files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    // Top layers
    TopSilkscreen,
    TopSoldermask,
    TopPasteMask,
    TopCopper,

    // Bottom layers
    BottomSilkscreen,
    BottomSoldermask,
    BottomPasteMask,
    BottomCopper,

    // Special layers
    BoardOutline,
    InnerLayer(u32), // Layer number
}

impl LayerType {
    /// Get the Protel extension for this layer type
    pub fn protel_extension(&self) -> String {
        match self {
            LayerType::TopSilkscreen => ".GTO".to_string(),
            LayerType::TopSoldermask => ".GTS".to_string(),
            LayerType::TopPasteMask => ".GTP".to_string(),
            LayerType::TopCopper => ".GTL".to_string(),

            LayerType::BottomSilkscreen => ".GBO".to_string(),
            LayerType::BottomSoldermask => ".GBS".to_string(),
            LayerType::BottomPasteMask => ".GBP".to_string(),
            LayerType::BottomCopper => ".GBL".to_string(),

            LayerType::BoardOutline => ".GML".to_string(),
            LayerType::InnerLayer(num) => format!(".G{}", num),
        }
    }
}

/// Plating of a drill file, in merge order: plated files are the primary
/// program of their group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrillKind {
    Plated,
    NonPlated,
}

/// What a recognised input file is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Layer(LayerType),
    Drill(DrillKind),
}

/// A file name matched against the KiCad patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// File name without the KiCad layer or drill suffix
    pub base_name: String,
    pub kind: FileKind,
}

impl MatchedFile {
    /// Output file name: Protel extension for layers, `<base>.txt` for the
    /// merged drill file of a group.
    pub fn target_filename(&self) -> String {
        match &self.kind {
            FileKind::Layer(layer) => format!("{}{}", self.base_name, layer.protel_extension()),
            FileKind::Drill(_) => format!("{}.txt", self.base_name),
        }
    }
}

#[derive(Debug, Clone)]
enum PatternTarget {
    Layer(LayerType),
    InnerLayer,
    Drill(DrillKind),
}

/// Compiled suffix patterns for one EDA naming convention
#[derive(Debug, Clone)]
pub struct EdaPatterns {
    pub name: String,
    patterns: Vec<(PatternTarget, Regex)>,
}

impl EdaPatterns {
    /// Create an empty pattern set
    pub fn new(name: String) -> Self {
        Self {
            name,
            patterns: Vec::new(),
        }
    }

    /// Add a pattern; it must capture the base name as `base`. Patterns are
    /// tried in insertion order.
    fn add_pattern(&mut self, target: PatternTarget, pattern: &str) {
        match Regex::new(pattern) {
            Ok(regex) => self.patterns.push((target, regex)),
            Err(e) => warn!("Invalid regex pattern {}: {}", pattern, e),
        }
    }

    fn add_layer(&mut self, layer: LayerType, suffixes: &[&str]) {
        for suffix in suffixes {
            let pattern = format!(r"^(?P<base>.+){}$", regex::escape(suffix));
            self.add_pattern(PatternTarget::Layer(layer), &pattern);
        }
    }

    /// Match a filename against all patterns
    pub fn match_filename(&self, filename: &str) -> Option<MatchedFile> {
        for (target, regex) in &self.patterns {
            let Some(caps) = regex.captures(filename) else {
                continue;
            };
            let base_name = caps.name("base")?.as_str().to_string();

            let kind = match target {
                PatternTarget::Layer(layer) => FileKind::Layer(*layer),
                PatternTarget::InnerLayer => {
                    let num = caps.name("layer")?.as_str().parse::<u32>().ok()?;
                    FileKind::Layer(LayerType::InnerLayer(num))
                }
                PatternTarget::Drill(kind) => FileKind::Drill(*kind),
            };

            debug!("Matched '{}' to {:?} using pattern '{}'", filename, kind, regex);
            return Some(MatchedFile { base_name, kind });
        }

        debug!("No pattern matched for filename: {}", filename);
        None
    }
}

/// Pattern factory
pub struct PatternMatcher;

impl PatternMatcher {
    /// Create patterns for KiCad plot output
    pub fn create_kicad_patterns() -> EdaPatterns {
        let mut patterns = EdaPatterns::new("KiCad".to_string());

        // Drill files - Order matters! NPTH before PTH before the plain .drl
        patterns.add_pattern(
            PatternTarget::Drill(DrillKind::NonPlated),
            r"(?i)^(?P<base>.+?)-NPTH\.drl$",
        );
        patterns.add_pattern(
            PatternTarget::Drill(DrillKind::Plated),
            r"(?i)^(?P<base>.+?)-PTH\.drl$",
        );
        patterns.add_pattern(
            PatternTarget::Drill(DrillKind::Plated),
            r"(?i)^(?P<base>.+)\.drl$",
        );

        // Silkscreen layers (KiCad 5 and KiCad 6+ names)
        patterns.add_layer(
            LayerType::TopSilkscreen,
            &["-F_SilkS.gbr", "-F_SilkS.gto", "-F_Silkscreen.gbr", "-F_Silkscreen.gto"],
        );
        patterns.add_layer(
            LayerType::BottomSilkscreen,
            &["-B_SilkS.gbr", "-B_SilkS.gbo", "-B_Silkscreen.gbr", "-B_Silkscreen.gbo"],
        );

        // Mask layers
        patterns.add_layer(LayerType::TopSoldermask, &["-F_Mask.gbr", "-F_Mask.gts"]);
        patterns.add_layer(LayerType::BottomSoldermask, &["-B_Mask.gbr", "-B_Mask.gbs"]);
        patterns.add_layer(LayerType::TopPasteMask, &["-F_Paste.gbr", "-F_Paste.gtp"]);
        patterns.add_layer(LayerType::BottomPasteMask, &["-B_Paste.gbr", "-B_Paste.gbp"]);

        // Copper layers
        patterns.add_layer(LayerType::TopCopper, &["-F_Cu.gbr", "-F_Cu.gtl"]);
        patterns.add_layer(LayerType::BottomCopper, &["-B_Cu.gbr", "-B_Cu.gbl"]);
        patterns.add_pattern(
            PatternTarget::InnerLayer,
            r"^(?P<base>.+)-In(?P<layer>\d+)_Cu\.(?:gbr|g\d+)$",
        );

        // Board outline
        patterns.add_layer(
            LayerType::BoardOutline,
            &["-Edge_Cuts.gbr", "-Edge_Cuts.gml", "-Edge_Cuts.gm1"],
        );

        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(filename: &str) -> Option<(String, LayerType)> {
        match PatternMatcher::create_kicad_patterns().match_filename(filename)? {
            MatchedFile {
                base_name,
                kind: FileKind::Layer(layer),
            } => Some((base_name, layer)),
            _ => None,
        }
    }

    #[test]
    fn test_kicad_layer_matching() {
        assert_eq!(
            layer("project-F_Cu.gbr"),
            Some(("project".to_string(), LayerType::TopCopper))
        );
        assert_eq!(
            layer("project-B_SilkS.gbo"),
            Some(("project".to_string(), LayerType::BottomSilkscreen))
        );
        assert_eq!(
            layer("my-board-Edge_Cuts.gbr"),
            Some(("my-board".to_string(), LayerType::BoardOutline))
        );
        assert_eq!(layer("project-F_Cu.GBR"), None);
        assert_eq!(layer("project.gbr"), None);
    }

    #[test]
    fn test_inner_layer_number_extraction() {
        assert_eq!(
            layer("project-In1_Cu.gbr"),
            Some(("project".to_string(), LayerType::InnerLayer(1)))
        );
        assert_eq!(
            layer("project-In2_Cu.g3"),
            Some(("project".to_string(), LayerType::InnerLayer(2)))
        );
    }

    #[test]
    fn test_drill_matching() {
        let patterns = PatternMatcher::create_kicad_patterns();

        let npth = patterns.match_filename("board-NPTH.drl").unwrap();
        assert_eq!(npth.base_name, "board");
        assert_eq!(npth.kind, FileKind::Drill(DrillKind::NonPlated));

        let pth = patterns.match_filename("board-PTH.DRL").unwrap();
        assert_eq!(pth.base_name, "board");
        assert_eq!(pth.kind, FileKind::Drill(DrillKind::Plated));

        let plain = patterns.match_filename("board.drl").unwrap();
        assert_eq!(plain.base_name, "board");
        assert_eq!(plain.kind, FileKind::Drill(DrillKind::Plated));
    }

    #[test]
    fn test_target_filenames() {
        let patterns = PatternMatcher::create_kicad_patterns();
        let cases = [
            ("project-F_SilkS.gbr", "project.GTO"),
            ("project-F_Mask.gbr", "project.GTS"),
            ("project-F_Cu.gbr", "project.GTL"),
            ("project-B_Cu.gbr", "project.GBL"),
            ("project-B_Mask.gbr", "project.GBS"),
            ("project-B_SilkS.gbr", "project.GBO"),
            ("project-Edge_Cuts.gbr", "project.GML"),
            ("project-In1_Cu.gbr", "project.G1"),
            ("project-In2_Cu.g3", "project.G2"),
            ("project-F_Paste.gbr", "project.GTP"),
            ("project-NPTH.drl", "project.txt"),
        ];

        for (input, expected) in cases {
            let matched = patterns
                .match_filename(input)
                .unwrap_or_else(|| panic!("{input} should match"));
            assert_eq!(matched.target_filename(), expected, "for {input}");
        }
    }

    #[test]
    fn test_unrelated_files_do_not_match() {
        let patterns = PatternMatcher::create_kicad_patterns();
        assert!(patterns.match_filename("project.kicad_pcb").is_none());
        assert!(patterns.match_filename("README.md").is_none());
        assert!(patterns.match_filename("project-job.gbrjob").is_none());
    }

    #[test]
    fn test_protel_extensions() {
        assert_eq!(LayerType::TopCopper.protel_extension(), ".GTL");
        assert_eq!(LayerType::BoardOutline.protel_extension(), ".GML");
        assert_eq!(LayerType::InnerLayer(42).protel_extension(), ".G42");
    }
}
