//! Combining drill programs.
//!
//! Merging appends the secondary program's tools after the primary's,
//! carries every toolpath across unchanged and finishes with
//! [`optimize`](super::optimize::optimize), so the result always has one
//! tool per diameter.

use super::diagnostics::Diagnostics;
use super::error::{DrillError, DrillResult};
use super::optimize::optimize;
use super::program::DrillProgram;
use super::tool::ToolId;

/// Merge `secondary` into `primary`.
///
/// Both programs are consumed. Measurement modes must match; the primary's
/// zero style is kept.
///
/// Fails with [`DrillError::InvalidToolDefinition`] when the secondary's
/// tools cannot be numbered after the primary's highest tool number.
pub fn merge(
    primary: DrillProgram,
    secondary: DrillProgram,
    diagnostics: &mut Diagnostics,
) -> DrillResult<DrillProgram> {
    if primary.measurement_mode() != secondary.measurement_mode() {
        return Err(DrillError::IncompatibleMeasurementModes {
            primary: primary.measurement_mode(),
            secondary: secondary.measurement_mode(),
        });
    }

    if primary.zero_style() != secondary.zero_style() {
        diagnostics.warn(
            None,
            format!(
                "zero style {:?} of merged program replaced by {:?}",
                secondary.zero_style().unwrap_or(""),
                primary.zero_style().unwrap_or("")
            ),
        );
    }

    let (mode, zero_style, mut registry, mut toolpaths) = primary.into_parts();
    let (_, _, other_registry, mut other_toolpaths) = secondary.into_parts();

    // Dense registries continue at len + 1; sparse ones continue after their
    // highest identifier so nothing is overwritten.
    let base = u32::try_from(registry.len())
        .unwrap_or(u32::MAX)
        .max(registry.max_id().number());

    for (rank, tool) in other_registry.into_iter().enumerate() {
        let new_id = u32::try_from(rank)
            .ok()
            .and_then(|rank| base.checked_add(rank))
            .and_then(|id| id.checked_add(1))
            .map(ToolId::new)
            .ok_or_else(|| DrillError::InvalidToolDefinition {
                line: tool.to_string(),
                reason: format!("no tool number left after T{base} to renumber it"),
            })?;
        let commands = other_toolpaths.remove(&tool.id()).unwrap_or_default();
        registry.replace(tool.with_id(new_id));
        toolpaths.insert(new_id, commands);
    }

    let tool_count = registry.len();
    let merged = optimize(DrillProgram::from_parts(mode, zero_style, registry, toolpaths));

    if merged.registry().len() < tool_count {
        diagnostics.info(
            None,
            format!(
                "collapsed {} tools into {} distinct diameters",
                tool_count,
                merged.registry().len()
            ),
        );
    }

    Ok(merged)
}

/// Left-fold `programs` with [`merge`] in the order given.
///
/// Returns `None` for an empty input. A single program is still optimized so
/// every output has the same shape.
pub fn merge_all<I>(programs: I, diagnostics: &mut Diagnostics) -> Option<DrillResult<DrillProgram>>
where
    I: IntoIterator<Item = DrillProgram>,
{
    let mut programs = programs.into_iter();
    let first = optimize(programs.next()?);
    Some(programs.try_fold(first, |acc, next| merge(acc, next, diagnostics)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excellon::parser::parse_str;
    use crate::excellon::program::MeasurementMode;

    fn parse(text: &str) -> DrillProgram {
        parse_str(text, &mut Diagnostics::new()).unwrap()
    }

    const PLATED: &str = "M48\nMETRIC,TZ\nT1C0.300\nT2C0.800\n%\nT1\nX1Y1\nX2Y2\nT2\nX3Y3\nT0\nM30";
    const NON_PLATED: &str = "M48\nMETRIC,TZ\nT1C0.300\nT2C3.200\n%\nT1\nX10Y10\nT2\nX20Y20\nX30Y30\nT0\nM30";

    #[test]
    fn test_merge_conserves_commands() {
        let a = parse(PLATED);
        let b = parse(NON_PLATED);
        let expected = a.command_count() + b.command_count();

        let merged = merge(a, b, &mut Diagnostics::new()).unwrap();
        assert_eq!(merged.command_count(), expected);
    }

    #[test]
    fn test_merge_dedups_shared_diameter() {
        let mut diagnostics = Diagnostics::new();
        let merged = merge(parse(PLATED), parse(NON_PLATED), &mut diagnostics).unwrap();

        let diameters: Vec<&str> = merged.tools().map(|t| t.diameter()).collect();
        assert_eq!(diameters, ["0.300", "0.800", "3.200"]);

        // Primary's 0.3 commands come first, then the secondary's.
        assert_eq!(merged.toolpath(ToolId::new(1)), ["X1Y1", "X2Y2", "X10Y10"]);
        assert_eq!(merged.toolpath(ToolId::new(2)), ["X3Y3"]);
        assert_eq!(merged.toolpath(ToolId::new(3)), ["X20Y20", "X30Y30"]);
        assert_eq!(diagnostics.entries().len(), 1);
    }

    #[test]
    fn test_merge_rejects_mixed_units() {
        let inch = parse("M48\nINCH,LZ\nT1C0.035\n%\nT1\nX1Y1\nM30");
        let err = merge(parse(PLATED), inch, &mut Diagnostics::new()).unwrap_err();

        match err {
            DrillError::IncompatibleMeasurementModes { primary, secondary } => {
                assert_eq!(primary, MeasurementMode::Metric);
                assert_eq!(secondary, MeasurementMode::Inch);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_with_sparse_primary_loses_nothing() {
        // Primary uses T1 and T5; a naive len+1 numbering would put the
        // secondary's third tool on T5.
        let a = parse("M48\nMETRIC,TZ\nT1C0.3\nT5C0.5\n%\nT1\nX1\nT5\nX5\nM30");
        let b = parse("M48\nMETRIC,TZ\nT1C0.6\nT2C0.7\nT3C0.9\n%\nT1\nY1\nT2\nY2\nT3\nY3\nM30");

        let merged = merge(a, b, &mut Diagnostics::new()).unwrap();
        assert_eq!(merged.registry().len(), 5);
        assert_eq!(merged.command_count(), 5);
        assert_eq!(merged.toolpath(ToolId::new(2)), ["X5"]);
        assert_eq!(merged.toolpath(ToolId::new(5)), ["Y3"]);
    }

    #[test]
    fn test_merge_after_highest_tool_number_is_an_error() {
        let a = parse("M48\nMETRIC,TZ\nT4294967295C0.3\n%\nT4294967295\nX1Y1\nM30");
        let b = parse("M48\nMETRIC,TZ\nT1C0.5\n%\nT1\nX2Y2\nM30");

        let err = merge(a, b, &mut Diagnostics::new()).unwrap_err();
        assert_eq!(err.kind(), "InvalidToolDefinition");
    }

    #[test]
    fn test_merge_with_highest_tool_number_and_no_new_tools() {
        let a = parse("M48\nMETRIC,TZ\nT4294967295C0.3\n%\nT4294967295\nX1Y1\nM30");
        let b = parse("M48\nMETRIC,TZ\n%\nM30");

        let merged = merge(a, b, &mut Diagnostics::new()).unwrap();
        assert_eq!(merged.registry().len(), 1);
        assert_eq!(merged.toolpath(ToolId::new(1)), ["X1Y1"]);
    }

    #[test]
    fn test_zero_style_mismatch_keeps_primary() {
        let a = parse("M48\nMETRIC,TZ\nT1C0.3\n%\nM30");
        let b = parse("M48\nMETRIC,LZ\nT1C0.4\n%\nM30");
        let mut diagnostics = Diagnostics::new();

        let merged = merge(a, b, &mut diagnostics).unwrap();
        assert_eq!(merged.zero_style(), Some("TZ"));
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn test_merge_all_folds_left() {
        let third = parse("M48\nMETRIC,TZ\nT4C0.800\n%\nT4\nX99Y99\nM30");
        let programs = vec![parse(PLATED), parse(NON_PLATED), third];

        let merged = merge_all(programs, &mut Diagnostics::new())
            .unwrap()
            .unwrap();
        assert_eq!(merged.command_count(), 7);
        assert_eq!(merged.toolpath(ToolId::new(2)), ["X3Y3", "X99Y99"]);
    }

    #[test]
    fn test_merge_all_single_and_empty() {
        assert!(merge_all(Vec::new(), &mut Diagnostics::new()).is_none());

        let single = merge_all(vec![parse(NON_PLATED)], &mut Diagnostics::new())
            .unwrap()
            .unwrap();
        assert_eq!(single.registry().len(), 2);
        assert_eq!(single.command_count(), 3);
    }

    #[test]
    fn test_merge_all_stops_at_first_error() {
        let inch = parse("M48\nINCH,LZ\nT1C0.035\n%\nM30");
        let result = merge_all(
            vec![parse(PLATED), inch, parse(NON_PLATED)],
            &mut Diagnostics::new(),
        )
        .unwrap();
        assert!(matches!(
            result,
            Err(DrillError::IncompatibleMeasurementModes { .. })
        ));
    }
}
