//! Terminal progress for the conversion stages

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

/// The stages of a conversion that report progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Unpacking a ZIP input or checking the input directory
    AnalyzeInput,
    /// Copying Gerber layers under their Protel names
    RenameLayers,
    /// Merging each board's drill files into one program
    MergeDrills,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Stage::AnalyzeInput => "Analyzing input",
            Stage::RenameLayers => "Renaming Gerber layers",
            Stage::MergeDrills => "Merging drill groups",
        }
    }

    fn done_message(self) -> &'static str {
        match self {
            Stage::AnalyzeInput => "Input analysis completed",
            Stage::RenameLayers => "Gerber renaming completed",
            Stage::MergeDrills => "Drill merging completed",
        }
    }
}

/// Shows one bar or spinner per stage, or nothing when disabled.
pub struct ProgressTracker {
    enabled: bool,
}

impl ProgressTracker {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Bar over `total` items of a stage. `None` when disabled or empty.
    pub fn stage_bar(&self, stage: Stage, total: usize) -> Option<ProgressBar> {
        if !self.enabled || total == 0 {
            return None;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        pb.set_message(format!("{}...", stage.label()));
        pb.enable_steady_tick(Duration::from_millis(100));

        debug!("Started stage: {}", stage.label());
        Some(pb)
    }

    /// Spinner for a stage with no known item count
    pub fn stage_spinner(&self, stage: Stage) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("{}...", stage.label()));
        pb.enable_steady_tick(Duration::from_millis(80));

        Some(pb)
    }

    /// Count one finished item, showing its name (a file or board base name).
    pub fn advance(pb: &Option<ProgressBar>, item: Option<&str>) {
        if let Some(progress) = pb {
            progress.inc(1);
            if let Some(item) = item {
                progress.set_message(item.to_string());
            }
        }
    }

    pub fn finish(pb: Option<ProgressBar>, stage: Stage) {
        if let Some(progress) = pb {
            progress.finish_with_message(stage.done_message());
            debug!("Finished stage: {}", stage.label());
        }
    }

    /// Leave the bar on screen with the number of failed drill groups.
    pub fn finish_with_failures(pb: Option<ProgressBar>, failed_groups: usize) {
        if let Some(progress) = pb {
            progress.abandon_with_message(format!("❌ {} drill group(s) failed", failed_groups));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_tracker_shows_nothing() {
        let tracker = ProgressTracker::new(false);
        assert!(tracker.stage_bar(Stage::MergeDrills, 10).is_none());
        assert!(tracker.stage_spinner(Stage::AnalyzeInput).is_none());
    }

    #[test]
    fn test_stage_bar_counts_groups() {
        let tracker = ProgressTracker::new(true);
        let pb = tracker.stage_bar(Stage::MergeDrills, 3);

        ProgressTracker::advance(&pb, Some("board"));
        ProgressTracker::advance(&pb, None);
        assert_eq!(pb.as_ref().map(|p| p.position()), Some(2));
        assert_eq!(pb.as_ref().map(|p| p.message()), Some("board".to_string()));
        ProgressTracker::finish(pb, Stage::MergeDrills);
    }

    #[test]
    fn test_failed_groups_are_shown() {
        let tracker = ProgressTracker::new(true);
        let pb = tracker.stage_bar(Stage::MergeDrills, 2);
        let handle = pb.clone();

        ProgressTracker::finish_with_failures(pb, 1);
        let handle = handle.unwrap();
        assert!(handle.is_finished());
        assert_eq!(handle.message(), "❌ 1 drill group(s) failed");
    }

    #[test]
    fn test_empty_stage_has_no_bar() {
        let tracker = ProgressTracker::new(true);
        assert!(tracker.stage_bar(Stage::RenameLayers, 0).is_none());
    }
}
