//! Core conversion engine for TransProtel
//!
//! This module orchestrates one conversion run: input discovery, Gerber
//! renaming, per-board drill merging and the final output. Drill groups are
//! independent; a group that fails is reported and skipped while the others
//! are still written.

use crate::{
    archive::{ArchiveCreator, ArchiveExtractor},
    config::Config,
    error::{Result, ResultExt, TransProtelError},
    excellon::{self, Diagnostic, Diagnostics, DrillError, DrillProgram, Severity},
    patterns::{DrillKind, EdaPatterns, FileKind, MatchedFile, PatternMatcher},
    progress::{ProgressTracker, Stage},
};
use anyhow::Context;
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, error, info, warn};

/// A Gerber layer copied under its Protel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedFile {
    pub source: String,
    pub target: String,
}

/// A drill group that was merged and written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillGroupSummary {
    pub base_name: String,
    /// Input files in merge order
    pub sources: Vec<String>,
    pub output: String,
    pub tool_count: usize,
    pub command_count: usize,
}

/// A drill group that produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedGroup {
    pub base_name: String,
    /// Error kind, e.g. `MalformedBody` or `Io`
    pub kind: String,
    pub message: String,
}

/// Everything one run produced
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub renamed: Vec<RenamedFile>,
    pub drill_groups: Vec<DrillGroupSummary>,
    pub failed_groups: Vec<FailedGroup>,
    pub archive: Option<PathBuf>,
}

impl ConversionReport {
    pub fn has_failures(&self) -> bool {
        !self.failed_groups.is_empty()
    }

    pub fn total_files_written(&self) -> usize {
        self.renamed.len() + self.drill_groups.len()
    }
}

/// One input drill file waiting to be merged
#[derive(Debug, Clone)]
struct DrillSource {
    kind: DrillKind,
    path: PathBuf,
}

impl DrillSource {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The main conversion engine
pub struct Converter {
    config: Config,
    progress_tracker: ProgressTracker,
    archive_extractor: ArchiveExtractor,
    patterns: EdaPatterns,
    staging_dir: Option<TempDir>,
    written_files: Vec<PathBuf>,
    report: ConversionReport,
}

impl Converter {
    /// Create a new converter with the given configuration
    pub fn new(config: Config) -> Self {
        let progress_enabled = !config.no_progress;

        Self {
            config,
            progress_tracker: ProgressTracker::new(progress_enabled),
            archive_extractor: ArchiveExtractor::new(),
            patterns: PatternMatcher::create_kicad_patterns(),
            staging_dir: None,
            written_files: Vec::new(),
            report: ConversionReport::default(),
        }
    }

    /// Run the complete conversion process
    ///
    /// Drill group failures do not make this return an error; they are
    /// collected in the report. Errors here are I/O or setup failures that
    /// stop the whole run.
    pub fn run(&mut self) -> Result<()> {
        let start = std::time::Instant::now();
        info!("Starting conversion process...");

        self.config
            .validate()
            .context("Configuration validation failed")?;

        if self.config.zip {
            self.staging_dir =
                Some(TempDir::new().context("Failed to create staging directory")?);
        }

        let working_path = self
            .extract_input_files()
            .context("Failed to extract input files")?;

        let files = self
            .discover_files(&working_path)
            .context("Failed to discover input files")?;

        let drill_groups = self
            .rename_layers(&files)
            .context("Failed to rename Gerber files")?;

        self.process_drill_groups(drill_groups)
            .context("Failed to process drill files")?;

        self.create_output().context("Failed to create output")?;

        info!("Conversion completed in {} ms", start.elapsed().as_millis());
        Ok(())
    }

    /// Extract input files from archive if necessary
    fn extract_input_files(&mut self) -> Result<PathBuf> {
        let progress = self.progress_tracker.stage_spinner(Stage::AnalyzeInput);

        let working_path = self
            .archive_extractor
            .extract_if_needed(&self.config.path, !self.config.no_progress)
            .with_path_context("analyze input", &self.config.path)?;

        ProgressTracker::finish(progress, Stage::AnalyzeInput);
        Ok(working_path)
    }

    /// Discover all regular files in the working directory, sorted by name
    fn discover_files(&self, working_path: &Path) -> Result<Vec<PathBuf>> {
        info!("Processing files in {}", working_path.display());

        let mut files = fs::read_dir(working_path)
            .with_path_context("read directory", working_path)?
            .filter_map(|entry| {
                entry.ok().and_then(|e| {
                    let path = e.path();
                    if path.is_file() {
                        Some(path)
                    } else {
                        None
                    }
                })
            })
            .collect::<Vec<_>>();
        files.sort();

        info!("Discovered {} files", files.len());
        debug!("Files found: {:?}", files);

        if files.is_empty() {
            return Err(TransProtelError::NoInputFiles {
                path: working_path.display().to_string(),
            }
            .into());
        }

        Ok(files)
    }

    /// Copy every recognised Gerber layer under its Protel name and collect
    /// drill files by base name
    fn rename_layers(&mut self, files: &[PathBuf]) -> Result<BTreeMap<String, Vec<DrillSource>>> {
        let mut drill_groups: BTreeMap<String, Vec<DrillSource>> = BTreeMap::new();
        let progress = self
            .progress_tracker
            .stage_bar(Stage::RenameLayers, files.len());

        for file in files {
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .context("Invalid filename")?;

            match self.patterns.match_filename(filename) {
                Some(MatchedFile {
                    base_name,
                    kind: FileKind::Drill(kind),
                }) => {
                    info!("Queued drill file {} for group '{}'", filename, base_name);
                    drill_groups.entry(base_name).or_default().push(DrillSource {
                        kind,
                        path: file.clone(),
                    });
                }
                Some(matched) => {
                    let target = matched.target_filename();
                    let output_path = self.get_output_file_path(&target);

                    fs::copy(file, &output_path).with_path_context("copy Gerber", &output_path)?;
                    info!("{} converted to: {}", filename, target);

                    self.written_files.push(output_path);
                    self.report.renamed.push(RenamedFile {
                        source: filename.to_string(),
                        target,
                    });
                }
                None => debug!("Skipping unrecognised file: {}", filename),
            }

            ProgressTracker::advance(&progress, Some(filename));
        }

        ProgressTracker::finish(progress, Stage::RenameLayers);
        Ok(drill_groups)
    }

    /// Merge and write every drill group, isolating failures per group
    fn process_drill_groups(&mut self, groups: BTreeMap<String, Vec<DrillSource>>) -> Result<()> {
        let progress = self
            .progress_tracker
            .stage_bar(Stage::MergeDrills, groups.len());

        for (base_name, mut sources) in groups {
            // Plated program first so it keeps the low tool numbers.
            sources.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.path.cmp(&b.path)));

            match self.process_drill_group(&base_name, &sources) {
                Ok(summary) => {
                    info!(
                        "Wrote {} ({} tools, {} holes) from {} file(s)",
                        summary.output,
                        summary.tool_count,
                        summary.command_count,
                        summary.sources.len()
                    );
                    self.report.drill_groups.push(summary);
                }
                Err(e) => {
                    error!("Drill group '{}' failed: {:#}", base_name, e);
                    self.report.failed_groups.push(FailedGroup {
                        base_name: base_name.clone(),
                        kind: error_kind(&e).to_string(),
                        message: format!("{:#}", e),
                    });
                }
            }

            ProgressTracker::advance(&progress, Some(&base_name));
        }

        if self.report.has_failures() {
            ProgressTracker::finish_with_failures(progress, self.report.failed_groups.len());
        } else {
            ProgressTracker::finish(progress, Stage::MergeDrills);
        }

        Ok(())
    }

    /// Parse, merge and write one drill group. Nothing is written unless
    /// every step succeeds.
    fn process_drill_group(
        &mut self,
        base_name: &str,
        sources: &[DrillSource],
    ) -> Result<DrillGroupSummary> {
        let merged = merge_drill_group(base_name, sources)?;

        let output = format!("{}.txt", base_name);
        let output_path = self.get_output_file_path(&output);
        write_output_atomically(&output_path, &excellon::to_excellon(&merged))
            .with_group_context(base_name)?;
        self.written_files.push(output_path);

        Ok(DrillGroupSummary {
            base_name: base_name.to_string(),
            sources: sources.iter().map(DrillSource::file_name).collect(),
            output,
            tool_count: merged.registry().len(),
            command_count: merged.command_count(),
        })
    }

    /// Get the full output file path
    fn get_output_file_path(&self, filename: &str) -> PathBuf {
        self.get_working_output_dir().join(filename)
    }

    /// Get the working output directory (staging directory in ZIP mode,
    /// otherwise the final output directory)
    fn get_working_output_dir(&self) -> PathBuf {
        if let Some(ref staging) = self.staging_dir {
            staging.path().to_path_buf()
        } else {
            self.config.output_path.clone()
        }
    }

    /// Create the final output (files are already in place unless zipping)
    fn create_output(&mut self) -> Result<()> {
        if !self.config.zip {
            info!(
                "Wrote {} files to {}",
                self.written_files.len(),
                self.config.output_path.display()
            );
            return Ok(());
        }

        let zip_path = self
            .config
            .output_path
            .join(format!("{}.zip", self.config.zip_name));

        ArchiveCreator::create_zip(&self.written_files, &zip_path, !self.config.no_progress)?;

        info!("Created ZIP archive: {}", zip_path.display());
        self.report.archive = Some(zip_path);
        Ok(())
    }

    /// Get the report of the last run
    pub fn get_conversion_report(&self) -> &ConversionReport {
        &self.report
    }
}

/// Parse every file of a group and fold them into one optimized program
fn merge_drill_group(
    base_name: &str,
    sources: &[DrillSource],
) -> std::result::Result<DrillProgram, TransProtelError> {
    let group_failed = |file: String, source: DrillError| TransProtelError::DrillGroupFailed {
        base_name: base_name.to_string(),
        file,
        source,
    };

    let mut programs = Vec::with_capacity(sources.len());
    for source in sources {
        let file_name = source.file_name();
        info!("Processing Excellon file: {} ({:?})", file_name, source.kind);

        let mut diagnostics = Diagnostics::new();
        let parsed = excellon::parse_file(&source.path, &mut diagnostics);
        report_diagnostics(&file_name, &mut diagnostics);
        programs.push(parsed.map_err(|e| group_failed(file_name, e))?);
    }

    let mut diagnostics = Diagnostics::new();
    let merged = excellon::merge_all(programs, &mut diagnostics);
    report_diagnostics(base_name, &mut diagnostics);

    let merged = merged.ok_or_else(|| TransProtelError::NoInputFiles {
        path: base_name.to_string(),
    })?;

    merged.map_err(|e| {
        let files = sources
            .iter()
            .map(DrillSource::file_name)
            .collect::<Vec<_>>()
            .join(" + ");
        group_failed(files, e)
    })
}

/// Forward collected findings to the log
fn report_diagnostics(origin: &str, diagnostics: &mut Diagnostics) {
    for Diagnostic {
        severity,
        line,
        message,
    } in diagnostics.drain()
    {
        let location = line.map(|l| format!(":{}", l)).unwrap_or_default();
        match severity {
            Severity::Warning => warn!("{}{}: {}", origin, location, message),
            Severity::Info => info!("{}{}: {}", origin, location, message),
        }
    }
}

/// Name the kind of a group failure for the report
fn error_kind(error: &anyhow::Error) -> &'static str {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DrillError>().map(DrillError::kind))
        .or_else(|| {
            error
                .chain()
                .any(|cause| cause.is::<std::io::Error>())
                .then_some("Io")
        })
        .unwrap_or("Other")
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so a failed write never leaves a partial file behind
fn write_output_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .context("Output path has no parent directory")?;
    fs::create_dir_all(dir).with_path_context("create output directory", dir)?;

    let mut temp = NamedTempFile::new_in(dir).with_path_context("create temporary file in", dir)?;
    temp.write_all(content.as_bytes())
        .with_path_context("write", temp.path().to_path_buf())?;
    temp.as_file()
        .sync_all()
        .with_path_context("flush", temp.path().to_path_buf())?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_path_context("persist", path)?;

    debug!("Written output file: {}", path.display());
    Ok(())
}
