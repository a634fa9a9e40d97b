//! Archive handling for ZIP file operations
//!
//! Plot output may arrive zipped, and converted files can be bundled into a
//! single ZIP for the fab house.

use crate::error::{Result, ResultExt, TransProtelError};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;
use zip::ZipArchive;

fn archive_progress(total: usize, show_progress: bool, message: &'static str) -> Result<Option<ProgressBar>> {
    if !show_progress {
        return Ok(None);
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    Ok(Some(pb))
}

/// Archive extractor for handling ZIP input files
pub struct ArchiveExtractor {
    temp_dir: Option<TempDir>,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractor {
    /// Create a new archive extractor
    pub fn new() -> Self {
        Self { temp_dir: None }
    }

    /// Extract ZIP file if the input path is a ZIP file
    /// Returns the path to use for processing (original path or extracted directory)
    pub fn extract_if_needed(&mut self, input_path: &Path, show_progress: bool) -> Result<PathBuf> {
        if !is_zip_file(input_path) {
            info!(
                "Input is not a ZIP file, using as directory: {}",
                input_path.display()
            );
            return Ok(input_path.to_path_buf());
        }

        info!("Extracting ZIP archive: {}", input_path.display());

        let temp_dir =
            TempDir::new().context("Failed to create temporary directory for ZIP extraction")?;

        extract_zip_to_directory(input_path, temp_dir.path(), show_progress)
            .with_path_context("extract ZIP file", input_path)?;

        let extracted_path = temp_dir.path().to_path_buf();
        self.temp_dir = Some(temp_dir);

        info!("ZIP file extracted to: {}", extracted_path.display());
        Ok(extracted_path)
    }

    /// Get the temporary directory path if ZIP was extracted
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(|dir| dir.path())
    }
}

impl Drop for ArchiveExtractor {
    fn drop(&mut self) {
        if self.temp_dir.is_some() {
            info!("Cleaning up temporary extraction directory");
        }
    }
}

/// Check if a path is an existing ZIP file based on extension
pub fn is_zip_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false)
}

/// Extract ZIP file to the specified directory
fn extract_zip_to_directory(zip_path: &Path, target_dir: &Path, show_progress: bool) -> Result<()> {
    let file = fs::File::open(zip_path).with_path_context("open ZIP file", zip_path)?;

    let mut archive = ZipArchive::new(file).map_err(|e| TransProtelError::ZipExtractionFailed {
        reason: format!("Invalid ZIP file: {}", e),
    })?;

    info!("Archive contains {} entries", archive.len());
    let progress = archive_progress(archive.len(), show_progress, "Extracting files...")?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| TransProtelError::ZipExtractionFailed {
                reason: format!("Failed to read file at index {}: {}", i, e),
            })?;

        // Entries with absolute paths or `..` components are skipped.
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let outpath = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).with_path_context("create directory", &outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).with_path_context("create parent directory", parent)?;
            }

            let mut outfile =
                fs::File::create(&outpath).with_path_context("create output file", &outpath)?;

            io::copy(&mut entry, &mut outfile).with_path_context("write extracted file", &outpath)?;
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Extraction completed");
    }

    Ok(())
}

/// Archive creator for building output ZIP files
pub struct ArchiveCreator;

impl ArchiveCreator {
    /// Create a ZIP file from a collection of files
    ///
    /// Entries are stored flat under their file names.
    pub fn create_zip<P: AsRef<Path>, I: IntoIterator<Item = P>>(
        files: I,
        output_path: &Path,
        show_progress: bool,
    ) -> Result<()> {
        let files: Vec<PathBuf> = files
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();

        info!("Creating ZIP archive: {}", output_path.display());

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).with_path_context("create output directory", parent)?;
        }

        let file =
            fs::File::create(output_path).with_path_context("create ZIP file", output_path)?;

        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644);

        let progress = archive_progress(files.len(), show_progress, "Creating ZIP file...")?;

        for file_path in files {
            let file_name = file_path
                .file_name()
                .and_then(|name| name.to_str())
                .context("Invalid filename")?;

            zip.start_file(file_name, options)
                .context("Failed to start ZIP file entry")?;

            let content =
                fs::read(&file_path).with_path_context("read file for ZIP", &file_path)?;

            zip.write_all(&content)
                .context("Failed to write file content to ZIP")?;

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        zip.finish().context("Failed to finalize ZIP file")?;

        if let Some(pb) = progress {
            pb.finish_with_message("ZIP file created successfully");
        }

        info!("ZIP file created successfully: {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_is_zip_file() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("plots.ZIP");
        let txt_path = dir.path().join("plots.txt");
        fs::write(&zip_path, b"").unwrap();
        fs::write(&txt_path, b"").unwrap();

        assert!(is_zip_file(&zip_path));
        assert!(!is_zip_file(&txt_path));
        assert!(!is_zip_file(&dir.path().join("missing.zip")));
        assert!(!is_zip_file(dir.path()));
    }

    #[test]
    fn test_directory_input_is_passed_through() {
        let dir = tempdir().unwrap();
        let mut extractor = ArchiveExtractor::new();

        let path = extractor.extract_if_needed(dir.path(), false).unwrap();
        assert_eq!(path, dir.path());
        assert!(extractor.temp_path().is_none());
    }

    #[test]
    fn test_create_then_extract_zip() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("board.GTL");
        let b = dir.path().join("board.txt");
        fs::write(&a, "G04 top*\n").unwrap();
        fs::write(&b, "M48\nMETRIC,TZ\n%\nG90\nG05\nM71\nT0\nM30").unwrap();

        let zip_path = dir.path().join("out").join("Gerber.zip");
        ArchiveCreator::create_zip([&a, &b], &zip_path, false).unwrap();

        let mut archive = ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("board.GTL")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "G04 top*\n");

        let mut extractor = ArchiveExtractor::new();
        let extracted = extractor.extract_if_needed(&zip_path, false).unwrap();
        assert_eq!(extractor.temp_path(), Some(extracted.as_path()));
        assert!(extracted.join("board.txt").is_file());
    }

    #[test]
    fn test_invalid_zip_is_reported() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("bogus.zip");
        fs::write(&bogus, b"not a zip").unwrap();

        let mut extractor = ArchiveExtractor::new();
        let err = extractor.extract_if_needed(&bogus, false).unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.to_string().contains("ZIP extraction failed")));
    }
}
