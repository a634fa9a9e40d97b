//! Configuration management for TransProtel
//!
//! This module handles CLI argument parsing, logging setup and application
//! settings.

use anyhow::{anyhow, Context, Result};
use clap::builder::styling;
use clap::{value_parser, Arg, ArgMatches, ColorChoice, Command};
use std::path::PathBuf;
use tracing::info;

/// Build the CLI command
pub fn build_cli() -> Command {
    let styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Blue.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default());

    Command::new("transprotel")
        .about("TransProtel - Normalize KiCad plot output to Protel naming with merged drill files")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Directory (or ZIP archive) containing KiCad plot output")
                .value_parser(value_parser!(String))
                .default_value("."),
        )
        .arg(
            Arg::new("output_path")
                .short('o')
                .long("output_path")
                .help("Directory to store converted files (created if missing)")
                .value_parser(value_parser!(String))
                .default_value("./output"),
        )
        .arg(
            Arg::new("zip")
                .short('z')
                .long("zip")
                .help("Package converted files into a ZIP archive")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("zip_name")
                .short('n')
                .long("zip_name")
                .help("Name for the output ZIP archive")
                .value_parser(value_parser!(String))
                .default_value("Gerber"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no_progress")
                .long("no-progress")
                .help("Disable progress indicators")
                .action(clap::ArgAction::SetTrue),
        )
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Input path (directory or ZIP file)
    pub path: PathBuf,

    /// Output directory path
    pub output_path: PathBuf,

    /// Create ZIP file for output
    pub zip: bool,

    /// Name for the output ZIP file, without extension
    pub zip_name: String,

    /// Enable verbose logging
    pub verbose: bool,

    /// Disable progress bars
    pub no_progress: bool,
}

impl Config {
    /// Parse process arguments and initialize logging
    pub fn from_args() -> Result<Self> {
        let matches = build_cli().get_matches();
        let config = Self::from_matches(&matches)?;

        init_logging(config.verbose);

        if config.verbose {
            info!("Configuration: {:?}", config);
        }

        Ok(config)
    }

    /// Build a configuration from parsed arguments
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let path = matches
            .get_one::<String>("path")
            .ok_or_else(|| anyhow!("Input path is required"))?;

        let output_path = matches
            .get_one::<String>("output_path")
            .cloned()
            .unwrap_or_else(|| "./output".to_string());

        let zip_name = matches
            .get_one::<String>("zip_name")
            .cloned()
            .unwrap_or_else(|| "Gerber".to_string());

        Ok(Config {
            path: PathBuf::from(path),
            output_path: PathBuf::from(output_path),
            zip: matches.get_flag("zip"),
            zip_name,
            verbose: matches.get_flag("verbose"),
            no_progress: matches.get_flag("no_progress"),
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(anyhow!("Input path does not exist: {}", self.path.display()));
        }

        if self.zip_name.is_empty() || self.zip_name.contains(['/', '\\']) {
            return Err(anyhow!("Invalid ZIP name: '{}'", self.zip_name));
        }

        if !self.output_path.exists() {
            std::fs::create_dir_all(&self.output_path).with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.output_path.display()
                )
            })?;
            info!("Created output directory: {}", self.output_path.display());
        }

        info!("Configuration validation completed successfully");
        Ok(())
    }
}

/// Set up tracing. RUST_LOG takes precedence over the verbose flag.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // A subscriber may already be installed (tests, embedding callers).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
