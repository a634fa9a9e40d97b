//! TransProtel - Normalize KiCad plot output for Protel-style fabrication

#![allow(non_snake_case)]

use tracing::{error, info};
use TransProtel::{config::Config, converter::Converter, error::Result};

fn main() -> Result<()> {
    // Parse configuration and initialize logging
    let config = Config::from_args().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    let mut converter = Converter::new(config);

    if let Err(e) = converter.run() {
        error!("Conversion failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    let report = converter.get_conversion_report();
    for renamed in &report.renamed {
        println!("{} -> {}", renamed.source, renamed.target);
    }
    for group in &report.drill_groups {
        println!(
            "{} -> {} ({} tools, {} holes)",
            group.sources.join(" + "),
            group.output,
            group.tool_count,
            group.command_count
        );
    }
    if let Some(archive) = &report.archive {
        println!("Archive: {}", archive.display());
    }

    if report.has_failures() {
        for failed in &report.failed_groups {
            eprintln!("Failed drill group '{}' [{}]: {}", failed.base_name, failed.kind, failed.message);
        }
        std::process::exit(1);
    }

    info!("Processed {} files", report.total_files_written());
    println!("Conversion completed successfully");
    Ok(())
}
