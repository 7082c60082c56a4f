//! Scan command - lists candidate files and their declared checksums

use anyhow::{Context, Result};
use console::style;
use crcsweep_core::{DirectoryScanner, RecordSet, ScanConfig, ScanWarning};
use std::path::PathBuf;

use crate::progress;

/// Arguments for the scan command
pub struct ScanCommand {
    /// Effective filters
    pub config: ScanConfig,
    /// Directories to scan, in order
    pub roots: Vec<PathBuf>,
    /// Print JSON instead of a table
    pub json: bool,
    /// Suppress output
    pub silent: bool,
}

/// Scan every root into one path-unique set
pub fn collect(config: ScanConfig, roots: &[PathBuf]) -> Result<(RecordSet, Vec<ScanWarning>)> {
    let mut scanner = DirectoryScanner::with_config(config);
    let mut set = RecordSet::new();
    let mut warnings = Vec::new();

    for root in roots {
        let summary = scanner
            .scan_into(root, &mut set)
            .with_context(|| format!("Failed to scan {}", root.display()))?;
        tracing::debug!(
            "{}: {} added, {} excluded, {} duplicates",
            root.display(),
            summary.added,
            summary.excluded,
            summary.duplicates
        );
        warnings.extend(summary.warnings);
    }

    Ok((set, warnings))
}

/// Execute the scan command
pub fn execute(args: ScanCommand) -> Result<()> {
    let (set, warnings) = collect(args.config, &args.roots)?;

    if args.json {
        let output = serde_json::json!({
            "records": set.records(),
            "warnings": warnings,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize scan results")?
        );
        return Ok(());
    }

    if args.silent {
        return Ok(());
    }

    if set.is_empty() {
        println!("{}", style("No matching files found.").yellow());
    } else {
        println!(
            "{:<10} {:>10}  {}",
            style("CRC").bold(),
            style("SIZE").bold(),
            style("PATH").bold()
        );
        for record in &set {
            let declared = record
                .declared_checksum()
                .map(|c| style(c.to_hex()).cyan().to_string())
                .unwrap_or_else(|| style("--------".to_string()).dim().to_string());
            println!(
                "{:<10} {:>10}  {}",
                declared,
                progress::size(record.size_bytes()),
                record.path().display()
            );
        }
    }

    println!();
    println!(
        "{} file(s), {}",
        set.len(),
        progress::size(set.total_bytes())
    );

    for warning in &warnings {
        eprintln!(
            "{} skipped {}: {}",
            style("Warning:").yellow(),
            warning.path.display(),
            warning.reason
        );
    }

    Ok(())
}
