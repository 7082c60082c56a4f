//! Verify command - checks files against the CRC-32 in their names

use anyhow::{bail, Context, Result};
use console::style;
use crcsweep_core::{
    FileRecord, FileStatus, JobConfig, JobReport, ScanConfig, VerificationEvent, VerificationJob,
};
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::progress;

/// Arguments for the verify command
pub struct VerifyArgs {
    /// Effective filters
    pub scan_config: ScanConfig,
    /// Effective job settings
    pub job_config: JobConfig,
    /// Directories to scan, in order
    pub roots: Vec<PathBuf>,
    /// Print the final report as JSON
    pub json: bool,
    /// Suppress output
    pub silent: bool,
    /// Cleared by the Ctrl+C handler
    pub running: Arc<AtomicBool>,
}

/// Execute the verify command
pub fn execute(args: VerifyArgs) -> Result<()> {
    let quiet = args.silent || args.json;

    let (set, warnings) = super::scan::collect(args.scan_config, &args.roots)?;
    for warning in &warnings {
        if !args.silent {
            eprintln!(
                "{} skipped {}: {}",
                style("Warning:").yellow(),
                warning.path.display(),
                warning.reason
            );
        }
    }

    if set.is_empty() {
        println_if!(quiet, "{}", style("No matching files found.").yellow());
        return Ok(());
    }

    println_if!(
        quiet,
        "{} {} file(s), {}\n",
        style("Verifying").bold(),
        set.len(),
        progress::size(set.total_bytes())
    );

    let names: Vec<String> = set.iter().map(|r| r.name().to_string()).collect();
    let job = VerificationJob::with_config(args.job_config);
    // Ctrl+C during the scan stops the job before its first file
    if !args.running.load(Ordering::SeqCst) {
        job.cancel();
    }
    let handle = job
        .start(set.into_records())
        .context("Failed to start verification")?;

    // Forward Ctrl+C to the job until it finishes
    let finished = Arc::new(AtomicBool::new(false));
    let watcher = {
        let running = Arc::clone(&args.running);
        let finished = Arc::clone(&finished);
        let cancel = handle.cancel_handle();
        std::thread::spawn(move || {
            while !finished.load(Ordering::SeqCst) {
                if !running.load(Ordering::SeqCst) {
                    cancel.store(true, Ordering::SeqCst);
                    break;
                }
                std::thread::sleep(Duration::from_millis(100));
            }
        })
    };

    let multi = MultiProgress::new();
    let overall = multi.add(progress::overall_bar(quiet));
    let file_bar = multi.add(progress::file_bar(quiet));
    let mut current = None;

    for event in handle.events() {
        match event {
            VerificationEvent::FileProgress { index, percentage } => {
                if current != Some(index) {
                    current = Some(index);
                    file_bar.reset();
                    file_bar.set_message(names.get(index).cloned().unwrap_or_default());
                }
                file_bar.set_position(u64::from(percentage));
            }
            VerificationEvent::FileCompleted {
                index,
                status,
                computed_checksum,
            } => {
                if !quiet {
                    let computed = computed_checksum
                        .map(|c| c.to_hex())
                        .unwrap_or_else(|| "--------".to_string());
                    let name = names.get(index).map(String::as_str).unwrap_or_default();
                    multi.suspend(|| {
                        println!(
                            "  {} {} [{}]",
                            computed,
                            name,
                            progress::styled_status(status)
                        );
                    });
                }
            }
            VerificationEvent::OverallProgress { percentage } => {
                overall.set_position(u64::from(percentage));
            }
            VerificationEvent::JobCancelled => {
                tracing::debug!("Job reported cancellation");
            }
        }
    }

    file_bar.finish_and_clear();
    overall.finish_and_clear();
    finished.store(true, Ordering::SeqCst);
    if watcher.join().is_err() {
        tracing::debug!("Cancel watcher thread panicked");
    }

    let report = handle.wait().context("Verification worker failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else if !args.silent {
        print_summary(&report);
    }

    if report.state == crcsweep_core::JobState::Cancelled {
        bail!(
            "Verification cancelled with {} file(s) unverified",
            report.unverified()
        );
    }

    if report.has_failures() {
        bail!(
            "{} file(s) failed verification",
            report.mismatched() + report.errors()
        );
    }

    Ok(())
}

fn print_summary(report: &JobReport) {
    let failed: Vec<&FileRecord> = report
        .records
        .iter()
        .filter(|r| r.status().is_failure())
        .collect();

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed:").red().bold());
        for record in failed {
            match (record.status(), record.error()) {
                (FileStatus::Error, Some(reason)) => {
                    println!("  {} ({})", record.path().display(), reason)
                }
                _ => println!(
                    "  {} (expected {}, got {})",
                    record.path().display(),
                    record
                        .declared_checksum()
                        .map(|c| c.to_hex())
                        .unwrap_or_default(),
                    record
                        .computed_checksum()
                        .map(|c| c.to_hex())
                        .unwrap_or_default()
                ),
            }
        }
    }

    println!();
    println!(
        "{} {} OK, {} mismatched, {} without CRC, {} unreadable",
        style("Summary:").bold(),
        style(report.matched()).green(),
        style(report.mismatched()).red(),
        style(report.no_reference()).yellow(),
        style(report.errors()).red()
    );
    if report.unverified() > 0 {
        println!("  {} file(s) not verified", report.unverified());
    }
    println!(
        "  {} checked in {:.2}s",
        progress::size(report.bytes_verified()),
        report.elapsed.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crcsweep_core::Crc32;
    use std::fs;
    use tempfile::TempDir;

    fn args(root: &std::path::Path, running: bool) -> VerifyArgs {
        VerifyArgs {
            scan_config: ScanConfig::new(),
            job_config: JobConfig::new(),
            roots: vec![root.to_path_buf()],
            json: false,
            silent: true,
            running: Arc::new(AtomicBool::new(running)),
        }
    }

    #[test]
    fn test_verify_all_matching() {
        let dir = TempDir::new().unwrap();
        let data = b"episode one";
        fs::write(dir.path().join(format!("ep1 [{}].mkv", Crc32::of(data))), data).unwrap();
        fs::write(dir.path().join("extra.mp4"), b"untagged").unwrap();

        assert!(execute(args(dir.path(), true)).is_ok());
    }

    #[test]
    fn test_verify_mismatch_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ep1 [DEADBEEF].mkv"), b"not that").unwrap();

        let err = execute(args(dir.path(), true)).unwrap_err();
        assert!(err.to_string().contains("failed verification"));
    }

    #[test]
    fn test_verify_empty_directory_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(execute(args(dir.path(), true)).is_ok());
    }

    #[test]
    fn test_interrupted_verify_fails() {
        let dir = TempDir::new().unwrap();
        for i in 0..3u8 {
            fs::write(dir.path().join(format!("ep{}.mkv", i)), vec![i; 1024]).unwrap();
        }

        // Ctrl+C already pressed: the job starts cancelled
        let mut cancelled = args(dir.path(), false);
        cancelled.job_config = JobConfig::new().block_size(1);
        let err = execute(cancelled).unwrap_err();

        assert!(err.to_string().contains("cancelled"), "{}", err);
        assert!(err.to_string().contains("3 file(s) unverified"), "{}", err);
    }
}
