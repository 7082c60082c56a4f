//! Checksum command - calculates the CRC-32 of one file

use anyhow::{bail, Context, Result};
use console::style;
use crcsweep_core::{extract, ChecksumComputer, Error, FileStatus};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::progress;

/// Execute the checksum command
pub fn execute(
    file: &Path,
    block_size: usize,
    running: Arc<AtomicBool>,
    silent: bool,
) -> Result<()> {
    let size = std::fs::metadata(file)
        .with_context(|| format!("Failed to read {}", file.display()))?
        .len();

    println_if!(
        silent,
        "{} {}",
        style("File:").bold(),
        style(file.display()).cyan()
    );
    println_if!(silent, "  Size: {}", progress::size(size));

    let computer = ChecksumComputer::new().block_size(block_size);

    let finished = Arc::new(AtomicBool::new(false));
    let watcher = {
        let finished = Arc::clone(&finished);
        let cancel = computer.cancel_handle();
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

    let pb = progress::file_bar(silent);
    let result = computer.compute(file, |percentage| pb.set_position(u64::from(percentage)));
    pb.finish_and_clear();
    finished.store(true, Ordering::SeqCst);
    if watcher.join().is_err() {
        tracing::debug!("Cancel watcher thread panicked");
    }

    let checksum = match result {
        Ok(checksum) => checksum,
        Err(Error::Cancelled) => bail!("Checksum cancelled"),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to checksum {}", file.display()))
        }
    };

    // The bare checksum is the useful output even in silent mode
    if silent {
        println!("{}", checksum);
        return Ok(());
    }

    println!();
    println!("{}", style("CRC-32:").green().bold());
    println!("{}", checksum);

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let declared = extract(&name);
    if let Some(declared) = declared {
        let status = FileStatus::classify(Some(declared), Some(checksum));
        println!();
        println!(
            "{} {} [{}]",
            style("Declared in name:").dim(),
            declared,
            progress::styled_status(status)
        );
    }

    Ok(())
}
