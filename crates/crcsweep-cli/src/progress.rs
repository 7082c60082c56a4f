//! Progress bars and status styling for the CLI

use console::{style, StyledObject};
use crcsweep_core::FileStatus;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};

const PROGRESS_CHARS: &str = "█▓░";

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS)
}

/// Bar over 0..=100 for the file being read
pub fn file_bar(silent: bool) -> ProgressBar {
    if silent {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    pb.set_style(bar_style(
        "  {spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}",
    ));
    pb
}

/// Bar over 0..=100 for the whole job
pub fn overall_bar(silent: bool) -> ProgressBar {
    if silent {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    pb.set_style(bar_style(
        "  {prefix:.bold} [{bar:40.green/white}] {pos:>3}% ({elapsed_precise})",
    ));
    pb.set_prefix("Total");
    pb
}

/// Status label colored by outcome
pub fn styled_status(status: FileStatus) -> StyledObject<&'static str> {
    let label = style(status.label());
    match status {
        FileStatus::Match => label.green().bold(),
        FileStatus::Mismatch | FileStatus::Error => label.red().bold(),
        FileStatus::NoReference => label.yellow(),
        FileStatus::Unverified => label.dim(),
    }
}

/// Human-readable byte count
pub fn size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}
