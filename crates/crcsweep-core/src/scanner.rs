//! Recursive discovery of candidate files
//!
//! The scanner walks a root depth-first in pre-order, visits each
//! directory's entries in a configurable order, keeps files whose names end
//! with one of the configured suffixes, and builds a [`FileRecord`] for each
//! new path. Unreadable entries are reported as [`ScanWarning`]s and skipped;
//! only an unusable root aborts a scan.
//!
//! ## Example
//!
//! ```no_run
//! use crcsweep_core::{DirectoryScanner, ScanConfig};
//!
//! let config = ScanConfig::new().suffixes([".mkv"]).require_declared_checksum(true);
//! let mut scanner = DirectoryScanner::with_config(config)
//!     .on_warning(|w| eprintln!("skipped {}: {}", w.path.display(), w.reason));
//!
//! for record in scanner.scan("/media/anime")? {
//!     println!("{} {:?}", record.name(), record.declared_checksum());
//! }
//! # Ok::<(), crcsweep_core::Error>(())
//! ```

use crate::config::{ScanConfig, SortOrder};
use crate::error::{Error, Result};
use crate::record::{FileRecord, RecordSet};
use serde::Serialize;
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Comparator over file names within one directory
pub type NameComparator = Arc<dyn Fn(&OsStr, &OsStr) -> Ordering + Send + Sync>;

/// Warning callback type
pub type WarningCallback = Box<dyn FnMut(&ScanWarning) + Send>;

/// A path skipped during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// The entry that was skipped
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Counters and warnings from one scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Files that passed the suffix filter and could be stat'ed
    pub discovered: usize,
    /// Records appended to the set
    pub added: usize,
    /// Discovered files dropped for lacking a declared checksum
    pub excluded: usize,
    /// Files whose path was already in the set
    pub duplicates: usize,
    /// Entries skipped because they could not be read
    pub warnings: Vec<ScanWarning>,
}

/// Walks directory trees and builds file records
pub struct DirectoryScanner {
    config: ScanConfig,
    comparator: NameComparator,
    warning_callback: Option<WarningCallback>,
}

impl DirectoryScanner {
    /// Create a scanner with default configuration
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScanConfig) -> Self {
        let comparator = comparator_for(config.sort_order);
        Self {
            config,
            comparator,
            warning_callback: None,
        }
    }

    /// Replace the per-directory ordering with a custom comparator
    pub fn sort_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&OsStr, &OsStr) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Arc::new(compare);
        self
    }

    /// Set warning callback
    pub fn on_warning<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ScanWarning) + Send + 'static,
    {
        self.warning_callback = Some(Box::new(callback));
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `root` into a fresh, ordered list of records
    pub fn scan<P: AsRef<Path>>(&mut self, root: P) -> Result<Vec<FileRecord>> {
        let mut set = RecordSet::new();
        self.scan_into(root, &mut set)?;
        Ok(set.into_records())
    }

    /// Scan `root` and append new records to `set`
    ///
    /// Paths already in `set` are left untouched. If the root is unusable
    /// nothing is appended.
    pub fn scan_into<P: AsRef<Path>>(&mut self, root: P, set: &mut RecordSet) -> Result<ScanSummary> {
        let root = root.as_ref();
        validate_root(root)?;

        tracing::info!("Scanning {:?}", root);
        let mut summary = ScanSummary::default();
        let compare = Arc::clone(&self.comparator);
        // A directory's own files come before any of its subdirectories
        let walker = WalkDir::new(root).follow_links(true).sort_by(move |a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| compare(a.file_name(), b.file_name()))
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    self.warn(&mut summary, path, err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.config.accepts(&name) {
                continue;
            }

            let path = match entry.path().canonicalize() {
                Ok(path) => path,
                Err(err) => {
                    self.warn(&mut summary, entry.path().to_path_buf(), err.to_string());
                    continue;
                }
            };

            if set.contains(&path) {
                summary.duplicates += 1;
                continue;
            }

            let size_bytes = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    self.warn(&mut summary, path, err.to_string());
                    continue;
                }
            };

            let record = FileRecord::new(path, size_bytes);
            summary.discovered += 1;

            if self.config.require_declared_checksum && record.declared_checksum().is_none() {
                tracing::debug!("No declared checksum, excluding {:?}", record.path());
                summary.excluded += 1;
                continue;
            }

            set.insert(record);
            summary.added += 1;
        }

        tracing::info!(
            "Scan of {:?} finished: {} added, {} excluded, {} duplicates, {} skipped",
            root,
            summary.added,
            summary.excluded,
            summary.duplicates,
            summary.warnings.len()
        );

        Ok(summary)
    }

    /// Scan several roots on a background thread
    ///
    /// Warnings still reach the callback as they happen; the joined thread
    /// yields the accumulated set and one summary per root.
    pub fn spawn(
        mut self,
        roots: Vec<PathBuf>,
    ) -> std::io::Result<std::thread::JoinHandle<Result<(RecordSet, Vec<ScanSummary>)>>> {
        std::thread::Builder::new()
            .name("crcsweep-scan".to_string())
            .spawn(move || {
                let mut set = RecordSet::new();
                let mut summaries = Vec::with_capacity(roots.len());
                for root in &roots {
                    summaries.push(self.scan_into(root, &mut set)?);
                }
                Ok((set, summaries))
            })
    }

    fn warn(&mut self, summary: &mut ScanSummary, path: PathBuf, reason: String) {
        tracing::warn!("Skipping {:?}: {}", path, reason);
        let warning = ScanWarning { path, reason };
        if let Some(ref mut callback) = self.warning_callback {
            callback(&warning);
        }
        summary.warnings.push(warning);
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("config", &self.config)
            .field("has_warning_callback", &self.warning_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Scan `root` with the given suffix filter
pub fn scan<P, I, S>(root: P, allowed_suffixes: I, require_declared_checksum: bool) -> Result<Vec<FileRecord>>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let config = ScanConfig::new()
        .suffixes(allowed_suffixes)
        .require_declared_checksum(require_declared_checksum);
    DirectoryScanner::with_config(config).scan(root)
}

fn validate_root(root: &Path) -> Result<()> {
    let display = root.display().to_string();
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(display)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(display)),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(Error::PermissionDenied(display))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

// ============================================================================
// Ordering
// ============================================================================

fn comparator_for(order: SortOrder) -> NameComparator {
    match order {
        SortOrder::Lexicographic => Arc::new(|a: &OsStr, b: &OsStr| a.cmp(b)),
        SortOrder::Natural => {
            Arc::new(|a: &OsStr, b: &OsStr| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()))
        }
    }
}

/// Compare names treating runs of ASCII digits as numbers
///
/// Ties (e.g. `01` vs `1`) fall back to plain string order so the result is
/// a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut ia, mut ib) = (a, b);

    loop {
        match (ia.chars().next(), ib.chars().next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (da, ra) = split_digits(ia);
                let (db, rb) = split_digits(ib);
                let na = da.trim_start_matches('0');
                let nb = db.trim_start_matches('0');
                let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
                if ord != Ordering::Equal {
                    return ord;
                }
                ia = ra;
                ib = rb;
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                ia = &ia[ca.len_utf8()..];
                ib = &ib[cb.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}
