//! Discovered files and their verification state

use crate::checksum::Crc32;
use crate::error::Result;
use crate::extract;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ============================================================================
// File Status
// ============================================================================

/// Verification outcome of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Not checksummed yet
    Unverified,
    /// Computed checksum equals the declared one
    Match,
    /// Computed checksum differs from the declared one
    Mismatch,
    /// The file name carries no checksum to compare against
    NoReference,
    /// The file could not be read
    Error,
}

impl FileStatus {
    /// Classify a pair of checksums
    ///
    /// `(None, _)` is `NoReference`, `(Some, None)` is `Unverified`, and two
    /// present values are `Match` or `Mismatch`.
    pub fn classify(declared: Option<Crc32>, computed: Option<Crc32>) -> Self {
        match (declared, computed) {
            (None, _) => FileStatus::NoReference,
            (Some(_), None) => FileStatus::Unverified,
            (Some(d), Some(c)) if d == c => FileStatus::Match,
            (Some(_), Some(_)) => FileStatus::Mismatch,
        }
    }

    /// Whether this status ends a file's verification
    pub fn is_terminal(self) -> bool {
        !matches!(self, FileStatus::Unverified)
    }

    /// Whether this status should fail a batch
    pub fn is_failure(self) -> bool {
        matches!(self, FileStatus::Mismatch | FileStatus::Error)
    }

    /// Short label for display
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Unverified => "UNVERIFIED",
            FileStatus::Match => "OK",
            FileStatus::Mismatch => "MISMATCH",
            FileStatus::NoReference => "NO CRC",
            FileStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// File Record
// ============================================================================

/// One discovered file
///
/// Identity is the path. The declared checksum is fixed at creation; the
/// computed checksum is written once by a verification job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    path: PathBuf,
    name: String,
    directory: PathBuf,
    size_bytes: u64,
    declared_checksum: Option<Crc32>,
    computed_checksum: Option<Crc32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileRecord {
    /// Build a record for `path`, taking its size from a stat call
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let size_bytes = std::fs::metadata(&path)?.len();
        Ok(Self::new(path, size_bytes))
    }

    /// Build a record with a known size
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let declared_checksum = extract::extract(&name);

        Self {
            path,
            name,
            directory,
            size_bytes,
            declared_checksum,
            computed_checksum: None,
            error: None,
        }
    }

    /// Full path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Containing directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Size in bytes when the file was discovered
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Checksum embedded in the file name
    pub fn declared_checksum(&self) -> Option<Crc32> {
        self.declared_checksum
    }

    /// Checksum computed from the file content
    pub fn computed_checksum(&self) -> Option<Crc32> {
        self.computed_checksum
    }

    /// Read error recorded by the last verification, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current status
    pub fn status(&self) -> FileStatus {
        if self.error.is_some() {
            FileStatus::Error
        } else if self.computed_checksum.is_none() {
            FileStatus::Unverified
        } else {
            FileStatus::classify(self.declared_checksum, self.computed_checksum)
        }
    }

    pub(crate) fn set_computed(&mut self, crc: Crc32) {
        self.computed_checksum = Some(crc);
        self.error = None;
    }

    pub(crate) fn reset_verification(&mut self) {
        self.computed_checksum = None;
        self.error = None;
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.computed_checksum = None;
        self.error = Some(message);
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileRecord {}

// ============================================================================
// Record Set
// ============================================================================

/// Ordered records, unique by path (first insertion wins)
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<FileRecord>,
    paths: HashSet<PathBuf>,
}

impl RecordSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record unless its path is already present
    pub fn insert(&mut self, record: FileRecord) -> bool {
        if self.paths.contains(record.path()) {
            return false;
        }
        self.paths.insert(record.path().to_path_buf());
        self.records.push(record);
        true
    }

    /// Whether a path is already present
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records
    pub fn clear(&mut self) {
        self.records.clear();
        self.paths.clear();
    }

    /// Records in insertion order
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    /// Total size of all records
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(FileRecord::size_bytes).sum()
    }

    /// Take the ordered records
    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }
}

impl From<RecordSet> for Vec<FileRecord> {
    fn from(set: RecordSet) -> Self {
        set.into_records()
    }
}

impl FromIterator<FileRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
