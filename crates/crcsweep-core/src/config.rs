//! Runtime configuration for scans and verification jobs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default block size for checksum reads (4 KB)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Minimum block size (1 byte)
pub const MIN_BLOCK_SIZE: usize = 1;

/// Maximum block size (16 MB)
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// File name suffixes scanned when none are configured
pub const DEFAULT_SUFFIXES: &[&str] = &[".avi", ".mp4", ".mkv", ".ogm", ".mpg"];

/// Order in which the entries of one directory are visited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Plain byte-wise comparison of file names
    #[default]
    Lexicographic,
    /// Digit runs compared by numeric value (`ep2` before `ep10`)
    Natural,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Lexicographic => write!(f, "lexicographic"),
            SortOrder::Natural => write!(f, "natural"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lexicographic" | "lex" => Ok(SortOrder::Lexicographic),
            "natural" | "human" => Ok(SortOrder::Natural),
            other => Err(Error::InvalidConfig(format!("Unknown sort order: {}", other))),
        }
    }
}

/// Configuration for a directory scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Case-sensitive file name suffixes to include
    pub suffixes: Vec<String>,

    /// Drop files whose names carry no CRC-32
    pub require_declared_checksum: bool,

    /// Per-directory visiting order
    pub sort_order: SortOrder,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
            require_declared_checksum: false,
            sort_order: SortOrder::default(),
        }
    }
}

impl ScanConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the suffix filter
    pub fn suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether files without a declared checksum are excluded
    pub fn require_declared_checksum(mut self, require: bool) -> Self {
        self.require_declared_checksum = require;
        self
    }

    /// Set the per-directory sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Whether a file name passes the suffix filter
    pub fn accepts(&self, name: &str) -> bool {
        self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

/// Configuration for a verification job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    /// Bytes read per block while checksumming
    pub block_size: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl JobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set block size (clamped to valid range)
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        self
    }
}

/// Parse a human size string such as `4K`, `1M` or `65536` into bytes
pub fn parse_size(s: &str) -> Result<usize> {
    let s = s.trim().to_uppercase();
    let s = s.strip_suffix('B').unwrap_or(&s);

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else {
        (s, 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("Invalid size: {}", s)))?;

    num.checked_mul(multiplier)
        .filter(|size| *size > 0)
        .ok_or_else(|| Error::InvalidConfig(format!("Size out of range: {}", s)))
}
