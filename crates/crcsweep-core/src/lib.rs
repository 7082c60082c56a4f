//! # crcsweep Core
//!
//! Engine for verifying release files against the CRC-32 embedded in their
//! names, e.g. `Show.S01E01.1080p [A016D394].mkv`.
//!
//! ## Modules
//!
//! - `extract`: Pulls the declared checksum out of a file name
//! - `checksum`: CRC-32 values and block-wise streaming computation
//! - `record`: File records, their status, and path-unique record sets
//! - `scanner`: Recursive, suffix-filtered directory discovery
//! - `job`: Sequential verification on a worker thread with an event stream
//! - `error`: Error types and result aliases
//! - `config`: Runtime configuration
//! - `settings`: Persistent user settings from configuration file
//!
//! ## Example
//!
//! ```no_run
//! use crcsweep_core::{DirectoryScanner, FileStatus, ScanConfig, VerificationJob};
//!
//! let config = ScanConfig::new().suffixes([".mkv"]);
//! let records = DirectoryScanner::with_config(config).scan("/media/anime")?;
//!
//! let handle = VerificationJob::new().start(records)?;
//! for event in handle.events() {
//!     println!("{:?}", event);
//! }
//!
//! let report = handle.wait()?;
//! for record in &report.records {
//!     if record.status() == FileStatus::Mismatch {
//!         println!("corrupt: {}", record.path().display());
//!     }
//! }
//! # Ok::<(), crcsweep_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checksum;
pub mod config;
pub mod error;
pub mod extract;
pub mod job;
pub mod record;
pub mod scanner;
pub mod settings;

pub use checksum::{compute_file, ChecksumComputer, Crc32};
pub use config::{
    parse_size, JobConfig, ScanConfig, SortOrder, DEFAULT_BLOCK_SIZE, DEFAULT_SUFFIXES,
    MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
pub use error::{Error, Result};
pub use extract::extract;
pub use job::{JobHandle, JobReport, JobState, VerificationEvent, VerificationJob};
pub use record::{FileRecord, FileStatus, RecordSet};
pub use scanner::{natural_cmp, scan, DirectoryScanner, ScanSummary, ScanWarning};
pub use settings::{BehaviorSettings, ScanSettings, Settings, SettingsError, VerifySettings};
