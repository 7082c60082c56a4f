//! Sequential verification of scanned files
//!
//! A [`VerificationJob`] checksums records strictly one after another on a
//! single worker thread and reports through a stream of immutable
//! [`VerificationEvent`]s. All events for file `i` are sent before any event
//! for file `i + 1`. Cancellation is cooperative: it is observed before each
//! block read and before each file starts.
//!
//! ## Example
//!
//! ```no_run
//! use crcsweep_core::{DirectoryScanner, JobConfig, VerificationEvent, VerificationJob};
//!
//! let records = DirectoryScanner::new().scan("/media/anime")?;
//! let job = VerificationJob::with_config(JobConfig::new().block_size(64 * 1024));
//! let handle = job.start(records)?;
//!
//! for event in handle.events() {
//!     if let VerificationEvent::FileCompleted { index, status, .. } = event {
//!         println!("#{} {}", index, status);
//!     }
//! }
//!
//! let report = handle.wait()?;
//! println!("{} mismatched", report.mismatched());
//! # Ok::<(), crcsweep_core::Error>(())
//! ```

use crate::checksum::{ChecksumComputer, Crc32};
use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::record::{FileRecord, FileStatus};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// ============================================================================
// Events and State
// ============================================================================

/// Progress and results reported by a running job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VerificationEvent {
    /// Integer percentage of the current file read so far
    FileProgress {
        /// Position of the file in the job's input
        index: usize,
        /// 0..=100
        percentage: u8,
    },
    /// A file reached its terminal status
    FileCompleted {
        /// Position of the file in the job's input
        index: usize,
        /// Match, Mismatch, NoReference or Error
        status: FileStatus,
        /// Absent when the file could not be read
        computed_checksum: Option<Crc32>,
    },
    /// Share of the job's files that are finished
    OverallProgress {
        /// 0..=100
        percentage: u8,
    },
    /// The job stopped early at the caller's request
    JobCancelled,
}

/// Lifecycle of a verification job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Created, not started
    Idle,
    /// Processing files
    Running,
    /// Every file was processed
    Completed,
    /// Stopped by cancellation
    Cancelled,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Idle,
            1 => JobState::Running,
            2 => JobState::Completed,
            _ => JobState::Cancelled,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            JobState::Idle => 0,
            JobState::Running => 1,
            JobState::Completed => 2,
            JobState::Cancelled => 3,
        }
    }

    /// Whether the job can no longer change state
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Idle => write!(f, "idle"),
            JobState::Running => write!(f, "running"),
            JobState::Completed => write!(f, "completed"),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ============================================================================
// Job Report
// ============================================================================

/// Final records and outcome of a job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Terminal state
    pub state: JobState,
    /// Records in input order, with computed checksums filled in
    pub records: Vec<FileRecord>,
    /// Wall-clock time of the job
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl JobReport {
    /// Number of records with the given status
    pub fn count(&self, status: FileStatus) -> usize {
        self.records.iter().filter(|r| r.status() == status).count()
    }

    /// Files whose checksum matched
    pub fn matched(&self) -> usize {
        self.count(FileStatus::Match)
    }

    /// Files whose checksum did not match
    pub fn mismatched(&self) -> usize {
        self.count(FileStatus::Mismatch)
    }

    /// Files without a declared checksum
    pub fn no_reference(&self) -> usize {
        self.count(FileStatus::NoReference)
    }

    /// Files that could not be read
    pub fn errors(&self) -> usize {
        self.count(FileStatus::Error)
    }

    /// Files never checksummed (only after cancellation)
    pub fn unverified(&self) -> usize {
        self.count(FileStatus::Unverified)
    }

    /// Whether any file mismatched or failed to read
    pub fn has_failures(&self) -> bool {
        self.records.iter().any(|r| r.status().is_failure())
    }

    /// Total bytes of the records that were checksummed
    pub fn bytes_verified(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| r.computed_checksum().is_some())
            .map(FileRecord::size_bytes)
            .sum()
    }
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Verification Job
// ============================================================================

/// A single-use, sequential verification pass over a list of records
#[derive(Debug)]
pub struct VerificationJob {
    config: JobConfig,
    state: Arc<AtomicU8>,
    cancel_flag: Arc<AtomicBool>,
}

impl VerificationJob {
    /// Create a job with default configuration
    pub fn new() -> Self {
        Self::with_config(JobConfig::default())
    }

    /// Create a job with custom configuration
    pub fn with_config(config: JobConfig) -> Self {
        Self {
            config,
            state: Arc::new(AtomicU8::new(JobState::Idle.as_u8())),
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Get a handle to cancel the job
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Process `records` on a dedicated worker thread
    ///
    /// Fails without side effects if `records` is empty or the job was
    /// already started.
    pub fn start(&self, records: Vec<FileRecord>) -> Result<JobHandle> {
        self.begin(records.len())?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = Worker {
            config: self.config,
            state: Arc::clone(&self.state),
            cancel_flag: Arc::clone(&self.cancel_flag),
        };

        let spawned = std::thread::Builder::new()
            .name("crcsweep-verify".to_string())
            .spawn(move || {
                let mut records = records;
                let start = Instant::now();
                let state = worker.process(&mut records, |event| send(&tx, event));
                JobReport {
                    state,
                    records,
                    elapsed: start.elapsed(),
                }
            });

        match spawned {
            Ok(handle) => Ok(JobHandle {
                events: rx,
                worker: handle,
                state: Arc::clone(&self.state),
                cancel_flag: Arc::clone(&self.cancel_flag),
            }),
            Err(e) => {
                self.state.store(JobState::Idle.as_u8(), Ordering::SeqCst);
                Err(Error::Io(e))
            }
        }
    }

    /// Process `records` on the calling thread, delivering events to `on_event`
    pub fn run<F>(&self, records: &mut [FileRecord], on_event: F) -> Result<JobState>
    where
        F: FnMut(VerificationEvent),
    {
        self.begin(records.len())?;
        let worker = Worker {
            config: self.config,
            state: Arc::clone(&self.state),
            cancel_flag: Arc::clone(&self.cancel_flag),
        };
        Ok(worker.process(records, on_event))
    }

    fn begin(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(Error::EmptyJob);
        }
        self.state
            .compare_exchange(
                JobState::Idle.as_u8(),
                JobState::Running.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
            .map_err(|_| Error::JobAlreadyStarted)
    }
}

impl Default for VerificationJob {
    fn default() -> Self {
        Self::new()
    }
}

fn send(tx: &Sender<VerificationEvent>, event: VerificationEvent) {
    // A dropped receiver only means nobody is listening any more
    let _ = tx.send(event);
}

/// Everything the worker thread needs, detached from the job
struct Worker {
    config: JobConfig,
    state: Arc<AtomicU8>,
    cancel_flag: Arc<AtomicBool>,
}

impl Worker {
    fn process<F>(&self, records: &mut [FileRecord], mut emit: F) -> JobState
    where
        F: FnMut(VerificationEvent),
    {
        let total = records.len();
        let computer = ChecksumComputer::new()
            .block_size(self.config.block_size)
            .with_cancel_flag(Arc::clone(&self.cancel_flag));

        for record in records.iter_mut() {
            record.reset_verification();
        }

        tracing::info!("Verifying {} files", total);

        for (index, record) in records.iter_mut().enumerate() {
            if self.cancel_flag.load(Ordering::SeqCst) {
                return self.finish_cancelled(index, &mut emit);
            }

            tracing::debug!("[{}/{}] {:?}", index + 1, total, record.path());
            let result = computer.compute(record.path(), |percentage| {
                emit(VerificationEvent::FileProgress { index, percentage });
            });

            match result {
                Ok(crc) => record.set_computed(crc),
                Err(Error::Cancelled) => return self.finish_cancelled(index, &mut emit),
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", record.path(), e);
                    record.set_error(e.to_string());
                }
            }

            emit(VerificationEvent::FileCompleted {
                index,
                status: record.status(),
                computed_checksum: record.computed_checksum(),
            });
            emit(VerificationEvent::OverallProgress {
                percentage: ((index + 1) * 100 / total) as u8,
            });
        }

        self.state
            .store(JobState::Completed.as_u8(), Ordering::SeqCst);
        tracing::info!("Verification of {} files completed", total);
        JobState::Completed
    }

    fn finish_cancelled<F>(&self, index: usize, emit: &mut F) -> JobState
    where
        F: FnMut(VerificationEvent),
    {
        self.state
            .store(JobState::Cancelled.as_u8(), Ordering::SeqCst);
        tracing::info!("Verification cancelled before file {} finished", index + 1);
        emit(VerificationEvent::JobCancelled);
        JobState::Cancelled
    }
}

// ============================================================================
// Job Handle
// ============================================================================

/// A running job's event stream and result
#[derive(Debug)]
pub struct JobHandle {
    events: Receiver<VerificationEvent>,
    worker: JoinHandle<JobReport>,
    state: Arc<AtomicU8>,
    cancel_flag: Arc<AtomicBool>,
}

impl JobHandle {
    /// Event stream; ends when the worker finishes
    pub fn events(&self) -> &Receiver<VerificationEvent> {
        &self.events
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Get a handle to cancel the job
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Current lifecycle state
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the worker has exited
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and take back the records
    pub fn wait(self) -> Result<JobReport> {
        self.worker.join().map_err(|_| Error::WorkerPanicked)
    }
}
