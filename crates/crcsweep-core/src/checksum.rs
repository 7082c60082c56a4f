//! CRC-32 values and streaming checksum computation
//!
//! This module provides:
//! - [`Crc32`], the checksum value with its canonical 8-digit uppercase text form
//! - [`ChecksumComputer`], which folds a file into a CRC-32 block by block
//! - Throttled percentage progress (one callback per distinct integer percent)
//! - Cooperative cancellation checked before every block read
//!
//! ## Example
//!
//! ```no_run
//! use crcsweep_core::checksum::ChecksumComputer;
//!
//! let computer = ChecksumComputer::new().block_size(64 * 1024);
//! let crc = computer.compute("episode.[A016D394].mkv", |pct| println!("{}%", pct))?;
//! println!("CRC32: {}", crc);
//! # Ok::<(), crcsweep_core::Error>(())
//! ```

use crate::config::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// Checksum Value
// ============================================================================

/// A CRC-32 (IEEE 802.3) checksum
///
/// Displays and serializes as exactly 8 uppercase hex digits, e.g. `A509AE4B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32(u32);

impl Crc32 {
    /// Checksum of the empty input
    pub const EMPTY: Crc32 = Crc32(0);

    /// Number of hex digits in the text form
    pub const HEX_LENGTH: usize = 8;

    /// Wrap a raw CRC value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Checksum of an in-memory buffer
    pub fn of(data: &[u8]) -> Self {
        Self(crc32fast::hash(data))
    }

    /// The raw CRC value
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Zero-padded uppercase hex form
    pub fn to_hex(self) -> String {
        format!("{:08X}", self.0)
    }
}

impl std::fmt::Display for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl std::str::FromStr for Crc32 {
    type Err = Error;

    /// Parse exactly 8 hex digits, either case
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != Self::HEX_LENGTH || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidChecksum(s.to_string()));
        }
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| Error::InvalidChecksum(s.to_string()))
    }
}

impl From<u32> for Crc32 {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Serialize for Crc32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Crc32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Checksum Computer
// ============================================================================

/// Streams readers and files into a CRC-32
#[derive(Debug, Clone)]
pub struct ChecksumComputer {
    block_size: usize,
    cancel_flag: Arc<AtomicBool>,
}

impl ChecksumComputer {
    /// Create a computer with the default block size
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set block size (clamped to valid range)
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        self
    }

    /// Observe an externally owned cancel flag instead of a private one
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    /// Get a handle to cancel the computation
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Configured block size
    pub fn get_block_size(&self) -> usize {
        self.block_size
    }

    /// Checksum the file at `path`
    ///
    /// The total used for progress is the file length at open time.
    pub fn compute<P, F>(&self, path: P, on_progress: F) -> Result<Crc32>
    where
        P: AsRef<Path>,
        F: FnMut(u8),
    {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let total_size = file.metadata()?.len();
        tracing::debug!("Checksumming {:?} ({} bytes)", path, total_size);
        self.compute_reader(&mut file, total_size, on_progress)
    }

    /// Checksum everything `reader` yields
    ///
    /// `on_progress` receives `bytes_read * 100 / total_size` after a block
    /// only when that integer differs from the previous call.
    pub fn compute_reader<R, F>(
        &self,
        reader: &mut R,
        total_size: u64,
        mut on_progress: F,
    ) -> Result<Crc32>
    where
        R: Read + ?Sized,
        F: FnMut(u8),
    {
        let mut hasher = crc32fast::Hasher::new();
        let mut buffer = vec![0u8; self.block_size];
        let mut bytes_read = 0u64;
        let mut last_percentage: Option<u8> = None;

        loop {
            if self.cancel_flag.load(Ordering::SeqCst) {
                return Err(Error::Cancelled);
            }

            let n = read_full(reader, &mut buffer)?;
            if n == 0 {
                break;
            }

            hasher.update(&buffer[..n]);
            bytes_read += n as u64;

            let percentage = percentage_of(bytes_read, total_size);
            if last_percentage != Some(percentage) {
                last_percentage = Some(percentage);
                on_progress(percentage);
            }
        }

        Ok(Crc32(hasher.finalize()))
    }
}

impl Default for ChecksumComputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum one file with the given block size
pub fn compute_file<P, F>(path: P, block_size: usize, on_progress: F) -> Result<Crc32>
where
    P: AsRef<Path>,
    F: FnMut(u8),
{
    ChecksumComputer::new()
        .block_size(block_size)
        .compute(path, on_progress)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Integer percentage, capped at 100 for files that grew while being read
fn percentage_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = u128::from(done) * 100 / u128::from(total);
    pct.min(100) as u8
}

/// Read as much as possible into buffer
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(total)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn sample_data() -> Vec<u8> {
        (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect()
    }

    // -------------------------------------------------------------------------
    // Crc32 tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_crc32_known_vector() {
        // Standard check value for the IEEE polynomial
        assert_eq!(Crc32::of(b"123456789").to_hex(), "CBF43926");
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::of(b""), Crc32::EMPTY);
        assert_eq!(Crc32::EMPTY.to_string(), "00000000");
    }

    #[test]
    fn test_crc32_zero_padded_uppercase() {
        assert_eq!(Crc32::new(0xAB).to_hex(), "000000AB");
        assert_eq!(Crc32::new(0xa509_ae4b).to_string(), "A509AE4B");
    }

    #[test]
    fn test_crc32_from_str() {
        assert_eq!("a016d394".parse::<Crc32>().unwrap(), Crc32::new(0xA016_D394));
        assert_eq!("A016D394".parse::<Crc32>().unwrap(), Crc32::new(0xA016_D394));
        assert!("A016D39".parse::<Crc32>().is_err());
        assert!("A016D3944".parse::<Crc32>().is_err());
        assert!("G016D394".parse::<Crc32>().is_err());
        assert!("+016D394".parse::<Crc32>().is_err());
    }

    #[test]
    fn test_crc32_serde() {
        let json = serde_json::to_string(&Crc32::new(0xA016_D394)).unwrap();
        assert_eq!(json, "\"A016D394\"");
        let back: Crc32 = serde_json::from_str("\"a016d394\"").unwrap();
        assert_eq!(back, Crc32::new(0xA016_D394));
        assert!(serde_json::from_str::<Crc32>("\"nothex!!\"").is_err());
    }

    // -------------------------------------------------------------------------
    // ChecksumComputer tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_block_size_does_not_change_result() {
        let data = sample_data();
        let expected = Crc32::of(&data);

        for block_size in [1, 7, 4096] {
            let computer = ChecksumComputer::new().block_size(block_size);
            let mut cursor = Cursor::new(&data);
            let crc = computer
                .compute_reader(&mut cursor, data.len() as u64, |_| {})
                .unwrap();
            assert_eq!(crc, expected, "block size {}", block_size);
        }
    }

    #[test]
    fn test_progress_emitted_once_per_percent() {
        let data = sample_data();
        let computer = ChecksumComputer::new().block_size(7);
        let mut seen = Vec::new();

        let mut cursor = Cursor::new(&data);
        computer
            .compute_reader(&mut cursor, data.len() as u64, |pct| seen.push(pct))
            .unwrap();

        // Strictly increasing means no duplicates were reported
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.len() <= 101);
    }

    #[test]
    fn test_progress_single_block() {
        let data = vec![0x55u8; 100];
        let computer = ChecksumComputer::new().block_size(4096);
        let mut seen = Vec::new();

        let mut cursor = Cursor::new(&data);
        computer
            .compute_reader(&mut cursor, 100, |pct| seen.push(pct))
            .unwrap();

        assert_eq!(seen, vec![100]);
    }

    #[test]
    fn test_empty_input_has_no_progress() {
        let computer = ChecksumComputer::new();
        let mut seen = Vec::new();
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let crc = computer
            .compute_reader(&mut cursor, 0, |pct| seen.push(pct))
            .unwrap();

        assert_eq!(crc, Crc32::EMPTY);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_cancelled_before_first_block() {
        let computer = ChecksumComputer::new();
        computer.cancel_handle().store(true, Ordering::SeqCst);

        let mut cursor = Cursor::new(vec![1u8; 64]);
        let result = computer.compute_reader(&mut cursor, 64, |_| {});
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_cancelled_between_blocks() {
        let data = vec![0xABu8; 1000];
        let computer = ChecksumComputer::new().block_size(10);
        let cancel = computer.cancel_handle();
        let mut calls = 0;

        let mut cursor = Cursor::new(&data);
        let result = computer.compute_reader(&mut cursor, 1000, |_| {
            calls += 1;
            if calls == 3 {
                cancel.store(true, Ordering::SeqCst);
            }
        });

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_shared_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let computer = ChecksumComputer::new().with_cancel_flag(Arc::clone(&flag));
        assert!(computer.cancel_handle().load(Ordering::SeqCst));
    }

    #[test]
    fn test_compute_file_is_idempotent() {
        let data = sample_data();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let first = compute_file(file.path(), 4096, |_| {}).unwrap();
        let second = compute_file(file.path(), 4096, |_| {}).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Crc32::of(&data));
    }

    #[test]
    fn test_compute_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let crc = compute_file(file.path(), 4096, |_| {}).unwrap();
        assert_eq!(crc.to_hex(), "00000000");
    }

    #[test]
    fn test_compute_missing_file() {
        let result = compute_file("/nonexistent/crcsweep/file.mkv", 4096, |_| {});
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(0, 0), 100);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(3, 3), 100);
        assert_eq!(percentage_of(5, 3), 100);
        assert_eq!(percentage_of(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_block_size_clamped() {
        assert_eq!(ChecksumComputer::new().block_size(0).get_block_size(), 1);
        assert_eq!(
            ChecksumComputer::new().get_block_size(),
            DEFAULT_BLOCK_SIZE
        );
    }
}
