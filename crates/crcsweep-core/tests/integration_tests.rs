//! Integration tests for crcsweep-core
//!
//! These tests drive the scan-then-verify pipeline over temporary
//! directories.

use crcsweep_core::{
    compute_file, extract, scan, Crc32, DirectoryScanner, Error, FileRecord, FileStatus, JobConfig,
    JobState, RecordSet, ScanConfig, Settings, SortOrder, VerificationEvent, VerificationJob,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

/// Content with a stable, non-trivial CRC
fn episode_bytes() -> Vec<u8> {
    (0..20_000u32).map(|i| (i * 7 % 256) as u8).collect()
}

/// Write `data` under a name that embeds its real CRC
fn write_tagged(dir: &Path, stem: &str, data: &[u8]) -> String {
    let name = format!("{}.[{}].mkv", stem, Crc32::of(data));
    fs::write(dir.join(&name), data).unwrap();
    name
}

fn completed_events(events: &[VerificationEvent]) -> Vec<(usize, FileStatus, Option<Crc32>)> {
    events
        .iter()
        .filter_map(|e| match e {
            VerificationEvent::FileCompleted {
                index,
                status,
                computed_checksum,
            } => Some((*index, *status, *computed_checksum)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_matching_file_end_to_end() {
    let dir = TempDir::new().unwrap();
    let data = episode_bytes();
    let expected = Crc32::of(&data);
    write_tagged(dir.path(), "show.S01E01", &data);

    let records = scan(dir.path(), [".mkv"], false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].declared_checksum(), Some(expected));

    let handle = VerificationJob::new().start(records).unwrap();
    let events: Vec<_> = handle.events().iter().collect();
    let report = handle.wait().unwrap();

    assert_eq!(
        completed_events(&events),
        vec![(0, FileStatus::Match, Some(expected))]
    );
    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.records[0].status(), FileStatus::Match);
}

#[test]
fn test_flipped_byte_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut data = episode_bytes();
    let declared = Crc32::of(&data);
    let name = format!("show.S01E01.[{}].mkv", declared);

    data[1234] ^= 0x01;
    fs::write(dir.path().join(&name), &data).unwrap();

    let records = scan(dir.path(), [".mkv"], false).unwrap();
    let handle = VerificationJob::new().start(records).unwrap();
    let events: Vec<_> = handle.events().iter().collect();
    handle.wait().unwrap();

    let completed = completed_events(&events);
    assert_eq!(completed.len(), 1);
    let (index, status, computed) = completed[0];
    assert_eq!(index, 0);
    assert_eq!(status, FileStatus::Mismatch);
    let computed = computed.unwrap();
    assert_ne!(computed, declared);
    assert_eq!(computed.to_hex().len(), 8);
}

#[test]
fn test_untagged_file_end_to_end() {
    let dir = TempDir::new().unwrap();
    let data = b"a movie without a checksum in its name".to_vec();
    fs::write(dir.path().join("movie.mp4"), &data).unwrap();

    let records = scan(dir.path(), [".mp4"], false).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].declared_checksum(), None);

    let handle = VerificationJob::new().start(records).unwrap();
    let events: Vec<_> = handle.events().iter().collect();
    handle.wait().unwrap();

    assert_eq!(
        completed_events(&events),
        vec![(0, FileStatus::NoReference, Some(Crc32::of(&data)))]
    );
}

#[test]
fn test_known_release_name() {
    let name = "H.Poirot.S01E01.La.cuisine.mysterieuse.de.Clapham.MULTI.1080p.x264 [A016D394].mkv";
    assert_eq!(extract(name).map(|c| c.to_hex()), Some("A016D394".to_string()));
}

// ============================================================================
// Checksum properties
// ============================================================================

#[test]
fn test_block_size_independence_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.mkv");
    fs::write(&path, episode_bytes()).unwrap();

    let results: Vec<_> = [1, 7, 4096]
        .iter()
        .map(|&bs| compute_file(&path, bs, |_| {}).unwrap())
        .collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0], Crc32::of(&episode_bytes()));
}

#[test]
fn test_empty_file_checksum() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty [00000000].mkv");
    fs::write(&path, b"").unwrap();

    assert_eq!(compute_file(&path, 4096, |_| {}).unwrap(), Crc32::EMPTY);

    let records = scan(dir.path(), [".mkv"], true).unwrap();
    let report = VerificationJob::new().start(records).unwrap().wait().unwrap();
    assert_eq!(report.records[0].status(), FileStatus::Match);
}

// ============================================================================
// Job behavior
// ============================================================================

#[test]
fn test_events_are_ordered_per_file() {
    let dir = TempDir::new().unwrap();
    for i in 0..5u8 {
        let data = vec![i; 50_000];
        write_tagged(dir.path(), &format!("ep{}", i), &data);
    }

    let records = scan(dir.path(), [".mkv"], false).unwrap();
    let job = VerificationJob::with_config(JobConfig::new().block_size(1024));
    let handle = job.start(records).unwrap();
    let events: Vec<_> = handle.events().iter().collect();
    handle.wait().unwrap();

    let mut current = 0usize;
    let mut overall_last = 0u8;
    for event in &events {
        match event {
            VerificationEvent::FileProgress { index, .. } => assert_eq!(*index, current),
            VerificationEvent::FileCompleted { index, status, .. } => {
                assert_eq!(*index, current);
                assert_eq!(*status, FileStatus::Match);
            }
            VerificationEvent::OverallProgress { percentage } => {
                assert!(*percentage > overall_last);
                overall_last = *percentage;
                current += 1;
            }
            VerificationEvent::JobCancelled => panic!("job was not cancelled"),
        }
    }
    assert_eq!(current, 5);
    assert_eq!(overall_last, 100);
}

#[test]
fn test_cancel_from_consumer_thread() {
    let dir = TempDir::new().unwrap();
    for i in 0..20u8 {
        write_tagged(dir.path(), &format!("ep{:02}", i), &vec![i; 200_000]);
    }

    let records = scan(dir.path(), [".mkv"], false).unwrap();
    let job = VerificationJob::with_config(JobConfig::new().block_size(1));
    let handle = job.start(records).unwrap();

    let mut events = Vec::new();
    for event in handle.events() {
        let first_done = matches!(event, VerificationEvent::FileCompleted { index: 0, .. });
        events.push(event);
        if first_done {
            handle.cancel();
        }
    }
    let report = handle.wait().unwrap();

    // Whatever the timing, every record is either reported or untouched
    let completed = completed_events(&events);
    for (index, record) in report.records.iter().enumerate() {
        match completed.iter().find(|(i, _, _)| *i == index) {
            Some((_, status, computed)) => {
                assert_eq!(record.status(), *status);
                assert_eq!(record.computed_checksum(), *computed);
            }
            None => assert_eq!(record.status(), FileStatus::Unverified),
        }
    }

    if report.state == JobState::Cancelled {
        assert_eq!(events.last(), Some(&VerificationEvent::JobCancelled));
        assert!(report.unverified() > 0);
    }
    assert_eq!(report.records[0].status(), FileStatus::Match);
}

#[test]
fn test_cancel_before_start_runs_nothing() {
    let dir = TempDir::new().unwrap();
    write_tagged(dir.path(), "a", b"alpha");
    write_tagged(dir.path(), "b", b"bravo");

    let records = scan(dir.path(), [".mkv"], false).unwrap();
    let job = VerificationJob::new();
    job.cancel();
    let handle = job.start(records).unwrap();
    let events: Vec<_> = handle.events().iter().collect();
    let report = handle.wait().unwrap();

    assert_eq!(events, vec![VerificationEvent::JobCancelled]);
    assert_eq!(report.state, JobState::Cancelled);
    assert_eq!(report.unverified(), 2);
}

#[test]
fn test_cancel_handle_is_shared() {
    let job = VerificationJob::new();
    job.cancel_handle().store(true, Ordering::SeqCst);
    let mut records = vec![FileRecord::new("/nonexistent/a.mkv", 0)];
    assert_eq!(job.run(&mut records, |_| {}).unwrap(), JobState::Cancelled);
}

#[test]
fn test_misuse_is_rejected() {
    let job = VerificationJob::new();
    assert!(matches!(job.start(Vec::new()), Err(Error::EmptyJob)));

    let handle = job
        .start(vec![FileRecord::new("/nonexistent/a.mkv", 0)])
        .unwrap();
    let second = job.start(vec![FileRecord::new("/nonexistent/b.mkv", 0)]);
    assert!(matches!(second, Err(Error::JobAlreadyStarted)));

    let report = handle.wait().unwrap();
    assert_eq!(report.errors(), 1);
}

// ============================================================================
// Scanning
// ============================================================================

#[test]
fn test_scan_missing_root() {
    let result = scan("/nonexistent/crcsweep", [".mkv"], false);
    assert!(matches!(result, Err(ref e) if e.is_not_found()));
}

#[test]
fn test_append_mode_across_roots() {
    let season1 = TempDir::new().unwrap();
    let season2 = TempDir::new().unwrap();
    write_tagged(season1.path(), "s01e01", b"one");
    write_tagged(season2.path(), "s02e01", b"two");

    let mut scanner = DirectoryScanner::with_config(ScanConfig::new().suffixes([".mkv"]));
    let mut set = RecordSet::new();
    scanner.scan_into(season1.path(), &mut set).unwrap();
    scanner.scan_into(season2.path(), &mut set).unwrap();
    scanner.scan_into(season1.path(), &mut set).unwrap();

    assert_eq!(set.len(), 2);
    assert!(set.records()[0].name().starts_with("s01e01"));
    assert!(set.records()[1].name().starts_with("s02e01"));
}

#[test]
fn test_scan_with_settings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ep10.mkv"), b"x").unwrap();
    fs::write(dir.path().join("ep9.mkv"), b"x").unwrap();
    fs::write(dir.path().join("ep9.avi"), b"x").unwrap();

    let mut settings = Settings::default();
    settings.scan.suffixes = vec![".mkv".to_string()];
    settings.scan.sort = SortOrder::Natural;

    let records = DirectoryScanner::with_config(settings.scan_config())
        .scan(dir.path())
        .unwrap();
    let names: Vec<_> = records.iter().map(FileRecord::name).collect();
    assert_eq!(names, vec!["ep9.mkv", "ep10.mkv"]);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.mkv"), b"x").unwrap();
    fs::write(dir.path().join("visible.mkv"), b"x").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores directory permissions
    let readable = fs::read_dir(&locked).is_ok();

    let mut set = RecordSet::new();
    let summary = DirectoryScanner::new().scan_into(dir.path(), &mut set).unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if !readable {
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].name(), "visible.mkv");
        assert_eq!(summary.warnings.len(), 1);
    }
}
