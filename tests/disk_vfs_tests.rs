//! Disk file system tests.
//!
//! Tests for:
//! - Atomic write-back: per-target temp paths, no cross-kind clobbering
//! - No temp residue after replacement
//! - Change watcher: events for files that appear after startup

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kiln::vfs::{ChangeKind, DiskFileSystem, VirtualFileSystem};

/// Fresh scratch directory per test, removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(tag: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("kiln_{tag}_{}_{nanos}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// Atomic write-back
// ============================================================================

#[test]
fn concurrent_write_backs_of_sibling_kinds_do_not_clobber() {
    use std::thread;

    let scratch = ScratchDir::new("writeback");
    let vfs = Arc::new(DiskFileSystem::new(&scratch.0));

    // One asset name, two kinds: the temp paths must be distinct per
    // target or one rename can publish the other kind's bytes.
    let writers: Vec<_> = [("wood.mtl", b"MATERIAL"), ("wood.staticmesh", b"MESH____")]
        .into_iter()
        .map(|(path, bytes)| {
            let vfs = Arc::clone(&vfs);
            thread::spawn(move || {
                for _ in 0..50 {
                    assert!(vfs.put_contents(path, bytes, false, true));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(fs::read(scratch.0.join("wood.mtl")).unwrap(), b"MATERIAL");
    assert_eq!(fs::read(scratch.0.join("wood.staticmesh")).unwrap(), b"MESH____");
}

#[test]
fn atomic_write_back_leaves_no_temp_residue() {
    let scratch = ScratchDir::new("residue");
    let vfs = DiskFileSystem::new(&scratch.0);

    assert!(vfs.put_contents("props/wood.mtl", b"BLOB", true, true));
    assert!(vfs.stat("props/wood.mtl").is_some());

    let leftovers: Vec<_> = fs::read_dir(scratch.0.join("props"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".kiln_tmp"))
        .collect();
    assert!(leftovers.is_empty(), "stray temp files: {leftovers:?}");
}

// ============================================================================
// Change watcher
// ============================================================================

#[test]
fn watcher_reports_files_added_after_startup() {
    let scratch = ScratchDir::new("watch");
    let vfs = DiskFileSystem::new(&scratch.0).with_poll_interval(Duration::from_millis(20));
    let notifier = vfs.create_change_notifier().unwrap();

    // Let the watcher take its baseline snapshot first.
    std::thread::sleep(Duration::from_millis(200));
    fs::write(scratch.0.join("late.mtl.xml"), b"<mtl/>").unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    let mut seen_added = false;
    while std::time::Instant::now() < deadline && !seen_added {
        seen_added = notifier
            .drain()
            .iter()
            .any(|e| e.kind == ChangeKind::Added && e.path == "late.mtl.xml");
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(seen_added, "Added event for the new source never arrived");
}
