//! Virtual file system seam.
//!
//! The pipeline never touches `std::fs` directly; everything goes through
//! [`VirtualFileSystem`] so that packaged archives, network mounts and test
//! doubles can sit behind the same four primitives. [`DiskFileSystem`] is
//! the stock implementation; [`MemoryFileSystem`] backs tests and tools.

use std::io::Read;
use std::time::SystemTime;

pub mod disk;
pub mod memory;

pub use disk::DiskFileSystem;
pub use memory::MemoryFileSystem;

/// Result of a successful stat.
#[derive(Clone, Debug)]
pub struct FileStat {
    /// Last modification time.
    pub mtime: SystemTime,
    /// The path as the file system itself spells it. On case-insensitive
    /// mounts this may differ from the queried path.
    pub path: String,
}

/// What happened to a watched path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
    RenamedFrom,
    RenamedTo,
}

/// One file-change notification.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: String,
}

/// Receiving end of a change-notification stream.
///
/// Dropping the notifier disconnects the producer; a disk watcher thread
/// exits on its next send attempt.
pub struct ChangeNotifier {
    rx: flume::Receiver<ChangeEvent>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new(rx: flume::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Drains every event queued since the last poll, without blocking.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}

/// Path-based stat/open/write plus change notifications.
///
/// All paths are logical, forward-slash separated, relative to the mount.
pub trait VirtualFileSystem: Send + Sync {
    /// Stats a path. `None` means the file does not exist.
    fn stat(&self, path: &str) -> Option<FileStat>;

    /// Opens a path for reading. `None` means it could not be opened.
    fn open(&self, path: &str) -> Option<Box<dyn Read + Send>>;

    /// Writes a whole file, optionally creating parent directories and
    /// replacing atomically. Returns false on failure.
    fn put_contents(
        &self,
        path: &str,
        bytes: &[u8],
        create_dirs: bool,
        atomic_replace: bool,
    ) -> bool;

    /// Creates a change notifier for the whole mount, if supported.
    fn create_change_notifier(&self) -> Option<ChangeNotifier>;
}
