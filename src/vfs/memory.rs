//! In-memory file system.
//!
//! Backs the integration tests and is handy for tools that want to feed the
//! pipeline synthetic content. Modification times are plain seconds so
//! freshness cases can be staged exactly.

use std::io::{Cursor, Read};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{ChangeEvent, ChangeNotifier, FileStat, VirtualFileSystem};

struct MemFile {
    bytes: Vec<u8>,
    mtime: SystemTime,
}

/// Map-backed [`VirtualFileSystem`] with manual change-event injection.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<FxHashMap<String, MemFile>>,
    events: Mutex<Vec<flume::Sender<ChangeEvent>>>,
}

impl MemoryFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a file with an mtime of `epoch + secs`.
    pub fn put_file(&self, path: &str, bytes: impl Into<Vec<u8>>, mtime_secs: u64) {
        self.files.lock().insert(
            path.to_string(),
            MemFile {
                bytes: bytes.into(),
                mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs),
            },
        );
    }

    pub fn remove_file(&self, path: &str) {
        self.files.lock().remove(path);
    }

    /// Raw contents, if present. Used by tests to observe write-backs.
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).map(|f| f.bytes.clone())
    }

    /// Pushes an event to every live notifier.
    pub fn emit(&self, event: ChangeEvent) {
        self.events
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn stat(&self, path: &str) -> Option<FileStat> {
        let files = self.files.lock();
        let file = files.get(path)?;
        Some(FileStat {
            mtime: file.mtime,
            path: path.to_string(),
        })
    }

    fn open(&self, path: &str) -> Option<Box<dyn Read + Send>> {
        let files = self.files.lock();
        let file = files.get(path)?;
        Some(Box::new(Cursor::new(file.bytes.clone())))
    }

    fn put_contents(
        &self,
        path: &str,
        bytes: &[u8],
        _create_dirs: bool,
        _atomic_replace: bool,
    ) -> bool {
        self.files.lock().insert(
            path.to_string(),
            MemFile {
                bytes: bytes.to_vec(),
                mtime: SystemTime::now(),
            },
        );
        true
    }

    fn create_change_notifier(&self) -> Option<ChangeNotifier> {
        let (tx, rx) = flume::unbounded();
        self.events.lock().push(tx);
        Some(ChangeNotifier::new(rx))
    }
}
