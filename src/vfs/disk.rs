//! Local-disk implementation of the virtual file system.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashMap;

use super::{ChangeEvent, ChangeKind, ChangeNotifier, FileStat, VirtualFileSystem};

/// `std::fs`-backed file system rooted at a content directory.
pub struct DiskFileSystem {
    root: PathBuf,
    /// Snapshot interval of the polling change watcher.
    poll_interval: Duration,
}

impl DiskFileSystem {
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            poll_interval: Duration::from_millis(500),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Recursive mtime snapshot of the mount, keyed by logical path.
    fn snapshot(root: &Path) -> FxHashMap<String, SystemTime> {
        let mut out = FxHashMap::default();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let Ok(meta) = entry.metadata() else {
                    continue;
                };
                if meta.is_dir() {
                    stack.push(path);
                } else if let Ok(mtime) = meta.modified()
                    && let Ok(rel) = path.strip_prefix(root)
                {
                    out.insert(rel.to_string_lossy().replace('\\', "/"), mtime);
                }
            }
        }
        out
    }
}

impl VirtualFileSystem for DiskFileSystem {
    fn stat(&self, path: &str) -> Option<FileStat> {
        let meta = fs::metadata(self.resolve(path)).ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(FileStat {
            mtime: meta.modified().ok()?,
            path: path.to_string(),
        })
    }

    fn open(&self, path: &str) -> Option<Box<dyn Read + Send>> {
        let file = fs::File::open(self.resolve(path)).ok()?;
        Some(Box::new(file))
    }

    fn put_contents(
        &self,
        path: &str,
        bytes: &[u8],
        create_dirs: bool,
        atomic_replace: bool,
    ) -> bool {
        let target = self.resolve(path);
        if create_dirs
            && let Some(parent) = target.parent()
            && fs::create_dir_all(parent).is_err()
        {
            return false;
        }
        if atomic_replace {
            // Appended suffix, not `with_extension`: one asset name may
            // exist as several kinds ("wood.mtl", "wood.staticmesh"), and
            // concurrent write-backs must not share a temp path.
            let tmp = self.resolve(&format!("{path}.kiln_tmp"));
            fs::write(&tmp, bytes).is_ok() && fs::rename(&tmp, &target).is_ok()
        } else {
            fs::write(&target, bytes).is_ok()
        }
    }

    fn create_change_notifier(&self) -> Option<ChangeNotifier> {
        let (tx, rx) = flume::unbounded();
        let root = self.root.clone();
        let interval = self.poll_interval;
        std::thread::Builder::new()
            .name("kiln-fs-watch".into())
            .spawn(move || watch_loop(&root, interval, &tx))
            .ok()?;
        Some(ChangeNotifier::new(rx))
    }
}

/// Diffs successive snapshots until the receiver goes away.
fn watch_loop(root: &Path, interval: Duration, tx: &flume::Sender<ChangeEvent>) {
    let mut previous = DiskFileSystem::snapshot(root);
    loop {
        std::thread::sleep(interval);
        // A quiet mount produces no sends, so the dropped-receiver check
        // cannot be left to the send path alone.
        if tx.is_disconnected() {
            return;
        }
        let current = DiskFileSystem::snapshot(root);
        for (path, mtime) in &current {
            let event = match previous.get(path) {
                None => Some(ChangeKind::Added),
                Some(old) if old != mtime => Some(ChangeKind::Modified),
                Some(_) => None,
            };
            if let Some(kind) = event
                && tx
                    .send(ChangeEvent {
                        kind,
                        path: path.clone(),
                    })
                    .is_err()
            {
                return;
            }
        }
        for path in previous.keys() {
            if !current.contains_key(path)
                && tx
                    .send(ChangeEvent {
                        kind: ChangeKind::Removed,
                        path: path.clone(),
                    })
                    .is_err()
            {
                return;
            }
        }
        previous = current;
    }
}
