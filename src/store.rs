//! Name-keyed, reference-counted resource store.
//!
//! One store per kind. A table entry is either a live handle (the store's
//! own hold) or a negative sentinel recording "this name failed to load",
//! which suppresses repeated I/O for the same missing asset.
//!
//! Locking discipline: one read-write lock per store. Shared mode for
//! lookups, exclusive mode only around table mutation, never around loader
//! I/O. Misses load outside any lock and re-check under the exclusive lock,
//! so racing threads may both build an object but only the first insert
//! wins; the loser's object drops without ever being published.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::kinds::ResourceKind;
use crate::name::ResourceName;
use crate::resource::ResourceHandle;

/// `None` is the known-missing sentinel.
type Entry<K> = Option<ResourceHandle<K>>;

pub struct TypedResourceStore<K: ResourceKind> {
    entries: RwLock<FxHashMap<ResourceName, Entry<K>>>,
}

impl<K: ResourceKind> Default for TypedResourceStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> TypedResourceStore<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get-or-load-and-insert.
    ///
    /// The loader runs with no lock held and returns the built resource
    /// carrying its resolved name; the entry is inserted under that name on
    /// success, or under the requested name as a negative entry on failure.
    pub fn get(
        &self,
        name: &ResourceName,
        load: impl FnOnce(&ResourceName) -> Option<ResourceHandle<K>>,
    ) -> Option<ResourceHandle<K>> {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(name) {
                return entry.clone();
            }
        }

        let built = load(name);

        let mut entries = self.entries.write();
        // Double-check: another thread may have finished first. Its entry
        // wins and `built` is released on return, never double-inserted.
        if let Some(entry) = entries.get(name) {
            return entry.clone();
        }
        match built {
            Some(resource) => {
                let resolved = resource.name().clone();
                if let Some(entry) = entries.get(&resolved) {
                    return entry.clone();
                }
                entries.insert(resolved, Some(resource.clone()));
                Some(resource)
            }
            None => {
                entries.insert(name.clone(), None);
                None
            }
        }
    }

    /// Lookup-or-bypass.
    ///
    /// A cached entry (positive or negative) is returned as-is; a true miss
    /// loads directly and hands the caller the sole reference without
    /// inserting anything.
    pub fn uncached_get(
        &self,
        name: &ResourceName,
        load: impl FnOnce(&ResourceName) -> Option<ResourceHandle<K>>,
    ) -> Option<ResourceHandle<K>> {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(name) {
                return entry.clone();
            }
        }
        load(name)
    }

    /// Whether the table currently has an entry (even a negative one).
    #[must_use]
    pub fn contains(&self, name: &ResourceName) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Drops every entry whose only remaining holder is the store itself,
    /// along with all negative entries. O(n); intended for idle or
    /// transition points, not per-frame.
    ///
    /// Returns the number of entries removed.
    pub fn compact(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        // No new external handle can appear while the write lock is held,
        // so a strong count of one really is the store's own hold.
        entries.retain(|_, entry| match entry {
            Some(resource) => std::sync::Arc::strong_count(resource) > 1,
            None => false,
        });
        before - entries.len()
    }

    /// Unconditionally drops every store-held reference and clears the
    /// table. Required before the store is torn down; entries still held
    /// elsewhere stay alive through their external handles.
    pub fn release_all(&self) {
        self.entries.write().clear();
    }

    /// Live handles to every cached resource, for device fan-out.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ResourceHandle<K>> {
        self.entries.read().values().flatten().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K: ResourceKind> Drop for TypedResourceStore<K> {
    fn drop(&mut self) {
        let entries = self.entries.get_mut();
        if !entries.is_empty() {
            log::warn!(
                "{} store dropped with {} live entries; release_all() was skipped",
                K::LABEL,
                entries.len()
            );
        }
    }
}
