//! Typed store tests.
//!
//! Tests for:
//! - Get: load-once idempotence, case-insensitive coherency
//! - Negative caching: failed lookups are not retried
//! - UncachedGet: bypass on miss, cached-entry reuse on hit
//! - Compact: sole-holder eviction, destructor-once, survivor retention
//! - Concurrency: racing first access never double-publishes

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kiln::errors::Result;
use kiln::kinds::{ParsePayload, ResourceKind};
use kiln::name::ResourceName;
use kiln::resource::{DeviceResources, Resource, ResourceHandle};
use kiln::store::TypedResourceStore;

// ============================================================================
// Test kind
// ============================================================================

#[derive(Default)]
struct ProbePayload {
    drops: Option<Arc<AtomicUsize>>,
}

impl ParsePayload for ProbePayload {
    fn parse_from(&mut self, _name: &ResourceName, _stream: &mut dyn Read) -> Result<()> {
        Ok(())
    }
}

impl DeviceResources for ProbePayload {}

impl Drop for ProbePayload {
    fn drop(&mut self) {
        if let Some(drops) = &self.drops {
            drops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct Probe;

impl ResourceKind for Probe {
    const LABEL: &'static str = "probe";
    const COMPILED_EXT: &'static str = ".probe";
    const SOURCE_EXT: &'static str = ".probe.xml";
    type Payload = ProbePayload;
}

fn build(name: &ResourceName, drops: Option<Arc<AtomicUsize>>) -> ResourceHandle<Probe> {
    Arc::new(Resource::new(name.clone(), ProbePayload { drops }))
}

// ============================================================================
// Get
// ============================================================================

#[test]
fn get_is_idempotent() {
    let store = TypedResourceStore::<Probe>::new();
    let loads = AtomicUsize::new(0);
    let name = ResourceName::new("props/crate");

    let first = store
        .get(&name, |n| {
            loads.fetch_add(1, Ordering::SeqCst);
            Some(build(n, None))
        })
        .unwrap();
    let second = store
        .get(&name, |n| {
            loads.fetch_add(1, Ordering::SeqCst);
            Some(build(n, None))
        })
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn get_is_case_insensitive() {
    let store = TypedResourceStore::<Probe>::new();
    let loads = AtomicUsize::new(0);

    let lower = ResourceName::new("props/crate");
    let upper = ResourceName::new("Props/Crate");

    let first = store
        .get(&lower, |n| {
            loads.fetch_add(1, Ordering::SeqCst);
            Some(build(n, None))
        })
        .unwrap();
    let second = store
        .get(&upper, |n| {
            loads.fetch_add(1, Ordering::SeqCst);
            Some(build(n, None))
        })
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second), "folded names must share one entry");
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Negative caching
// ============================================================================

#[test]
fn failed_load_is_not_retried() {
    let store = TypedResourceStore::<Probe>::new();
    let loads = AtomicUsize::new(0);
    let name = ResourceName::new("missing");

    for _ in 0..2 {
        let result = store.get(&name, |_| {
            loads.fetch_add(1, Ordering::SeqCst);
            None
        });
        assert!(result.is_none());
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1, "negative entry must absorb the retry");
}

// ============================================================================
// UncachedGet
// ============================================================================

#[test]
fn uncached_get_bypasses_the_table() {
    let store = TypedResourceStore::<Probe>::new();
    let loads = AtomicUsize::new(0);
    let name = ResourceName::new("baz");

    let a = store.uncached_get(&name, |n| {
        loads.fetch_add(1, Ordering::SeqCst);
        Some(build(n, None))
    });
    let b = store.uncached_get(&name, |n| {
        loads.fetch_add(1, Ordering::SeqCst);
        Some(build(n, None))
    });
    assert!(a.is_some() && b.is_some());
    assert_eq!(loads.load(Ordering::SeqCst), 2, "each bypass load is independent");

    // Nothing was inserted, so a plain get still misses.
    store.get(&name, |n| {
        loads.fetch_add(1, Ordering::SeqCst);
        Some(build(n, None))
    });
    assert_eq!(loads.load(Ordering::SeqCst), 3);
}

#[test]
fn uncached_get_returns_an_existing_entry() {
    let store = TypedResourceStore::<Probe>::new();
    let loads = AtomicUsize::new(0);
    let name = ResourceName::new("cached");

    let cached = store
        .get(&name, |n| {
            loads.fetch_add(1, Ordering::SeqCst);
            Some(build(n, None))
        })
        .unwrap();
    let again = store
        .uncached_get(&name, |n| {
            loads.fetch_add(1, Ordering::SeqCst);
            Some(build(n, None))
        })
        .unwrap();

    assert!(Arc::ptr_eq(&cached, &again));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Compact / ReleaseAll
// ============================================================================

#[test]
fn compact_frees_sole_holder_entries_once() {
    let store = TypedResourceStore::<Probe>::new();
    let drops = Arc::new(AtomicUsize::new(0));
    let name = ResourceName::new("transient");

    let handle = store
        .get(&name, |n| Some(build(n, Some(Arc::clone(&drops)))))
        .unwrap();

    // Still externally referenced: must survive.
    assert_eq!(store.compact(), 0);
    assert_eq!(store.len(), 1);

    drop(handle);
    assert_eq!(store.compact(), 1);
    assert_eq!(store.len(), 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1, "destructor must run exactly once");
}

#[test]
fn compact_evicts_negative_entries() {
    let store = TypedResourceStore::<Probe>::new();
    let name = ResourceName::new("missing");
    store.get(&name, |_| None);
    assert!(store.contains(&name));

    assert_eq!(store.compact(), 1);
    assert!(!store.contains(&name), "a later-created asset becomes loadable again");
}

#[test]
fn release_all_clears_the_table() {
    let store = TypedResourceStore::<Probe>::new();
    let keep = store
        .get(&ResourceName::new("a"), |n| Some(build(n, None)))
        .unwrap();
    store.get(&ResourceName::new("b"), |n| Some(build(n, None)));

    store.release_all();
    assert!(store.is_empty());
    // Externally held entries stay alive through their own handle.
    assert_eq!(keep.name().as_str(), "a");
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn racing_first_access_publishes_one_entry() {
    use std::sync::Barrier;
    use std::thread;

    const THREADS: usize = 8;

    let store = Arc::new(TypedResourceStore::<Probe>::new());
    let loads = Arc::new(AtomicUsize::new(0));
    let drops = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let loads = Arc::clone(&loads);
            let drops = Arc::clone(&drops);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let name = ResourceName::new("bar");
                store
                    .get(&name, |n| {
                        loads.fetch_add(1, Ordering::SeqCst);
                        // Widen the race window.
                        thread::sleep(std::time::Duration::from_millis(5));
                        Some(build(n, Some(Arc::clone(&drops))))
                    })
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Everyone got the single published object.
    let winner = &results[0];
    assert!(results.iter().all(|r| Arc::ptr_eq(winner, r)));
    assert_eq!(store.len(), 1);

    // Losing builds were released, never leaked: after all references drop,
    // every constructed payload has been destroyed exactly once.
    let built = loads.load(Ordering::SeqCst);
    assert!(built >= 1);
    drop(results);
    store.compact();
    assert_eq!(drops.load(Ordering::SeqCst), built);
}
