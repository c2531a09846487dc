//! Compiler instance pool.
//!
//! One long-lived primary instance plus ad hoc extras. The primary serves
//! at most one caller at a time; concurrent overflow spawns independent
//! extras instead of queueing behind it. An idle primary is torn down by
//! the periodic maintenance tick once the configured delay has elapsed.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{CompilerConnector, RemoteCompiler};
use crate::errors::Result;
use crate::name::ResourceName;

struct PoolState {
    /// Warm primary, present only while idle.
    primary: Option<Box<dyn RemoteCompiler>>,
    /// The primary is currently checked out.
    primary_out: bool,
    /// When the primary last went idle.
    idle_since: Option<Instant>,
}

/// Usage- and idle-tracked pool of compiler instances.
pub struct CompilerPool {
    connector: Box<dyn CompilerConnector>,
    idle_release: Duration,
    state: Mutex<PoolState>,
}

/// A checked-out compiler. Must be handed back via [`CompilerPool::release`].
pub struct CompilerLease {
    compiler: Box<dyn RemoteCompiler>,
    primary: bool,
}

impl CompilerLease {
    /// Forwards a compile request to the leased instance.
    pub fn compile(&mut self, kind: &'static str, name: &ResourceName) -> Result<Vec<u8>> {
        self.compiler.compile(kind, name)
    }
}

impl CompilerPool {
    #[must_use]
    pub fn new(connector: Box<dyn CompilerConnector>, idle_release: Duration) -> Self {
        Self {
            connector,
            idle_release,
            state: Mutex::new(PoolState {
                primary: None,
                primary_out: false,
                idle_since: None,
            }),
        }
    }

    /// Acquires a compiler, reusing the warm primary when it is idle.
    ///
    /// Returns `None` when connecting fails; the caller proceeds without
    /// compilation. The pool mutex is never held across the connect itself.
    pub fn acquire(&self) -> Option<CompilerLease> {
        let reuse_primary = {
            let mut state = self.state.lock();
            if let Some(compiler) = state.primary.take() {
                state.primary_out = true;
                state.idle_since = None;
                return Some(CompilerLease {
                    compiler,
                    primary: true,
                });
            }
            !state.primary_out
        };

        let compiler = self.connector.connect()?;
        let mut state = self.state.lock();
        // Another thread may have claimed primary status while we were
        // connecting; re-check under the lock.
        if reuse_primary && !state.primary_out && state.primary.is_none() {
            state.primary_out = true;
            Some(CompilerLease {
                compiler,
                primary: true,
            })
        } else {
            Some(CompilerLease {
                compiler,
                primary: false,
            })
        }
    }

    /// Returns a lease. The primary re-idles (or dies immediately at a zero
    /// delay); extras are destroyed unconditionally.
    pub fn release(&self, lease: CompilerLease) {
        if lease.primary {
            let mut state = self.state.lock();
            state.primary_out = false;
            if self.idle_release.is_zero() {
                log::debug!("compiler pool: destroying primary (zero idle delay)");
            } else {
                state.primary = Some(lease.compiler);
                state.idle_since = Some(Instant::now());
            }
        }
        // Extras (and a zero-delay primary) drop here, tearing down the
        // backing instance.
    }

    /// Maintenance tick: reaps the primary once it has idled long enough.
    pub fn tick(&self) {
        if self.idle_release.is_zero() {
            return;
        }
        let expired = {
            let mut state = self.state.lock();
            match state.idle_since {
                Some(since) if since.elapsed() >= self.idle_release => {
                    state.idle_since = None;
                    state.primary.take()
                }
                _ => None,
            }
        };
        if expired.is_some() {
            log::debug!("compiler pool: releasing idle primary");
        }
    }

    /// Whether a warm primary is currently parked in the pool.
    #[must_use]
    pub fn has_warm_primary(&self) -> bool {
        self.state.lock().primary.is_some()
    }
}
