//! Out-of-process compiler seam.
//!
//! The actual compiler is an external executable; this module owns only its
//! lifecycle. [`RemoteCompiler`] is one live instance, [`CompilerConnector`]
//! knows how to bring one up, and [`pool::CompilerPool`] keeps a single warm
//! primary around so the common one-asset-recompile path skips spawn
//! latency.

use crate::errors::Result;
use crate::name::ResourceName;

pub mod pool;
pub mod process;

pub use pool::{CompilerLease, CompilerPool};
pub use process::ProcessCompilerConnector;

/// One live compiler instance.
///
/// Dropping the instance must release whatever backs it (for a subprocess,
/// kill and reap the child).
pub trait RemoteCompiler: Send {
    /// Compiles `name` as the given kind and returns the artifact blob.
    fn compile(&mut self, kind: &'static str, name: &ResourceName) -> Result<Vec<u8>>;
}

/// Factory for [`RemoteCompiler`] instances.
///
/// `None` from `connect` means no compiler is available right now; callers
/// degrade rather than fail hard.
pub trait CompilerConnector: Send + Sync {
    fn connect(&self) -> Option<Box<dyn RemoteCompiler>>;
}

/// Connector for deployments without a compiler; every acquire degrades.
pub struct NullCompilerConnector;

impl CompilerConnector for NullCompilerConnector {
    fn connect(&self) -> Option<Box<dyn RemoteCompiler>> {
        None
    }
}
