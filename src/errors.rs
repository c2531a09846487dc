//! Error Types
//!
//! The failure taxonomy for one load attempt. Every variant is local to a
//! single load call: the cache layer converts any of these into "no
//! resource" for its caller and never aborts the process on a load failure.

use thiserror::Error;

use crate::name::ResourceName;

/// The main error type for the Kiln resource pipeline.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Neither a compiled artifact nor a source descriptor exists.
    #[error("resource not found: {0}")]
    NotFound(ResourceName),

    /// A compiled artifact (or freshly compiled blob) could not be parsed.
    #[error("failed to parse {kind} '{name}': {reason}")]
    Parse {
        /// Kind label, e.g. `"material"`.
        kind: &'static str,
        /// The resource that failed to parse.
        name: ResourceName,
        /// Parser-provided detail.
        reason: String,
    },

    /// The compiler ran but did not produce a blob.
    #[error("compilation of {kind} '{name}' failed: {reason}")]
    CompileFailed {
        kind: &'static str,
        name: ResourceName,
        reason: String,
    },

    /// No compiler instance could be acquired.
    #[error("compiler unavailable while loading '{0}'")]
    CompilerUnavailable(ResourceName),

    /// The virtual file system refused to open a path that stat said exists.
    #[error("failed to open '{0}'")]
    OpenFailed(String),

    /// Underlying I/O failure while reading a stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LoadError>;
