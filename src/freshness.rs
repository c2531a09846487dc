//! Staleness policy for compiled artifacts.
//!
//! Given a logical name and a kind's extension pair, decides whether a
//! compiled artifact can be served as-is, whether the authoring source
//! warrants a recompile, and under which name the result should be cached.

use crate::errors::{LoadError, Result};
use crate::name::ResourceName;
use crate::vfs::VirtualFileSystem;

/// Outcome of a freshness resolution.
#[derive(Clone, Debug)]
pub struct Freshness {
    /// A compiled artifact exists on disk.
    pub has_compiled: bool,
    /// A source descriptor exists (only probed when compilation is enabled).
    pub has_source: bool,
    /// The source is strictly newer than the compiled artifact, or no
    /// compiled artifact exists at all.
    pub should_compile: bool,
    /// Name to cache under, normalized to the file that won the stat.
    pub resolved: ResourceName,
}

/// Resolves the freshness of `name` for one kind.
///
/// Tie-break: compiled mtime >= source mtime counts as fresh. This favors
/// the compiled artifact and tolerates coarse file system timestamp
/// granularity. With `compile_enabled` false the source is never even
/// statted and `should_compile` stays false.
///
/// # Errors
/// [`LoadError::NotFound`] when neither file exists.
pub fn resolve(
    vfs: &dyn VirtualFileSystem,
    name: &ResourceName,
    compiled_ext: &str,
    source_ext: &str,
    compile_enabled: bool,
) -> Result<Freshness> {
    let compiled = vfs.stat(&name.with_extension(compiled_ext));
    let mut freshness = Freshness {
        has_compiled: compiled.is_some(),
        has_source: false,
        should_compile: false,
        resolved: name.clone(),
    };
    if let Some(stat) = &compiled {
        freshness.resolved = ResourceName::from_path(&stat.path, compiled_ext);
    }

    if compile_enabled
        && let Some(source) = vfs.stat(&name.with_extension(source_ext))
    {
        freshness.has_source = true;
        let stale = match &compiled {
            Some(artifact) => source.mtime > artifact.mtime,
            None => true,
        };
        if stale {
            freshness.should_compile = true;
            freshness.resolved = ResourceName::from_path(&source.path, source_ext);
        }
    }

    if !freshness.has_compiled && !freshness.has_source {
        return Err(LoadError::NotFound(name.clone()));
    }
    Ok(freshness)
}
