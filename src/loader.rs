//! Load orchestration.
//!
//! Ties the freshness resolver, the virtual file system, the compiler pool
//! and a kind's parser together to build one resource or fail. All failures
//! are local to one load call; the store above records them as negative
//! entries and the caller sees "no resource".

use std::sync::Arc;

use crate::compiler::CompilerPool;
use crate::config::EngineConfig;
use crate::errors::{LoadError, Result};
use crate::freshness::{self, Freshness};
use crate::kinds::{ParsePayload, ResourceKind};
use crate::name::ResourceName;
use crate::resource::{Resource, ResourceHandle};
use crate::vfs::VirtualFileSystem;

/// Everything a load needs, injected at construction.
pub struct LoadContext {
    pub vfs: Arc<dyn VirtualFileSystem>,
    pub pool: CompilerPool,
    pub config: EngineConfig,
}

/// Loads `name` as kind `K`, logging failures per their class and mapping
/// them to `None` for the cache layer.
pub fn load<K: ResourceKind>(ctx: &LoadContext, name: &ResourceName) -> Option<ResourceHandle<K>> {
    match try_load::<K>(ctx, name) {
        Ok(resource) => Some(Arc::new(resource)),
        Err(LoadError::NotFound(name)) => {
            log::warn!("{} '{name}' not found", K::LABEL);
            None
        }
        Err(err) => {
            log::error!("{} '{name}' failed to load: {err}", K::LABEL);
            None
        }
    }
}

fn try_load<K: ResourceKind>(ctx: &LoadContext, name: &ResourceName) -> Result<Resource<K>> {
    let compiled_ext = K::compiled_ext(&ctx.config.platform);
    let fresh = freshness::resolve(
        ctx.vfs.as_ref(),
        name,
        &compiled_ext,
        K::SOURCE_EXT,
        ctx.config.compile_sources,
    )?;

    if fresh.has_compiled && !fresh.should_compile {
        match parse_artifact::<K>(ctx, &fresh.resolved, &compiled_ext) {
            Ok(resource) => return Ok(resource),
            // A corrupt artifact with a source present gets exactly one
            // recompile attempt, not a retry loop.
            Err(err) if fresh.has_source => {
                log::error!(
                    "compiled {} '{}' is unreadable ({err}), recompiling from source",
                    K::LABEL,
                    fresh.resolved
                );
            }
            Err(err) => return Err(err),
        }
    }

    compile_and_parse::<K>(ctx, &fresh, &compiled_ext)
}

/// Opens and parses an on-disk compiled artifact.
fn parse_artifact<K: ResourceKind>(
    ctx: &LoadContext,
    name: &ResourceName,
    compiled_ext: &str,
) -> Result<Resource<K>> {
    let path = name.with_extension(compiled_ext);
    let mut stream = ctx
        .vfs
        .open(&path)
        .ok_or_else(|| LoadError::OpenFailed(path.clone()))?;
    let mut payload = K::construct();
    payload.parse_from(name, stream.as_mut())?;
    Ok(Resource::new(name.clone(), payload))
}

/// Acquires a compiler, produces a blob, persists it best-effort and parses
/// it straight from memory.
fn compile_and_parse<K: ResourceKind>(
    ctx: &LoadContext,
    fresh: &Freshness,
    compiled_ext: &str,
) -> Result<Resource<K>> {
    let name = &fresh.resolved;
    let Some(mut lease) = ctx.pool.acquire() else {
        if fresh.has_compiled {
            // Degrade: a stale artifact beats nothing when no compiler is
            // reachable.
            log::error!(
                "compiler unavailable, serving existing {} artifact for '{name}'",
                K::LABEL
            );
            return parse_artifact::<K>(ctx, name, compiled_ext);
        }
        return Err(LoadError::CompilerUnavailable(name.clone()));
    };

    // Keep the lease's lifetime free of early returns so it always goes
    // back to the pool.
    let blob = K::compile(&mut lease, name);
    ctx.pool.release(lease);
    let blob = blob?;

    let artifact_path = name.with_extension(compiled_ext);
    if !ctx.vfs.put_contents(&artifact_path, &blob, true, true) {
        log::warn!(
            "could not persist compiled {} '{name}' to '{artifact_path}'",
            K::LABEL
        );
    }

    let mut payload = K::construct();
    payload.parse_from(name, &mut std::io::Cursor::new(blob.as_slice()))?;
    Ok(Resource::new(name.clone(), payload))
}
