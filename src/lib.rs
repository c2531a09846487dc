#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Kiln — resource brokerage and on-demand asset compilation.
//!
//! The crate brokers all access to named, typed content assets and
//! guarantees that a given name is loaded at most once per process, that
//! stale compiled artifacts are regenerated from authoring sources when a
//! compiler is reachable, that concurrent requests never duplicate I/O or
//! compilation, and that asset memory is reclaimed once every holder lets
//! go.
//!
//! Collaborators stay external: the GPU device behind
//! [`resource::DeviceResources`], per-format parsers behind
//! [`kinds::ParsePayload`], the compiler executable behind
//! [`compiler::RemoteCompiler`], and the file system behind
//! [`vfs::VirtualFileSystem`].

pub mod compiler;
pub mod config;
pub mod errors;
pub mod freshness;
pub mod kinds;
pub mod loader;
pub mod manager;
pub mod name;
pub mod resource;
pub mod store;
pub mod vfs;

pub use compiler::{CompilerConnector, CompilerPool, NullCompilerConnector, RemoteCompiler};
pub use config::{DefaultResources, EngineConfig};
pub use errors::{LoadError, Result};
pub use loader::LoadContext;
pub use manager::{AnyResource, KindTag, ResourceManager};
pub use name::ResourceName;
pub use resource::{DeviceResources, Resource, ResourceHandle};
pub use store::TypedResourceStore;
pub use vfs::{DiskFileSystem, MemoryFileSystem, VirtualFileSystem};
