//! The resource manager facade.
//!
//! Owns one store per kind, routes every request through the shared load
//! context, resolves per-kind default resources, fans the device-resource
//! lifecycle out to every cached entry and drives periodic maintenance.

use std::sync::{Arc, OnceLock};

use crate::compiler::{CompilerConnector, CompilerPool, NullCompilerConnector, ProcessCompilerConnector};
use crate::config::EngineConfig;
use crate::kinds::{self, ResourceKind};
use crate::loader::{self, LoadContext};
use crate::name::ResourceName;
use crate::resource::ResourceHandle;
use crate::store::TypedResourceStore;
use crate::vfs::{ChangeKind, ChangeNotifier, VirtualFileSystem};

/// Store plus default-resource state for one kind.
struct KindSlot<K: ResourceKind> {
    store: TypedResourceStore<K>,
    default_name: Option<ResourceName>,
    default: OnceLock<ResourceHandle<K>>,
}

impl<K: ResourceKind> KindSlot<K> {
    fn new(default_name: Option<&String>) -> Self {
        Self {
            store: TypedResourceStore::new(),
            default_name: default_name.map(|n| ResourceName::new(n)),
            default: OnceLock::new(),
        }
    }

    fn get(&self, ctx: &LoadContext, name: &str) -> Option<ResourceHandle<K>> {
        let name = ResourceName::new(name);
        self.store.get(&name, |n| loader::load::<K>(ctx, n))
    }

    fn uncached_get(&self, ctx: &LoadContext, name: &str) -> Option<ResourceHandle<K>> {
        let name = ResourceName::new(name);
        self.store.uncached_get(&name, |n| loader::load::<K>(ctx, n))
    }

    fn safe_get(&self, ctx: &LoadContext, name: &str) -> ResourceHandle<K> {
        if let Some(resource) = self.get(ctx, name) {
            return resource;
        }
        log::warn!(
            "{} '{name}' unresolved, substituting the default",
            K::LABEL
        );
        self.default(ctx)
    }

    /// Lazily resolves the kind's default through the normal cache. A
    /// missing default asset is a deployment error: abort.
    fn default(&self, ctx: &LoadContext) -> ResourceHandle<K> {
        self.default
            .get_or_init(|| {
                let Some(name) = &self.default_name else {
                    panic!("no default {} resource configured", K::LABEL);
                };
                match self.store.get(name, |n| loader::load::<K>(ctx, n)) {
                    Some(resource) => resource,
                    None => panic!("default {} resource '{name}' failed to load", K::LABEL),
                }
            })
            .clone()
    }

    fn create_device_resources(&self) {
        for resource in self.store.snapshot() {
            resource.ensure_device_resources();
        }
    }

    fn release_device_resources(&self) {
        for resource in self.store.snapshot() {
            resource.release_device_resources();
        }
    }
}

macro_rules! manager_catalog {
    ($(
        $field:ident : $kind:ident {
            get $get:ident,
            uncached $uncached:ident,
            safe $safe:ident,
            default $default:ident
        }
    )+) => {
        /// Runtime type tag for kind-dispatched access.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum KindTag {
            $( $kind, )+
        }

        /// A handle of any kind, produced by tag dispatch.
        pub enum AnyResource {
            $( $kind(ResourceHandle<kinds::$kind>), )+
        }

        impl AnyResource {
            #[must_use]
            pub fn name(&self) -> &ResourceName {
                match self {
                    $( Self::$kind(resource) => resource.name(), )+
                }
            }

            #[must_use]
            pub fn tag(&self) -> KindTag {
                match self {
                    $( Self::$kind(_) => KindTag::$kind, )+
                }
            }
        }

        /// Source extensions of every registered kind, used by the change
        /// poll in [`ResourceManager::update`].
        const SOURCE_EXTS: &[&str] = &[
            $( kinds::$kind::SOURCE_EXT, )+
        ];

        /// Facade over one store+loader pair per resource kind.
        pub struct ResourceManager {
            ctx: LoadContext,
            notifier: Option<ChangeNotifier>,
            $( $field: KindSlot<kinds::$kind>, )+
        }

        impl ResourceManager {
            /// Builds the manager from its collaborators. The compiler
            /// connector is injected; see [`Self::with_process_compiler`]
            /// for the stock subprocess setup.
            #[must_use]
            pub fn new(
                vfs: Arc<dyn VirtualFileSystem>,
                connector: Box<dyn CompilerConnector>,
                config: EngineConfig,
            ) -> Self {
                let pool = CompilerPool::new(connector, config.compiler_idle_release());
                let notifier = vfs.create_change_notifier();
                let defaults = config.defaults.clone();
                let ctx = LoadContext { vfs, pool, config };
                Self {
                    ctx,
                    notifier,
                    $( $field: KindSlot::new(defaults.$default.as_ref()), )+
                }
            }

            /// Stock setup: subprocess compiler when a command is
            /// configured, otherwise no compiler (loads degrade to
            /// existing artifacts).
            #[must_use]
            pub fn with_process_compiler(
                vfs: Arc<dyn VirtualFileSystem>,
                config: EngineConfig,
            ) -> Self {
                let connector: Box<dyn CompilerConnector> = match &config.compiler_command {
                    Some(command) => Box::new(ProcessCompilerConnector::new(
                        command.clone(),
                        config.compiler_args.clone(),
                    )),
                    None => Box::new(NullCompilerConnector),
                };
                Self::new(vfs, connector, config)
            }

            $(
                pub fn $get(&self, name: &str) -> Option<ResourceHandle<kinds::$kind>> {
                    self.$field.get(&self.ctx, name)
                }

                pub fn $uncached(&self, name: &str) -> Option<ResourceHandle<kinds::$kind>> {
                    self.$field.uncached_get(&self.ctx, name)
                }

                pub fn $safe(&self, name: &str) -> ResourceHandle<kinds::$kind> {
                    self.$field.safe_get(&self.ctx, name)
                }
            )+

            /// Kind-dispatched lookup for callers that only know a runtime
            /// tag.
            pub fn get_any(&self, tag: KindTag, name: &str) -> Option<AnyResource> {
                match tag {
                    $( KindTag::$kind => {
                        self.$field.get(&self.ctx, name).map(AnyResource::$kind)
                    } )+
                }
            }

            /// Device-loss recovery: (re)creates device resources for every
            /// cached entry of every kind.
            pub fn create_device_resources(&self) {
                $( self.$field.create_device_resources(); )+
            }

            pub fn release_device_resources(&self) {
                $( self.$field.release_device_resources(); )+
            }

            /// Sweeps every store, dropping entries nobody outside the
            /// cache still holds. Returns the number of evicted entries.
            pub fn compact(&self) -> usize {
                let mut removed = 0;
                $( removed += self.$field.store.compact(); )+
                removed
            }

            /// Total cached entries across all kinds, negatives included.
            #[must_use]
            pub fn cached_count(&self) -> usize {
                let mut count = 0;
                $( count += self.$field.store.len(); )+
                count
            }

            /// Periodic maintenance: polls the change notifier for modified
            /// sources (logged only; reload stays a caller decision) and
            /// drives the compiler pool's idle-release timer.
            pub fn update(&self) {
                if let Some(notifier) = &self.notifier {
                    for event in notifier.drain() {
                        let path = event.path.to_lowercase();
                        if event.kind == ChangeKind::Modified
                            && SOURCE_EXTS.iter().any(|ext| path.ends_with(ext))
                        {
                            log::info!("source modified on disk: {}", event.path);
                        } else {
                            log::debug!("file event {:?}: {}", event.kind, event.path);
                        }
                    }
                }
                self.ctx.pool.tick();
            }

            /// The injected load context (VFS, pool, config).
            #[must_use]
            pub fn context(&self) -> &LoadContext {
                &self.ctx
            }
        }

        impl Drop for ResourceManager {
            fn drop(&mut self) {
                // Stores must be emptied before teardown; entries still
                // held externally survive through their own handles.
                $( self.$field.store.release_all(); )+
            }
        }
    };
}

manager_catalog! {
    materials: Material {
        get get_material,
        uncached uncached_get_material,
        safe safe_get_material,
        default material
    }
    material_shaders: MaterialShader {
        get get_material_shader,
        uncached uncached_get_material_shader,
        safe safe_get_material_shader,
        default material_shader
    }
    textures: Texture {
        get get_texture,
        uncached uncached_get_texture,
        safe safe_get_texture,
        default texture
    }
    static_meshes: StaticMesh {
        get get_static_mesh,
        uncached uncached_get_static_mesh,
        safe safe_get_static_mesh,
        default static_mesh
    }
    fonts: Font {
        get get_font,
        uncached uncached_get_font,
        safe safe_get_font,
        default font
    }
    block_palettes: BlockPalette {
        get get_block_palette,
        uncached uncached_get_block_palette,
        safe safe_get_block_palette,
        default block_palette
    }
    terrain_layer_lists: TerrainLayerList {
        get get_terrain_layer_list,
        uncached uncached_get_terrain_layer_list,
        safe safe_get_terrain_layer_list,
        default terrain_layer_list
    }
    block_meshes: BlockMesh {
        get get_block_mesh,
        uncached uncached_get_block_mesh,
        safe safe_get_block_mesh,
        default block_mesh
    }
    skeletons: Skeleton {
        get get_skeleton,
        uncached uncached_get_skeleton,
        safe safe_get_skeleton,
        default skeleton
    }
    skeletal_meshes: SkeletalMesh {
        get get_skeletal_mesh,
        uncached uncached_get_skeletal_mesh,
        safe safe_get_skeletal_mesh,
        default skeletal_mesh
    }
    skeletal_animations: SkeletalAnimation {
        get get_skeletal_animation,
        uncached uncached_get_skeletal_animation,
        safe safe_get_skeletal_animation,
        default skeletal_animation
    }
    particle_systems: ParticleSystem {
        get get_particle_system,
        uncached uncached_get_particle_system,
        safe safe_get_particle_system,
        default particle_system
    }
}
