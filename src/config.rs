//! Engine configuration.
//!
//! An explicit, serializable context object passed at construction. There
//! are no global accessors; everything the pipeline needs to know arrives
//! through [`EngineConfig`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-kind default resource names, substituted by `safe_get` when a
/// request cannot be resolved. A kind without a configured default has no
/// fallback; `safe_get` for it aborts on a miss.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultResources {
    pub material: Option<String>,
    pub material_shader: Option<String>,
    pub texture: Option<String>,
    pub static_mesh: Option<String>,
    pub font: Option<String>,
    pub block_palette: Option<String>,
    pub terrain_layer_list: Option<String>,
    pub block_mesh: Option<String>,
    pub skeleton: Option<String>,
    pub skeletal_mesh: Option<String>,
    pub skeletal_animation: Option<String>,
    pub particle_system: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target platform tag, folded into platform-baked artifact extensions
    /// (e.g. `.tex_pc`).
    pub platform: String,
    /// Administrative switch for source compilation. When off, sources are
    /// never statted and stale artifacts are served as-is.
    pub compile_sources: bool,
    /// Compiler executable, when the subprocess connector is used.
    pub compiler_command: Option<String>,
    pub compiler_args: Vec<String>,
    /// How long an idle primary compiler survives before the maintenance
    /// tick reaps it. Zero destroys it on release.
    pub compiler_idle_release_ms: u64,
    pub defaults: DefaultResources,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            platform: "pc".to_string(),
            compile_sources: true,
            compiler_command: None,
            compiler_args: Vec::new(),
            compiler_idle_release_ms: 30_000,
            defaults: DefaultResources::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn compiler_idle_release(&self) -> Duration {
        Duration::from_millis(self.compiler_idle_release_ms)
    }
}
