//! The resource-kind catalog.
//!
//! [`ResourceKind`] is the small traits type every generic piece of the
//! pipeline is parameterized over: extension pair, payload construction,
//! parsing and compilation. The twelve engine kinds are generated by
//! [`define_kinds!`] so that per-kind plumbing cannot drift apart.

use std::borrow::Cow;
use std::io::Read;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::compiler::CompilerLease;
use crate::errors::{LoadError, Result};
use crate::name::ResourceName;
use crate::resource::DeviceResources;

/// Per-kind traits consumed by the store, loader and manager.
pub trait ResourceKind: Send + Sync + 'static {
    /// Lowercase label used in logs, dispatch and compiler requests.
    const LABEL: &'static str;
    /// Extension of the engine-ready compiled artifact.
    const COMPILED_EXT: &'static str;
    /// Extension of the authoring-format source descriptor.
    const SOURCE_EXT: &'static str;
    /// The compiled artifact is baked per target platform.
    const PLATFORM_COMPILED: bool = false;

    type Payload: ParsePayload + DeviceResources + Send + Sync + 'static;

    /// Fresh, empty payload for the parser to fill in place.
    #[must_use]
    fn construct() -> Self::Payload {
        Self::Payload::default()
    }

    /// Full compiled extension for the given platform tag.
    #[must_use]
    fn compiled_ext(platform: &str) -> Cow<'static, str> {
        if Self::PLATFORM_COMPILED {
            Cow::Owned(format!("{}_{platform}", Self::COMPILED_EXT))
        } else {
            Cow::Borrowed(Self::COMPILED_EXT)
        }
    }

    /// Asks a leased compiler for this kind's artifact blob.
    fn compile(lease: &mut CompilerLease, name: &ResourceName) -> Result<Vec<u8>> {
        lease.compile(Self::LABEL, name)
    }
}

/// In-place deserialization from a compiled-artifact stream.
///
/// The binary format itself is the per-format parser's business and opaque
/// here; implementations validate what they must and keep the rest.
pub trait ParsePayload: Default {
    fn parse_from(&mut self, name: &ResourceName, stream: &mut dyn Read) -> Result<()>;
}

fn read_artifact(
    kind: &'static str,
    name: &ResourceName,
    stream: &mut dyn Read,
) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Err(LoadError::Parse {
            kind,
            name: name.clone(),
            reason: "empty artifact".to_string(),
        });
    }
    Ok(bytes)
}

/// Opaque compiled-artifact payload shared by most kinds.
#[derive(Default)]
pub struct BlobPayload {
    bytes: Vec<u8>,
}

impl BlobPayload {
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ParsePayload for BlobPayload {
    fn parse_from(&mut self, name: &ResourceName, stream: &mut dyn Read) -> Result<()> {
        self.bytes = read_artifact("resource", name, stream)?;
        Ok(())
    }
}

impl DeviceResources for BlobPayload {}

/// Material payload: compiled blob plus runtime parameter overrides.
///
/// Overrides are the kind-specific mutation surface; the cache layer treats
/// the published resource as immutable and never touches them.
#[derive(Default)]
pub struct MaterialPayload {
    bytes: Vec<u8>,
    params: RwLock<FxHashMap<String, f32>>,
}

impl MaterialPayload {
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn set_param(&self, key: &str, value: f32) {
        self.params.write().insert(key.to_string(), value);
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<f32> {
        self.params.read().get(key).copied()
    }
}

impl ParsePayload for MaterialPayload {
    fn parse_from(&mut self, name: &ResourceName, stream: &mut dyn Read) -> Result<()> {
        self.bytes = read_artifact(Material::LABEL, name, stream)?;
        Ok(())
    }
}

impl DeviceResources for MaterialPayload {}

/// Generates the kind marker types and their [`ResourceKind`] impls.
macro_rules! define_kinds {
    ($(
        $kind:ident {
            label: $label:literal,
            compiled: $compiled:literal,
            source: $source:literal,
            payload: $payload:ty
            $(, platform: $platform:tt)?
        }
    )+) => {
        $(
            pub struct $kind;

            impl ResourceKind for $kind {
                const LABEL: &'static str = $label;
                const COMPILED_EXT: &'static str = $compiled;
                const SOURCE_EXT: &'static str = $source;
                $( const PLATFORM_COMPILED: bool = $platform; )?
                type Payload = $payload;
            }
        )+
    };
}

define_kinds! {
    Material {
        label: "material",
        compiled: ".mtl",
        source: ".mtl.xml",
        payload: MaterialPayload
    }
    MaterialShader {
        label: "materialshader",
        compiled: ".mtlshader",
        source: ".mtlshader.xml",
        payload: BlobPayload
    }
    Texture {
        label: "texture",
        compiled: ".tex",
        source: ".tex.zip",
        payload: BlobPayload,
        platform: true
    }
    StaticMesh {
        label: "staticmesh",
        compiled: ".staticmesh",
        source: ".staticmesh.xml",
        payload: BlobPayload
    }
    Font {
        label: "font",
        compiled: ".font",
        source: ".font.zip",
        payload: BlobPayload,
        platform: true
    }
    BlockPalette {
        label: "blockpalette",
        compiled: ".palette",
        source: ".palette.zip",
        payload: BlobPayload,
        platform: true
    }
    TerrainLayerList {
        label: "terrainlayerlist",
        compiled: ".layerlist",
        source: ".layerlist.xml",
        payload: BlobPayload
    }
    BlockMesh {
        label: "blockmesh",
        compiled: ".blockmesh",
        source: ".blockmesh.xml",
        payload: BlobPayload
    }
    Skeleton {
        label: "skeleton",
        compiled: ".skeleton",
        source: ".skeleton.xml",
        payload: BlobPayload
    }
    SkeletalMesh {
        label: "skeletalmesh",
        compiled: ".skelmesh",
        source: ".skelmesh.xml",
        payload: BlobPayload
    }
    SkeletalAnimation {
        label: "skeletalanimation",
        compiled: ".skelanim",
        source: ".skelanim.xml",
        payload: BlobPayload
    }
    ParticleSystem {
        label: "particlesystem",
        compiled: ".particles",
        source: ".particles.xml",
        payload: BlobPayload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_extension_composition() {
        assert_eq!(Texture::compiled_ext("pc"), ".tex_pc");
        assert_eq!(Material::compiled_ext("pc"), ".mtl");
    }

    #[test]
    fn blob_rejects_empty_stream() {
        let mut payload = BlobPayload::default();
        let name = ResourceName::new("x");
        let err = payload
            .parse_from(&name, &mut std::io::Cursor::new(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn material_param_overrides() {
        let payload = MaterialPayload::default();
        assert_eq!(payload.param("glow"), None);
        payload.set_param("glow", 0.5);
        assert_eq!(payload.param("glow"), Some(0.5));
    }
}
