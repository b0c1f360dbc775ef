use std::path::PathBuf;

use log::error;
use thiserror::Error;

use crate::gpu::{RenderTarget, ResourceId, TextureUnit};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("asset {path:?} not found")]
    AssetMissing { path: PathBuf },

    #[error("failed to decode asset {path:?}: {reason}")]
    AssetDecode { path: PathBuf, reason: String },

    #[error("unsupported asset format {path:?}")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse OBJ {path:?}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to import glTF {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("shader `{label}` failed to compile: {reason}")]
    ShaderCompile { label: String, reason: String },

    #[error("graphics context creation failed: {0}")]
    Context(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("unknown mesh `{0}`")]
    UnknownMesh(String),

    #[error("unknown texture `{0}`")]
    UnknownTexture(String),

    #[error("mesh `{0}` has no shadow-pass vertex array")]
    MissingShadowVariant(String),

    #[error("mesh `{name}` has malformed vertex data: {reason}")]
    MalformedMesh { name: String, reason: String },

    #[error("{0:?} is unknown or already released")]
    UnknownHandle(ResourceId),

    #[error("no texture bound at {0:?}")]
    MissingTextureBinding(TextureUnit),

    #[error("texture bound at {unit:?} has the wrong kind for this program")]
    TextureKindMismatch { unit: TextureUnit },

    #[error("program cannot draw into {0:?}")]
    TargetMismatch(RenderTarget),

    #[error("no render target bound; call bind_framebuffer first")]
    NoRenderTarget,

    #[error("no frame in progress; call begin_frame first")]
    NoActiveFrame,

    #[error("object is not a shadow caster")]
    NotShadowCaster,

    #[error("region `{name}` has empty bounds")]
    InvalidRegion { name: String },

    #[error("object key is stale or was never issued")]
    StaleObject,
}

/// Collects release failures so teardown keeps going after one fails.
#[derive(Debug, Default)]
pub(crate) struct Teardown {
    first: Option<Error>,
}

impl Teardown {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check(&mut self, result: Result<()>) {
        if let Err(err) = result {
            error!("Release failed: {}", err);
            self.first.get_or_insert(err);
        }
    }

    /// The first failure, if any.
    pub(crate) fn finish(self) -> Result<()> {
        match self.first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_reports_the_first_failure() {
        let mut teardown = Teardown::new();
        teardown.check(Ok(()));
        teardown.check(Err(Error::NoRenderTarget));
        teardown.check(Err(Error::StaleObject));
        assert!(matches!(teardown.finish(), Err(Error::NoRenderTarget)));
        assert!(Teardown::new().finish().is_ok());
    }
}
