use log::{debug, error, info};

use crate::asset::{AssetCache, AssetSource, Handle};
use crate::error::{Error, Result, Teardown};
use crate::gpu::{GpuContext, TextureId, TextureKind};

use super::catalog::{TextureSource, TextureSpec, DEPTH_TEXTURE, TEXTURES};

#[derive(Debug)]
pub struct TextureEntry {
    pub name: String,
    pub texture: TextureId,
    pub kind: TextureKind,
}

/// Albedo and sky textures plus the one depth texture shared by both passes.
#[derive(Default)]
pub struct TextureLibrary {
    textures: AssetCache<TextureEntry>,
    depth: Option<TextureId>,
}

impl TextureLibrary {
    pub fn new(
        gpu: &mut impl GpuContext,
        assets: &dyn AssetSource,
        shadow_map_size: u32,
    ) -> Result<Self> {
        Self::from_specs(gpu, assets, TEXTURES, shadow_map_size)
    }

    pub fn from_specs(
        gpu: &mut impl GpuContext,
        assets: &dyn AssetSource,
        specs: &[TextureSpec],
        shadow_map_size: u32,
    ) -> Result<Self> {
        let mut library = Self::default();
        for spec in specs {
            if let Err(err) = library.upload(gpu, assets, spec) {
                library.release_after_failure(gpu);
                return Err(err);
            }
        }

        let size = [shadow_map_size, shadow_map_size];
        let depth = match gpu.create_depth_texture(DEPTH_TEXTURE, size) {
            Ok(depth) => depth,
            Err(err) => {
                library.release_after_failure(gpu);
                return Err(err);
            }
        };
        library.textures.insert(
            DEPTH_TEXTURE,
            TextureEntry {
                name: DEPTH_TEXTURE.to_string(),
                texture: depth,
                kind: TextureKind::Depth,
            },
        );
        library.depth = Some(depth);

        info!(
            "Uploaded {} textures, shadow map {}x{}",
            library.textures.len(),
            shadow_map_size,
            shadow_map_size
        );
        Ok(library)
    }

    fn upload(
        &mut self,
        gpu: &mut impl GpuContext,
        assets: &dyn AssetSource,
        spec: &TextureSpec,
    ) -> Result<()> {
        let (texture, kind) = match spec.source {
            TextureSource::Image(path) => {
                let image = assets.load_image(path)?;
                (gpu.create_texture_2d(spec.name, &image)?, TextureKind::Color2d)
            }
            TextureSource::CubeMap(dir) => {
                let faces = assets.load_cube_faces(dir)?;
                (gpu.create_texture_cube(spec.name, &faces)?, TextureKind::Cube)
            }
        };
        debug!("Texture `{}` ({:?}) as {:?}", spec.name, kind, texture);
        self.textures.insert(
            spec.name,
            TextureEntry {
                name: spec.name.to_string(),
                texture,
                kind,
            },
        );
        Ok(())
    }

    pub fn handle(&self, name: &str) -> Result<Handle<TextureEntry>> {
        self.textures
            .lookup(name)
            .ok_or_else(|| Error::UnknownTexture(name.to_string()))
    }

    pub fn get(&self, handle: Handle<TextureEntry>) -> Result<&TextureEntry> {
        self.textures
            .get(handle)
            .ok_or_else(|| Error::UnknownTexture(format!("#{}", handle.index())))
    }

    /// Written by the shadow pass, sampled by the main pass.
    pub fn depth_texture(&self) -> Result<TextureId> {
        self.depth
            .ok_or_else(|| Error::UnknownTexture(DEPTH_TEXTURE.to_string()))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Releases every texture, newest first. Calling it again does nothing.
    pub fn destroy(&mut self, gpu: &mut impl GpuContext) -> Result<()> {
        self.depth = None;
        let mut teardown = Teardown::new();
        for entry in self.textures.drain() {
            teardown.check(gpu.release_texture(entry.texture));
        }
        teardown.finish()
    }

    fn release_after_failure(&mut self, gpu: &mut impl GpuContext) {
        if let Err(err) = self.destroy(gpu) {
            error!("Releasing textures after failed upload: {}", err);
        }
    }
}
