#![allow(dead_code)]

use std::collections::HashSet;

use biome_viewer::asset::{AssetSource, ImageData, MeshData};
use biome_viewer::gpu::RecordingContext;
use biome_viewer::renderer::{MeshLibrary, ShaderLibrary, TextureLibrary};
use biome_viewer::{Error, Result};

/// Serves one triangle for every mesh path and a 2x2 image for every image
/// path, except the paths marked missing.
#[derive(Default)]
pub struct MemoryAssets {
    missing: HashSet<String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(mut self, path: &str) -> Self {
        self.missing.insert(path.to_string());
        self
    }

    fn check(&self, path: &str) -> Result<()> {
        if self.missing.contains(path) {
            return Err(Error::AssetMissing { path: path.into() });
        }
        Ok(())
    }
}

impl AssetSource for MemoryAssets {
    fn load_mesh(&self, path: &str) -> Result<MeshData> {
        self.check(path)?;
        #[rustfmt::skip]
        let vertices = vec![
            0.0, 0.0,  0.0, 1.0, 0.0,  -0.5, 0.0, 0.5,
            1.0, 0.0,  0.0, 1.0, 0.0,   0.5, 0.0, 0.5,
            0.5, 1.0,  0.0, 1.0, 0.0,   0.0, 0.0, -0.5,
        ];
        Ok(MeshData { vertices })
    }

    fn load_image(&self, path: &str) -> Result<ImageData> {
        self.check(path)?;
        Ok(ImageData::solid(2, 2, [90, 140, 60, 255]))
    }
}

pub struct Libraries {
    pub shaders: ShaderLibrary,
    pub meshes: MeshLibrary,
    pub textures: TextureLibrary,
}

/// Loads the full catalog into `gpu`.
pub fn libraries(gpu: &mut RecordingContext, assets: &MemoryAssets) -> Libraries {
    let shaders = ShaderLibrary::new(gpu).unwrap();
    let meshes = MeshLibrary::new(gpu, assets, &shaders).unwrap();
    let textures = TextureLibrary::new(gpu, assets, 64).unwrap();
    Libraries {
        shaders,
        meshes,
        textures,
    }
}
