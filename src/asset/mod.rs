//! Asset collaborator: turns identifiers into vertex arrays and pixels.

pub mod cache;
pub mod handle;
pub mod loader;

pub use cache::AssetCache;
pub use handle::Handle;
pub use loader::FileAssets;

use std::path::Path;

use crate::error::{Error, Result};
use crate::renderer::vertex::VertexLayout;

/// Cube map faces in layer order (+X, -X, +Y, -Y, +Z, -Z). Cube maps are
/// left-handed, so the viewer's "back" image lands on +Z.
pub const CUBE_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "back", "front"];

/// Non-indexed triangle list in the `2f 3f 3f` layout (uv, normal, position).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VertexLayout::TEXTURED.floats_per_vertex
    }
}

/// Decoded RGBA8 pixels, row-major, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(Error::AssetDecode {
                path: Path::new("<memory>").to_path_buf(),
                reason: format!(
                    "{width}x{height} RGBA8 image needs {expected} bytes, got {}",
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color image, handy as a placeholder.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

/// Six square faces of equal size in [`CUBE_FACE_NAMES`] order.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeFaces {
    faces: [ImageData; 6],
}

impl CubeFaces {
    pub fn new(faces: [ImageData; 6]) -> Result<Self> {
        let size = faces[0].size();
        if size[0] != size[1] {
            return Err(Error::AssetDecode {
                path: Path::new(CUBE_FACE_NAMES[0]).to_path_buf(),
                reason: format!("cube face must be square, got {}x{}", size[0], size[1]),
            });
        }
        if let Some(i) = faces.iter().position(|face| face.size() != size) {
            return Err(Error::AssetDecode {
                path: Path::new(CUBE_FACE_NAMES[i]).to_path_buf(),
                reason: format!("cube faces differ in size, expected {}x{}", size[0], size[1]),
            });
        }
        Ok(Self { faces })
    }

    pub fn faces(&self) -> &[ImageData; 6] {
        &self.faces
    }

    pub fn face_size(&self) -> u32 {
        self.faces[0].width
    }
}

/// Where the libraries get their bytes from.
pub trait AssetSource {
    fn load_mesh(&self, path: &str) -> Result<MeshData>;
    fn load_image(&self, path: &str) -> Result<ImageData>;

    /// Loads `<dir>/<face>.png` for every face name.
    fn load_cube_faces(&self, dir: &str) -> Result<CubeFaces> {
        let load = |i: usize| self.load_image(&format!("{dir}/{}.png", CUBE_FACE_NAMES[i]));
        CubeFaces::new([load(0)?, load(1)?, load(2)?, load(3)?, load(4)?, load(5)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_rejects_wrong_byte_count() {
        assert!(ImageData::new(2, 2, vec![0; 15]).is_err());
        assert!(ImageData::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn cube_faces_must_match() {
        let face = || ImageData::solid(4, 4, [255; 4]);
        let mut faces = [face(), face(), face(), face(), face(), face()];
        assert!(CubeFaces::new(faces.clone()).is_ok());

        faces[3] = ImageData::solid(8, 8, [0; 4]);
        assert!(matches!(CubeFaces::new(faces), Err(Error::AssetDecode { .. })));
    }
}
