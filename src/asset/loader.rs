use std::path::{Path, PathBuf};

use log::debug;

use super::{AssetSource, ImageData, MeshData};
use crate::error::{Error, Result};

/// Loads assets from a directory on disk.
///
/// Meshes: Wavefront `.obj` and glTF (`.gltf` / `.glb`). Images: anything the
/// `image` crate decodes.
#[derive(Clone, Debug)]
pub struct FileAssets {
    root: PathBuf,
}

impl FileAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::AssetMissing { path })
        }
    }
}

impl AssetSource for FileAssets {
    fn load_mesh(&self, relative: &str) -> Result<MeshData> {
        let path = self.resolve(relative)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let mesh = match extension.as_deref() {
            Some("obj") => load_obj(&path)?,
            Some("gltf") | Some("glb") => load_gltf(&path)?,
            _ => return Err(Error::UnsupportedFormat { path }),
        };

        if mesh.vertices.is_empty() {
            return Err(Error::AssetDecode {
                path,
                reason: "mesh contains no triangles".into(),
            });
        }
        debug!("Loaded mesh {:?} ({} vertices)", path, mesh.vertex_count());
        Ok(mesh)
    }

    fn load_image(&self, relative: &str) -> Result<ImageData> {
        let path = self.resolve(relative)?;
        let rgba = image::open(&path)
            .map_err(|source| Error::Image {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        debug!("Loaded image {:?} ({}x{})", path, width, height);
        ImageData::new(width, height, rgba.into_raw())
    }
}

fn load_obj(path: &Path) -> Result<MeshData> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| Error::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let mut vertices = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        for &index in &mesh.indices {
            let i = index as usize;
            // OBJ texture space starts bottom-left; GPU images start top-left.
            let u = mesh.texcoords.get(i * 2).copied().unwrap_or(0.0);
            let v = 1.0 - mesh.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0);
            vertices.extend_from_slice(&[u, v]);
            for axis in 0..3 {
                vertices.push(mesh.normals.get(i * 3 + axis).copied().unwrap_or(0.0));
            }
            let position = mesh
                .positions
                .get(i * 3..i * 3 + 3)
                .ok_or_else(|| Error::AssetDecode {
                    path: path.to_path_buf(),
                    reason: format!("index {index} out of range in `{}`", model.name),
                })?;
            vertices.extend_from_slice(position);
        }
    }
    Ok(MeshData { vertices })
}

fn load_gltf(path: &Path) -> Result<MeshData> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| Error::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut vertices = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| Error::AssetDecode {
                    path: path.to_path_buf(),
                    reason: "primitive has no POSITION attribute".into(),
                })?
                .collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect())
                .unwrap_or_default();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            for index in indices {
                let i = index as usize;
                let position = positions.get(i).ok_or_else(|| Error::AssetDecode {
                    path: path.to_path_buf(),
                    reason: format!("index {index} out of range"),
                })?;
                vertices.extend_from_slice(&uvs.get(i).copied().unwrap_or([0.0, 0.0]));
                vertices.extend_from_slice(&normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]));
                vertices.extend_from_slice(position);
            }
        }
    }
    Ok(MeshData { vertices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("biome-viewer-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let assets = FileAssets::new(scratch_dir("missing"));
        match assets.load_mesh("nope.obj") {
            Err(Error::AssetMissing { path }) => assert!(path.ends_with("nope.obj")),
            other => panic!("expected AssetMissing, got {other:?}"),
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = scratch_dir("format");
        fs::write(dir.join("mesh.fbx"), b"").unwrap();
        let assets = FileAssets::new(&dir);
        assert!(matches!(
            assets.load_mesh("mesh.fbx"),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn obj_triangle_is_expanded_and_v_flipped() {
        let dir = scratch_dir("obj");
        fs::write(
            dir.join("tri.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n",
        )
        .unwrap();

        let mesh = FileAssets::new(&dir).load_mesh("tri.obj").unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        // first vertex: uv (0, 1 - 0), normal (0,0,1), position (0,0,0)
        assert_eq!(&mesh.vertices[..8], &[0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn png_round_trips_through_image_crate() {
        let dir = scratch_dir("png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(dir.join("tile.png"))
            .unwrap();

        let image = FileAssets::new(&dir).load_image("tile.png").unwrap();
        assert_eq!(image.size(), [3, 2]);
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 255]);
    }
}
