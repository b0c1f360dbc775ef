use log::{debug, error, info};

use crate::asset::{AssetCache, AssetSource, Handle};
use crate::error::{Error, Result, Teardown};
use crate::gpu::{BufferId, GpuContext, ProgramId, ProgramKind, VertexArrayId};

use super::catalog::{MeshSource, MeshSpec, MESHES};
use super::shaders::ShaderLibrary;

/// Uploaded mesh: one vertex buffer shared by the main-pass vertex array and,
/// for lit meshes, a shadow-pass vertex array.
#[derive(Debug)]
pub struct MeshEntry {
    pub name: String,
    pub buffer: BufferId,
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
    pub shadow: Option<ShadowVariant>,
    pub vertex_count: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct ShadowVariant {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
}

impl MeshEntry {
    /// The shadow-pass counterpart, required for anything that casts shadows.
    pub fn shadow(&self) -> Result<ShadowVariant> {
        self.shadow
            .ok_or_else(|| Error::MissingShadowVariant(self.name.clone()))
    }
}

#[derive(Default)]
pub struct MeshLibrary {
    meshes: AssetCache<MeshEntry>,
}

impl MeshLibrary {
    /// Uploads every mesh in the catalog.
    pub fn new(
        gpu: &mut impl GpuContext,
        assets: &dyn AssetSource,
        shaders: &ShaderLibrary,
    ) -> Result<Self> {
        Self::from_specs(gpu, assets, shaders, MESHES)
    }

    pub fn from_specs(
        gpu: &mut impl GpuContext,
        assets: &dyn AssetSource,
        shaders: &ShaderLibrary,
        specs: &[MeshSpec],
    ) -> Result<Self> {
        let mut library = Self::default();
        for spec in specs {
            // Anything uploaded so far is released before bailing out.
            if let Err(err) = library.upload(gpu, assets, shaders, spec) {
                if let Err(cleanup) = library.destroy(gpu) {
                    error!("Releasing meshes after failed upload: {}", cleanup);
                }
                return Err(err);
            }
        }
        info!("Uploaded {} meshes", library.meshes.len());
        Ok(library)
    }

    fn upload(
        &mut self,
        gpu: &mut impl GpuContext,
        assets: &dyn AssetSource,
        shaders: &ShaderLibrary,
        spec: &MeshSpec,
    ) -> Result<()> {
        let vertices = match spec.source {
            MeshSource::Builtin(geometry) => geometry.vertices(),
            MeshSource::File(path) => assets.load_mesh(path)?.vertices,
        };
        let layout = spec.layout();
        let vertex_count = match layout.vertex_count(vertices.len()) {
            Some(count) if count > 0 => count,
            _ => {
                return Err(Error::MalformedMesh {
                    name: spec.name.to_string(),
                    reason: format!(
                        "{} floats is not a non-empty list of `{}` vertices",
                        vertices.len(),
                        layout.format
                    ),
                })
            }
        };

        let program = program_of(shaders, spec.program)?;
        let shadow_program = if spec.casts_shadow() {
            Some(program_of(shaders, ProgramKind::ShadowMap)?)
        } else {
            None
        };

        // Not yet registered, so a failure here releases the mesh's own pieces.
        let buffer = gpu.create_vertex_buffer(spec.name, &vertices)?;
        let vertex_array = match gpu.create_vertex_array(program, buffer, layout) {
            Ok(vertex_array) => vertex_array,
            Err(err) => {
                release_partial(gpu, &[], buffer);
                return Err(err);
            }
        };
        let shadow = match shadow_program {
            Some(program) => match gpu.create_vertex_array(program, buffer, layout) {
                Ok(vertex_array) => Some(ShadowVariant {
                    program,
                    vertex_array,
                }),
                Err(err) => {
                    release_partial(gpu, &[vertex_array], buffer);
                    return Err(err);
                }
            },
            None => None,
        };

        debug!(
            "Mesh `{}`: {} vertices, shadow variant: {}",
            spec.name,
            vertex_count,
            shadow.is_some()
        );
        self.meshes.insert(
            spec.name,
            MeshEntry {
                name: spec.name.to_string(),
                buffer,
                program,
                vertex_array,
                shadow,
                vertex_count,
            },
        );
        Ok(())
    }

    pub fn handle(&self, name: &str) -> Result<Handle<MeshEntry>> {
        self.meshes
            .lookup(name)
            .ok_or_else(|| Error::UnknownMesh(name.to_string()))
    }

    pub fn get(&self, handle: Handle<MeshEntry>) -> Result<&MeshEntry> {
        self.meshes
            .get(handle)
            .ok_or_else(|| Error::UnknownMesh(format!("#{}", handle.index())))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Releases vertex arrays before the buffer they read from, newest mesh
    /// first. Calling it again does nothing.
    pub fn destroy(&mut self, gpu: &mut impl GpuContext) -> Result<()> {
        let mut teardown = Teardown::new();
        for mesh in self.meshes.drain() {
            if let Some(shadow) = mesh.shadow {
                teardown.check(gpu.release_vertex_array(shadow.vertex_array));
            }
            teardown.check(gpu.release_vertex_array(mesh.vertex_array));
            teardown.check(gpu.release_buffer(mesh.buffer));
        }
        teardown.finish()
    }
}

fn release_partial(gpu: &mut impl GpuContext, vertex_arrays: &[VertexArrayId], buffer: BufferId) {
    let mut teardown = Teardown::new();
    for &vertex_array in vertex_arrays {
        teardown.check(gpu.release_vertex_array(vertex_array));
    }
    teardown.check(gpu.release_buffer(buffer));
    if let Err(err) = teardown.finish() {
        error!("Releasing a partially uploaded mesh: {}", err);
    }
}

fn program_of(shaders: &ShaderLibrary, kind: ProgramKind) -> Result<ProgramId> {
    shaders
        .program(kind)
        .ok_or_else(|| Error::Context(format!("no `{kind:?}` program is loaded")))
}
