mod common;

use std::collections::HashMap;

use biome_viewer::asset::{CubeFaces, ImageData};
use biome_viewer::gpu::{
    BufferId, FramebufferId, GpuCommand, GpuContext, ProgramDescriptor, ProgramId, ProgramKind,
    RecordingContext, RenderTarget, ResourceId, TextureId, TextureUnit, Uniform, VertexArrayId,
};
use biome_viewer::renderer::catalog::{Geometry, MeshSpec, MESHES};
use biome_viewer::renderer::{
    MeshLibrary, SceneRenderer, ShaderLibrary, TextureLibrary, VertexLayout,
};
use biome_viewer::scene::{ObjectType, SceneObject, WorldLayout};
use biome_viewer::{Error, Result, Viewer, ViewerSettings};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use common::{libraries, MemoryAssets};

/// Recording backend that fails the Nth vertex array creation or the Nth
/// texture release (1-based).
#[derive(Default)]
struct FaultyGpu {
    inner: RecordingContext,
    fail_vertex_array: Option<usize>,
    fail_texture_release: Option<usize>,
    vertex_arrays: usize,
    texture_releases: usize,
}

fn injected() -> Error {
    Error::Context("injected failure".into())
}

impl GpuContext for FaultyGpu {
    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<ProgramId> {
        self.inner.create_program(descriptor)
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferId> {
        self.inner.create_vertex_buffer(label, data)
    }

    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId> {
        self.vertex_arrays += 1;
        if self.fail_vertex_array == Some(self.vertex_arrays) {
            return Err(injected());
        }
        self.inner.create_vertex_array(program, buffer, layout)
    }

    fn create_texture_2d(&mut self, label: &str, image: &ImageData) -> Result<TextureId> {
        self.inner.create_texture_2d(label, image)
    }

    fn create_texture_cube(&mut self, label: &str, faces: &CubeFaces) -> Result<TextureId> {
        self.inner.create_texture_cube(label, faces)
    }

    fn create_depth_texture(&mut self, label: &str, size: [u32; 2]) -> Result<TextureId> {
        self.inner.create_depth_texture(label, size)
    }

    fn create_framebuffer(&mut self, depth_attachment: TextureId) -> Result<FramebufferId> {
        self.inner.create_framebuffer(depth_attachment)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.inner.begin_frame()
    }

    fn bind_framebuffer(&mut self, target: RenderTarget) -> Result<()> {
        self.inner.bind_framebuffer(target)
    }

    fn clear(&mut self, color: Option<[f32; 4]>) -> Result<()> {
        self.inner.clear(color)
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId) -> Result<()> {
        self.inner.bind_texture(unit, texture)
    }

    fn set_uniform(&mut self, program: ProgramId, uniform: Uniform) -> Result<()> {
        self.inner.set_uniform(program, uniform)
    }

    fn draw(&mut self, vertex_array: VertexArrayId) -> Result<()> {
        self.inner.draw(vertex_array)
    }

    fn end_frame(&mut self) -> Result<()> {
        self.inner.end_frame()
    }

    fn release_program(&mut self, program: ProgramId) -> Result<()> {
        self.inner.release_program(program)
    }

    fn release_buffer(&mut self, buffer: BufferId) -> Result<()> {
        self.inner.release_buffer(buffer)
    }

    fn release_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<()> {
        self.inner.release_vertex_array(vertex_array)
    }

    fn release_texture(&mut self, texture: TextureId) -> Result<()> {
        self.texture_releases += 1;
        if self.fail_texture_release == Some(self.texture_releases) {
            return Err(injected());
        }
        self.inner.release_texture(texture)
    }

    fn release_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()> {
        self.inner.release_framebuffer(framebuffer)
    }
}

fn created(gpu: &RecordingContext) -> Vec<ResourceId> {
    gpu.commands()
        .iter()
        .filter_map(|command| match command {
            GpuCommand::CreateProgram { program, .. } => Some(ResourceId::Program(*program)),
            GpuCommand::CreateBuffer { buffer, .. } => Some(ResourceId::Buffer(*buffer)),
            GpuCommand::CreateVertexArray { vertex_array, .. } => {
                Some(ResourceId::VertexArray(*vertex_array))
            }
            GpuCommand::CreateTexture { texture, .. } => Some(ResourceId::Texture(*texture)),
            GpuCommand::CreateFramebuffer { framebuffer, .. } => {
                Some(ResourceId::Framebuffer(*framebuffer))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn mesh_library_releases_each_resource_once() {
    let mut gpu = RecordingContext::new();
    let assets = MemoryAssets::new();
    let shaders = ShaderLibrary::new(&mut gpu).unwrap();
    let live_before = gpu.live_resources();
    let mut meshes = MeshLibrary::new(&mut gpu, &assets, &shaders).unwrap();

    let lit = MESHES.iter().filter(|m| m.casts_shadow()).count();
    let expected = MESHES.len() * 2 + lit;
    assert_eq!(gpu.live_resources() - live_before, expected);

    meshes.destroy(&mut gpu).unwrap();
    meshes.destroy(&mut gpu).unwrap();

    assert_eq!(gpu.releases().count(), expected);
    assert_eq!(gpu.live_resources(), live_before);
    assert!(meshes.is_empty());
}

#[test]
fn vertex_arrays_go_before_their_buffer() {
    let mut gpu = RecordingContext::new();
    let mut libs = libraries(&mut gpu, &MemoryAssets::new());
    let buffer_of: HashMap<_, _> = gpu
        .commands()
        .iter()
        .filter_map(|command| match command {
            GpuCommand::CreateVertexArray {
                vertex_array,
                buffer,
                ..
            } => Some((*vertex_array, *buffer)),
            _ => None,
        })
        .collect();

    libs.meshes.destroy(&mut gpu).unwrap();

    let mut released_buffers = Vec::new();
    for id in gpu.releases() {
        match id {
            ResourceId::VertexArray(va) => {
                assert!(!released_buffers.contains(&buffer_of[&va]), "{va:?}");
            }
            ResourceId::Buffer(buffer) => released_buffers.push(buffer),
            other => panic!("mesh library released {other:?}"),
        }
    }
    assert_eq!(released_buffers.len(), MESHES.len());
}

#[test]
fn texture_library_destroy_is_idempotent() {
    let mut gpu = RecordingContext::new();
    let mut textures = TextureLibrary::new(&mut gpu, &MemoryAssets::new(), 128).unwrap();
    let count = textures.len();
    assert!(textures.depth_texture().is_ok());

    textures.destroy(&mut gpu).unwrap();
    textures.destroy(&mut gpu).unwrap();

    assert_eq!(gpu.releases().count(), count);
    assert_eq!(gpu.live_resources(), 0);
    assert!(textures.depth_texture().is_err());
}

#[test]
fn renderer_destroy_leaves_the_depth_texture_to_its_library() {
    let mut gpu = RecordingContext::new();
    let mut textures = TextureLibrary::new(&mut gpu, &MemoryAssets::new(), 128).unwrap();
    let mut renderer = SceneRenderer::new(&mut gpu, &textures, [0.0; 4]).unwrap();
    let fbo = renderer.shadow_framebuffer().unwrap();

    renderer.destroy(&mut gpu).unwrap();
    renderer.destroy(&mut gpu).unwrap();

    assert_eq!(gpu.releases().collect::<Vec<_>>(), [ResourceId::Framebuffer(fbo)]);
    let depth = textures.depth_texture().unwrap();
    assert!(gpu.texture_kind(depth).is_some());
    textures.destroy(&mut gpu).unwrap();
}

#[test]
fn viewer_teardown_reverses_acquisition_order() {
    let mut viewer = Viewer::with_layout(
        RecordingContext::new(),
        &MemoryAssets::new(),
        &ViewerSettings::default(),
        [640, 640],
        &WorldLayout::standard().unwrap(),
        &mut SmallRng::seed_from_u64(4),
    )
    .unwrap();
    viewer.step(0.02).unwrap();

    viewer.destroy().unwrap();
    viewer.destroy().unwrap();

    let gpu = viewer.gpu();
    let mut expected = created(gpu);
    expected.reverse();
    assert_eq!(gpu.releases().collect::<Vec<_>>(), expected);
    assert!(matches!(expected.first(), Some(ResourceId::Framebuffer(_))));
    assert!(matches!(expected.last(), Some(ResourceId::Program(_))));
    assert_eq!(gpu.live_resources(), 0);
    assert!(viewer.scene().is_empty());
}

#[test]
fn missing_texture_is_fatal_and_leaks_nothing() {
    let mut gpu = RecordingContext::new();
    let assets = MemoryAssets::new().without("textures/camel.png");

    let err = TextureLibrary::new(&mut gpu, &assets, 64).err().unwrap();

    assert!(matches!(err, Error::AssetMissing { .. }));
    assert_eq!(gpu.live_resources(), 0);
}

#[test]
fn missing_mesh_is_fatal_and_leaks_nothing() {
    let mut gpu = RecordingContext::new();
    let shaders = ShaderLibrary::new(&mut gpu).unwrap();
    let live = gpu.live_resources();
    let assets = MemoryAssets::new().without("objects/tent/tent.obj");

    let err = MeshLibrary::new(&mut gpu, &assets, &shaders).err().unwrap();

    assert!(matches!(err, Error::AssetMissing { .. }));
    assert_eq!(gpu.live_resources(), live);
}

#[test]
fn viewer_startup_fails_on_missing_sky() {
    let assets = MemoryAssets::new().without("textures/skybox1/top.png");
    let result = Viewer::with_layout(
        RecordingContext::new(),
        &assets,
        &ViewerSettings::default(),
        [640, 640],
        &WorldLayout::default(),
        &mut SmallRng::seed_from_u64(0),
    );
    assert!(matches!(result, Err(Error::AssetMissing { .. })));
}

#[test]
fn shadow_casters_need_a_shadow_variant() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    // the cube registered for the sky program only
    let meshes = MeshLibrary::from_specs(
        &mut gpu,
        &MemoryAssets::new(),
        &libs.shaders,
        &[MeshSpec::builtin("cube", Geometry::Cube, ProgramKind::Skybox)],
    )
    .unwrap();

    let err = SceneObject::new(ObjectType::Cube, &meshes, &libs.textures).unwrap_err();
    assert!(matches!(err, Error::MissingShadowVariant(name) if name == "cube"));
}

#[test]
fn unknown_texture_is_reported_by_name() {
    let mut gpu = RecordingContext::new();
    let libs = libraries(&mut gpu, &MemoryAssets::new());
    let err = libs.textures.handle("marble").unwrap_err();
    assert!(matches!(err, Error::UnknownTexture(name) if name == "marble"));
}

#[test]
fn vertex_array_failure_mid_upload_leaks_nothing() {
    // 1: cube main pass, 2: cube shadow pass, 3: plane main pass
    for nth in 1..=3 {
        let mut gpu = FaultyGpu {
            fail_vertex_array: Some(nth),
            ..FaultyGpu::default()
        };
        let mut shaders = ShaderLibrary::new(&mut gpu).unwrap();
        let live = gpu.inner.live_resources();

        let err = MeshLibrary::new(&mut gpu, &MemoryAssets::new(), &shaders)
            .err()
            .unwrap();

        assert!(matches!(err, Error::Context(_)), "{nth}: {err}");
        assert_eq!(gpu.inner.live_resources(), live, "vertex array #{nth}");
        shaders.destroy(&mut gpu).unwrap();
        assert_eq!(gpu.inner.live_resources(), 0);
    }
}

#[test]
fn teardown_keeps_releasing_after_a_failed_release() {
    let gpu = FaultyGpu {
        fail_texture_release: Some(2),
        ..FaultyGpu::default()
    };
    let mut viewer = Viewer::with_layout(
        gpu,
        &MemoryAssets::new(),
        &ViewerSettings::default(),
        [640, 640],
        &WorldLayout::standard().unwrap(),
        &mut SmallRng::seed_from_u64(9),
    )
    .unwrap();

    let err = viewer.destroy().unwrap_err();

    assert!(matches!(err, Error::Context(_)));
    // only the texture whose release failed is still alive
    assert_eq!(viewer.gpu().inner.live_resources(), 1);
    assert!(viewer.gpu().inner.releases().any(|id| matches!(id, ResourceId::Program(_))));
}
