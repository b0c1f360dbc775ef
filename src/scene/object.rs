use glam::{Mat4, Vec3};

use crate::asset::Handle;
use crate::error::{Error, Result};
use crate::gpu::{GpuContext, TextureUnit, Uniform};
use crate::renderer::meshes::{MeshEntry, MeshLibrary};
use crate::renderer::textures::{TextureEntry, TextureLibrary};

use super::camera::Camera;
use super::catalog::{ObjectKind, ObjectType};
use super::light::Light;
use super::transform::Transform;

/// Per-frame state handed to every object's render call.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    pub light: &'a Light,
    pub meshes: &'a MeshLibrary,
    pub textures: &'a TextureLibrary,
}

/// One placed instance of a mesh and texture.
#[derive(Clone, Debug)]
pub struct SceneObject {
    object_type: ObjectType,
    kind: ObjectKind,
    mesh: Handle<MeshEntry>,
    texture: Handle<TextureEntry>,
    /// Transform at spawn time. Animated objects rotate relative to it.
    base: Transform,
    transform: Transform,
    model: Mat4,
}

impl SceneObject {
    /// Spawns `object_type` at its default placement.
    pub fn new(
        object_type: ObjectType,
        meshes: &MeshLibrary,
        textures: &TextureLibrary,
    ) -> Result<Self> {
        let spec = object_type.spec();
        let transform = Transform::from_degrees(spec.position, spec.rotation, spec.scale);
        Self::with_transform(object_type, transform, meshes, textures)
    }

    /// Resolves the type's mesh and texture once. Shadow casters must have a
    /// shadow-pass vertex array.
    pub fn with_transform(
        object_type: ObjectType,
        transform: Transform,
        meshes: &MeshLibrary,
        textures: &TextureLibrary,
    ) -> Result<Self> {
        let spec = object_type.spec();
        let mesh = meshes.handle(spec.mesh)?;
        if spec.kind.casts_shadow() {
            meshes.get(mesh)?.shadow()?;
        }
        let texture = textures.handle(spec.texture)?;
        Ok(Self {
            object_type,
            kind: spec.kind,
            mesh,
            texture,
            base: transform,
            transform,
            model: transform.matrix(),
        })
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn casts_shadow(&self) -> bool {
        self.kind.casts_shadow()
    }

    pub fn is_sky(&self) -> bool {
        self.kind.is_sky()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.base = transform;
        self.transform = transform;
        self.model = transform.matrix();
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    /// `elapsed` is seconds since the scene started.
    pub fn update(&mut self, elapsed: f32) {
        if let ObjectKind::Animated { spin } = self.kind {
            self.transform.rotation = self.base.rotation + spin * elapsed;
            self.model = self.transform.matrix();
        }
    }

    /// Main-pass draw. Lit objects sample their albedo and the shadow map.
    pub fn render(&self, gpu: &mut impl GpuContext, frame: &FrameContext<'_>) -> Result<()> {
        let mesh = frame.meshes.get(self.mesh)?;
        let texture = frame.textures.get(self.texture)?;
        let camera = frame.camera;
        let program = mesh.program;

        gpu.bind_texture(TextureUnit::Albedo, texture.texture)?;
        match self.kind {
            ObjectKind::Standard | ObjectKind::Animated { .. } => {
                let light = frame.light;
                gpu.bind_texture(TextureUnit::ShadowMap, frame.textures.depth_texture()?)?;
                for uniform in [
                    Uniform::Projection(camera.projection()),
                    Uniform::View(camera.view()),
                    Uniform::Model(self.model),
                    Uniform::LightView(light.view()),
                    Uniform::CameraPosition(camera.position()),
                    Uniform::LightPosition(light.position()),
                    Uniform::LightAmbient(light.ambient()),
                    Uniform::LightDiffuse(light.diffuse()),
                    Uniform::LightSpecular(light.specular()),
                ] {
                    gpu.set_uniform(program, uniform)?;
                }
            }
            ObjectKind::Skybox => {
                gpu.set_uniform(program, Uniform::Projection(camera.projection()))?;
                gpu.set_uniform(program, Uniform::View(camera.sky_view()))?;
            }
            ObjectKind::AdvancedSkybox => {
                let inv_proj_view = (camera.projection() * camera.sky_view()).inverse();
                gpu.set_uniform(program, Uniform::InvProjView(inv_proj_view))?;
            }
        }
        gpu.draw(mesh.vertex_array)
    }

    /// Depth-only draw from the light.
    pub fn render_shadow(&self, gpu: &mut impl GpuContext, frame: &FrameContext<'_>) -> Result<()> {
        if !self.casts_shadow() {
            return Err(Error::NotShadowCaster);
        }
        let shadow = frame.meshes.get(self.mesh)?.shadow()?;
        gpu.set_uniform(shadow.program, Uniform::Projection(frame.camera.projection()))?;
        gpu.set_uniform(shadow.program, Uniform::LightView(frame.light.view()))?;
        gpu.set_uniform(shadow.program, Uniform::Model(self.model))?;
        gpu.draw(shadow.vertex_array)
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }
}

