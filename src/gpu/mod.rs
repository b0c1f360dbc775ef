//! Graphics context collaborator.
//!
//! The renderer talks to the GPU only through [`GpuContext`]: create a resource,
//! bind it, write to it, draw with it, release it. [`WgpuContext`] drives a real
//! window surface; [`RecordingContext`] runs headless and keeps a log of every
//! call so the render protocol can be inspected.

mod pipelines;
pub mod recording;
pub mod uniforms;
pub mod wgpu_context;

pub use recording::{GpuCommand, RecordingContext};
pub use uniforms::DrawUniforms;
pub use wgpu_context::WgpuContext;

use glam::{Mat4, Vec3};

use crate::asset::{CubeFaces, ImageData};
use crate::error::{Error, Result};
use crate::renderer::vertex::VertexLayout;

macro_rules! gpu_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

gpu_id!(
    /// Linked shader program.
    ProgramId
);
gpu_id!(
    /// Vertex buffer holding interleaved `f32` attributes.
    BufferId
);
gpu_id!(
    /// Association of a vertex buffer layout with a program's inputs.
    VertexArrayId
);
gpu_id!(TextureId);
gpu_id!(FramebufferId);

/// Any GPU object, used for lifecycle bookkeeping and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Program(ProgramId),
    Buffer(BufferId),
    VertexArray(VertexArrayId),
    Texture(TextureId),
    Framebuffer(FramebufferId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The visible surface and its depth buffer.
    Screen,
    Framebuffer(FramebufferId),
}

/// Sampling slots. The shadow map always lives in its own slot so it never
/// aliases an object's albedo texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    Albedo = 0,
    ShadowMap = 1,
}

impl TextureUnit {
    pub const COUNT: usize = 2;

    pub const fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Color2d,
    Cube,
    Depth,
}

/// How a program is wired into the pipeline: which targets it renders to and
/// which textures it samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Lit, textured geometry that samples the shadow map. Screen only.
    Lit,
    /// Depth-only geometry rendered from the light. Framebuffers only.
    ShadowMap,
    /// Cube-mapped sky drawn with a rotation-only view. Screen only.
    Skybox,
    /// Screen-covering triangle reconstructing view rays. Screen only.
    AdvancedSkybox,
}

impl ProgramKind {
    pub fn accepts(self, target: RenderTarget) -> bool {
        match self {
            ProgramKind::ShadowMap => matches!(target, RenderTarget::Framebuffer(_)),
            _ => matches!(target, RenderTarget::Screen),
        }
    }

    /// Texture kinds this program expects at each unit.
    pub fn texture_bindings(self) -> [Option<TextureKind>; TextureUnit::COUNT] {
        match self {
            ProgramKind::Lit => [Some(TextureKind::Color2d), Some(TextureKind::Depth)],
            ProgramKind::ShadowMap => [None, None],
            ProgramKind::Skybox | ProgramKind::AdvancedSkybox => [Some(TextureKind::Cube), None],
        }
    }
}

/// Checks a draw against the program's wiring: target kind and the texture kind
/// bound at each unit the program samples.
pub(crate) fn validate_draw(
    kind: ProgramKind,
    target: RenderTarget,
    bound: [Option<TextureKind>; TextureUnit::COUNT],
) -> Result<()> {
    if !kind.accepts(target) {
        return Err(Error::TargetMismatch(target));
    }
    for unit in [TextureUnit::Albedo, TextureUnit::ShadowMap] {
        match (kind.texture_bindings()[unit.slot()], bound[unit.slot()]) {
            (Some(_), None) => return Err(Error::MissingTextureBinding(unit)),
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(Error::TextureKindMismatch { unit })
            }
            _ => {}
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug)]
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub kind: ProgramKind,
    /// WGSL source with `vs_main` and, except for depth-only programs, `fs_main`.
    pub source: &'a str,
}

/// A single shader input write. Values persist on the program until overwritten.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    Projection(Mat4),
    View(Mat4),
    Model(Mat4),
    LightView(Mat4),
    InvProjView(Mat4),
    CameraPosition(Vec3),
    LightPosition(Vec3),
    LightAmbient(Vec3),
    LightDiffuse(Vec3),
    LightSpecular(Vec3),
}

/// Primitive operations the renderer needs from a graphics backend.
///
/// Calls are sequential. Everything issued between [`begin_frame`] and
/// [`end_frame`] executes in call order, so a framebuffer written earlier in
/// the frame is fully written before a later draw samples its attachment.
///
/// [`begin_frame`]: GpuContext::begin_frame
/// [`end_frame`]: GpuContext::end_frame
pub trait GpuContext {
    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<ProgramId>;
    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferId>;
    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId>;
    fn create_texture_2d(&mut self, label: &str, image: &ImageData) -> Result<TextureId>;
    fn create_texture_cube(&mut self, label: &str, faces: &CubeFaces) -> Result<TextureId>;
    fn create_depth_texture(&mut self, label: &str, size: [u32; 2]) -> Result<TextureId>;
    fn create_framebuffer(&mut self, depth_attachment: TextureId) -> Result<FramebufferId>;

    fn begin_frame(&mut self) -> Result<()>;
    fn bind_framebuffer(&mut self, target: RenderTarget) -> Result<()>;
    /// Clears depth of the bound target, and color when given and the target has one.
    fn clear(&mut self, color: Option<[f32; 4]>) -> Result<()>;
    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId) -> Result<()>;
    fn set_uniform(&mut self, program: ProgramId, uniform: Uniform) -> Result<()>;
    fn draw(&mut self, vertex_array: VertexArrayId) -> Result<()>;
    fn end_frame(&mut self) -> Result<()>;

    fn release_program(&mut self, program: ProgramId) -> Result<()>;
    fn release_buffer(&mut self, buffer: BufferId) -> Result<()>;
    fn release_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<()>;
    fn release_texture(&mut self, texture: TextureId) -> Result<()>;
    fn release_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_programs_only_draw_into_framebuffers() {
        let fbo = RenderTarget::Framebuffer(FramebufferId::from_raw(1));
        assert!(ProgramKind::ShadowMap.accepts(fbo));
        assert!(!ProgramKind::ShadowMap.accepts(RenderTarget::Screen));
        assert!(!ProgramKind::Lit.accepts(fbo));
    }

    #[test]
    fn lit_draw_needs_albedo_and_depth() {
        let lit = ProgramKind::Lit;
        let screen = RenderTarget::Screen;
        assert!(validate_draw(lit, screen, [Some(TextureKind::Color2d), Some(TextureKind::Depth)]).is_ok());
        assert!(matches!(
            validate_draw(lit, screen, [Some(TextureKind::Color2d), None]),
            Err(Error::MissingTextureBinding(TextureUnit::ShadowMap))
        ));
        assert!(matches!(
            validate_draw(lit, screen, [Some(TextureKind::Cube), Some(TextureKind::Depth)]),
            Err(Error::TextureKindMismatch { unit: TextureUnit::Albedo })
        ));
    }
}
