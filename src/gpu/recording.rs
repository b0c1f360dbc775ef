use std::collections::HashMap;

use log::trace;

use super::{
    validate_draw, BufferId, DrawUniforms, FramebufferId, GpuContext, ProgramDescriptor,
    ProgramId, ProgramKind, RenderTarget, ResourceId, TextureId, TextureKind, TextureUnit,
    Uniform, VertexArrayId,
};
use crate::asset::{CubeFaces, ImageData};
use crate::error::{Error, Result};
use crate::renderer::vertex::VertexLayout;

/// One call made against a [`RecordingContext`].
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCommand {
    CreateProgram {
        program: ProgramId,
        label: String,
        kind: ProgramKind,
    },
    CreateBuffer {
        buffer: BufferId,
        label: String,
        floats: usize,
    },
    CreateVertexArray {
        vertex_array: VertexArrayId,
        program: ProgramId,
        buffer: BufferId,
    },
    CreateTexture {
        texture: TextureId,
        label: String,
        kind: TextureKind,
    },
    CreateFramebuffer {
        framebuffer: FramebufferId,
        depth: TextureId,
    },
    BeginFrame,
    BindFramebuffer(RenderTarget),
    Clear {
        target: RenderTarget,
        color: Option<[f32; 4]>,
    },
    BindTexture {
        unit: TextureUnit,
        texture: TextureId,
    },
    SetUniform {
        program: ProgramId,
        uniform: Uniform,
    },
    Draw {
        vertex_array: VertexArrayId,
        program: ProgramId,
        target: RenderTarget,
        textures: [Option<TextureId>; TextureUnit::COUNT],
        uniforms: Box<DrawUniforms>,
    },
    EndFrame,
    Release(ResourceId),
}

/// Snapshot of a recorded draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedDraw<'a> {
    pub vertex_array: VertexArrayId,
    pub program: ProgramId,
    pub target: RenderTarget,
    pub textures: [Option<TextureId>; TextureUnit::COUNT],
    pub uniforms: &'a DrawUniforms,
}

struct VertexArrayRecord {
    program: ProgramId,
    buffer: BufferId,
}

/// Headless [`GpuContext`] that validates every call and logs it.
///
/// Ids are allocated from one counter so no two resources ever share a raw id.
#[derive(Default)]
pub struct RecordingContext {
    next_id: u32,
    log: Vec<GpuCommand>,
    programs: HashMap<ProgramId, ProgramKind>,
    uniforms: HashMap<ProgramId, DrawUniforms>,
    buffers: HashMap<BufferId, usize>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayRecord>,
    textures: HashMap<TextureId, TextureKind>,
    framebuffers: HashMap<FramebufferId, TextureId>,
    in_frame: bool,
    target: Option<RenderTarget>,
    bound: [Option<TextureId>; TextureUnit::COUNT],
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = RecordedDraw<'_>> {
        self.log.iter().filter_map(|command| match command {
            GpuCommand::Draw {
                vertex_array,
                program,
                target,
                textures,
                uniforms,
            } => Some(RecordedDraw {
                vertex_array: *vertex_array,
                program: *program,
                target: *target,
                textures: *textures,
                uniforms,
            }),
            _ => None,
        })
    }

    /// Every resource release in call order.
    pub fn releases(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.log.iter().filter_map(|command| match command {
            GpuCommand::Release(id) => Some(*id),
            _ => None,
        })
    }

    pub fn live_resources(&self) -> usize {
        self.programs.len()
            + self.buffers.len()
            + self.vertex_arrays.len()
            + self.textures.len()
            + self.framebuffers.len()
    }

    pub fn framebuffer_attachment(&self, framebuffer: FramebufferId) -> Option<TextureId> {
        self.framebuffers.get(&framebuffer).copied()
    }

    pub fn texture_kind(&self, texture: TextureId) -> Option<TextureKind> {
        self.textures.get(&texture).copied()
    }

    pub fn program_kind(&self, program: ProgramId) -> Option<ProgramKind> {
        self.programs.get(&program).copied()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn push(&mut self, command: GpuCommand) {
        trace!("{:?}", command);
        self.log.push(command);
    }

    fn frame_target(&self) -> Result<RenderTarget> {
        if !self.in_frame {
            return Err(Error::NoActiveFrame);
        }
        self.target.ok_or(Error::NoRenderTarget)
    }

    fn release<K: std::hash::Hash + Eq, V>(
        map: &mut HashMap<K, V>,
        key: K,
        id: ResourceId,
    ) -> Result<V> {
        map.remove(&key).ok_or(Error::UnknownHandle(id))
    }
}

impl GpuContext for RecordingContext {
    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<ProgramId> {
        if !descriptor.source.contains("vs_main") {
            return Err(Error::ShaderCompile {
                label: descriptor.label.to_owned(),
                reason: "missing entry point `vs_main`".into(),
            });
        }
        let program = ProgramId::from_raw(self.allocate());
        self.programs.insert(program, descriptor.kind);
        self.uniforms.insert(program, DrawUniforms::default());
        self.push(GpuCommand::CreateProgram {
            program,
            label: descriptor.label.to_owned(),
            kind: descriptor.kind,
        });
        Ok(program)
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferId> {
        let buffer = BufferId::from_raw(self.allocate());
        self.buffers.insert(buffer, data.len());
        self.push(GpuCommand::CreateBuffer {
            buffer,
            label: label.to_owned(),
            floats: data.len(),
        });
        Ok(buffer)
    }

    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId> {
        if !self.programs.contains_key(&program) {
            return Err(Error::UnknownHandle(ResourceId::Program(program)));
        }
        let floats = *self
            .buffers
            .get(&buffer)
            .ok_or(Error::UnknownHandle(ResourceId::Buffer(buffer)))?;
        if floats % layout.floats_per_vertex != 0 {
            return Err(Error::MalformedMesh {
                name: format!("{buffer:?}"),
                reason: format!("{floats} floats is not a whole number of `{}` vertices", layout.format),
            });
        }

        let vertex_array = VertexArrayId::from_raw(self.allocate());
        self.vertex_arrays
            .insert(vertex_array, VertexArrayRecord { program, buffer });
        self.push(GpuCommand::CreateVertexArray {
            vertex_array,
            program,
            buffer,
        });
        Ok(vertex_array)
    }

    fn create_texture_2d(&mut self, label: &str, _image: &ImageData) -> Result<TextureId> {
        let texture = TextureId::from_raw(self.allocate());
        self.textures.insert(texture, TextureKind::Color2d);
        self.push(GpuCommand::CreateTexture {
            texture,
            label: label.to_owned(),
            kind: TextureKind::Color2d,
        });
        Ok(texture)
    }

    fn create_texture_cube(&mut self, label: &str, _faces: &CubeFaces) -> Result<TextureId> {
        let texture = TextureId::from_raw(self.allocate());
        self.textures.insert(texture, TextureKind::Cube);
        self.push(GpuCommand::CreateTexture {
            texture,
            label: label.to_owned(),
            kind: TextureKind::Cube,
        });
        Ok(texture)
    }

    fn create_depth_texture(&mut self, label: &str, size: [u32; 2]) -> Result<TextureId> {
        if size[0] == 0 || size[1] == 0 {
            return Err(Error::Context(format!("depth texture `{label}` has zero size")));
        }
        let texture = TextureId::from_raw(self.allocate());
        self.textures.insert(texture, TextureKind::Depth);
        self.push(GpuCommand::CreateTexture {
            texture,
            label: label.to_owned(),
            kind: TextureKind::Depth,
        });
        Ok(texture)
    }

    fn create_framebuffer(&mut self, depth_attachment: TextureId) -> Result<FramebufferId> {
        match self.textures.get(&depth_attachment) {
            Some(TextureKind::Depth) => {}
            Some(_) => {
                return Err(Error::Context(format!(
                    "{depth_attachment:?} is not a depth texture"
                )))
            }
            None => return Err(Error::UnknownHandle(ResourceId::Texture(depth_attachment))),
        }
        let framebuffer = FramebufferId::from_raw(self.allocate());
        self.framebuffers.insert(framebuffer, depth_attachment);
        self.push(GpuCommand::CreateFramebuffer {
            framebuffer,
            depth: depth_attachment,
        });
        Ok(framebuffer)
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.in_frame = true;
        self.target = None;
        self.bound = [None; TextureUnit::COUNT];
        self.push(GpuCommand::BeginFrame);
        Ok(())
    }

    fn bind_framebuffer(&mut self, target: RenderTarget) -> Result<()> {
        if !self.in_frame {
            return Err(Error::NoActiveFrame);
        }
        if let RenderTarget::Framebuffer(id) = target {
            if !self.framebuffers.contains_key(&id) {
                return Err(Error::UnknownHandle(ResourceId::Framebuffer(id)));
            }
        }
        self.target = Some(target);
        self.push(GpuCommand::BindFramebuffer(target));
        Ok(())
    }

    fn clear(&mut self, color: Option<[f32; 4]>) -> Result<()> {
        let target = self.frame_target()?;
        self.push(GpuCommand::Clear { target, color });
        Ok(())
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId) -> Result<()> {
        if !self.textures.contains_key(&texture) {
            return Err(Error::UnknownHandle(ResourceId::Texture(texture)));
        }
        self.bound[unit.slot()] = Some(texture);
        self.push(GpuCommand::BindTexture { unit, texture });
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramId, uniform: Uniform) -> Result<()> {
        let state = self
            .uniforms
            .get_mut(&program)
            .ok_or(Error::UnknownHandle(ResourceId::Program(program)))?;
        state.apply(uniform);
        self.push(GpuCommand::SetUniform { program, uniform });
        Ok(())
    }

    fn draw(&mut self, vertex_array: VertexArrayId) -> Result<()> {
        let target = self.frame_target()?;
        let record = self
            .vertex_arrays
            .get(&vertex_array)
            .ok_or(Error::UnknownHandle(ResourceId::VertexArray(vertex_array)))?;
        let program = record.program;
        let kind = self.programs[&program];

        let mut bound_kinds = [None; TextureUnit::COUNT];
        for (slot, texture) in self.bound.iter().enumerate() {
            if let Some(texture) = texture {
                let kind = self
                    .textures
                    .get(texture)
                    .ok_or(Error::UnknownHandle(ResourceId::Texture(*texture)))?;
                bound_kinds[slot] = Some(*kind);
            }
        }
        validate_draw(kind, target, bound_kinds)?;

        let textures = std::array::from_fn(|slot| {
            kind.texture_bindings()[slot].and(self.bound[slot])
        });
        let uniforms = Box::new(self.uniforms[&program]);
        self.push(GpuCommand::Draw {
            vertex_array,
            program,
            target,
            textures,
            uniforms,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if !self.in_frame {
            return Err(Error::NoActiveFrame);
        }
        self.in_frame = false;
        self.target = None;
        self.push(GpuCommand::EndFrame);
        Ok(())
    }

    fn release_program(&mut self, program: ProgramId) -> Result<()> {
        let id = ResourceId::Program(program);
        Self::release(&mut self.programs, program, id)?;
        self.uniforms.remove(&program);
        self.push(GpuCommand::Release(id));
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferId) -> Result<()> {
        let id = ResourceId::Buffer(buffer);
        Self::release(&mut self.buffers, buffer, id)?;
        self.push(GpuCommand::Release(id));
        Ok(())
    }

    fn release_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<()> {
        let id = ResourceId::VertexArray(vertex_array);
        let record = Self::release(&mut self.vertex_arrays, vertex_array, id)?;
        trace!(
            "released vertex array over {:?} / {:?}",
            record.program,
            record.buffer
        );
        self.push(GpuCommand::Release(id));
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureId) -> Result<()> {
        let id = ResourceId::Texture(texture);
        Self::release(&mut self.textures, texture, id)?;
        self.push(GpuCommand::Release(id));
        Ok(())
    }

    fn release_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()> {
        let id = ResourceId::Framebuffer(framebuffer);
        Self::release(&mut self.framebuffers, framebuffer, id)?;
        self.push(GpuCommand::Release(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADER: &str = "@vertex fn vs_main() {}";

    fn program(ctx: &mut RecordingContext, kind: ProgramKind) -> ProgramId {
        ctx.create_program(&ProgramDescriptor {
            label: "test",
            kind,
            source: SHADER,
        })
        .unwrap()
    }

    #[test]
    fn double_release_is_rejected() {
        let mut ctx = RecordingContext::new();
        let buffer = ctx.create_vertex_buffer("b", &[0.0; 3]).unwrap();

        ctx.release_buffer(buffer).unwrap();
        assert!(matches!(
            ctx.release_buffer(buffer),
            Err(Error::UnknownHandle(ResourceId::Buffer(_)))
        ));
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn draw_outside_a_frame_fails() {
        let mut ctx = RecordingContext::new();
        let program = program(&mut ctx, ProgramKind::Skybox);
        let buffer = ctx.create_vertex_buffer("sky", &[0.0; 9]).unwrap();
        let va = ctx
            .create_vertex_array(program, buffer, &VertexLayout::POSITION)
            .unwrap();

        assert!(matches!(ctx.draw(va), Err(Error::NoActiveFrame)));
    }

    #[test]
    fn vertex_array_rejects_partial_vertices() {
        let mut ctx = RecordingContext::new();
        let program = program(&mut ctx, ProgramKind::Lit);
        let buffer = ctx.create_vertex_buffer("bad", &[0.0; 10]).unwrap();

        assert!(matches!(
            ctx.create_vertex_array(program, buffer, &VertexLayout::TEXTURED),
            Err(Error::MalformedMesh { .. })
        ));
    }

    #[test]
    fn depth_programs_ignore_stale_texture_bindings() {
        let mut ctx = RecordingContext::new();
        let shadow = program(&mut ctx, ProgramKind::ShadowMap);
        let buffer = ctx.create_vertex_buffer("tri", &[0.0; 24]).unwrap();
        let va = ctx
            .create_vertex_array(shadow, buffer, &VertexLayout::TEXTURED)
            .unwrap();
        let depth = ctx.create_depth_texture("depth", [4, 4]).unwrap();
        let fbo = ctx.create_framebuffer(depth).unwrap();

        ctx.begin_frame().unwrap();
        ctx.bind_framebuffer(RenderTarget::Framebuffer(fbo)).unwrap();
        ctx.bind_texture(TextureUnit::ShadowMap, depth).unwrap();
        // depth programs sample nothing, so a stale binding is ignored
        ctx.draw(va).unwrap();

        let draw = ctx.draws().next().unwrap();
        assert_eq!(draw.textures, [None, None]);
    }

    #[test]
    fn draw_snapshots_program_uniforms() {
        let mut ctx = RecordingContext::new();
        let sky = program(&mut ctx, ProgramKind::Skybox);
        let buffer = ctx.create_vertex_buffer("sky", &[0.0; 9]).unwrap();
        let va = ctx
            .create_vertex_array(sky, buffer, &VertexLayout::POSITION)
            .unwrap();
        let cube = ctx.create_texture_cube("cube", &test_faces()).unwrap();

        ctx.begin_frame().unwrap();
        ctx.bind_framebuffer(RenderTarget::Screen).unwrap();
        ctx.bind_texture(TextureUnit::Albedo, cube).unwrap();
        ctx.set_uniform(sky, Uniform::CameraPosition(glam::Vec3::X)).unwrap();
        ctx.draw(va).unwrap();

        let draw = ctx.draws().next().unwrap();
        assert_eq!(draw.uniforms.cam_pos, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(draw.textures, [Some(cube), None]);
    }

    fn test_faces() -> CubeFaces {
        let face = || ImageData::solid(1, 1, [0; 4]);
        CubeFaces::new([face(), face(), face(), face(), face(), face()]).unwrap()
    }
}
