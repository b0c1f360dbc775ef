use std::collections::HashMap;
use std::mem;
use std::num::NonZeroU64;
use std::sync::Arc;

use log::{debug, info, warn};
use winit::window::Window;

use super::pipelines::{create_pipeline, BindingLayouts, Samplers, TextureScheme, DEPTH_FORMAT};
use super::{
    validate_draw, BufferId, DrawUniforms, FramebufferId, GpuContext, ProgramDescriptor,
    ProgramId, ProgramKind, RenderTarget, ResourceId, TextureId, TextureKind, TextureUnit,
    Uniform, VertexArrayId,
};
use crate::asset::{CubeFaces, ImageData};
use crate::error::{Error, Result};
use crate::renderer::vertex::VertexLayout;
use crate::settings::ViewerSettings;

/// Id-indexed storage. Released slots stay empty so stale ids never alias.
struct Slots<T> {
    items: Vec<Option<T>>,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn insert(&mut self, item: T) -> u32 {
        self.items.push(Some(item));
        self.items.len() as u32
    }

    fn get(&self, raw: u32) -> Option<&T> {
        let index = raw.checked_sub(1)? as usize;
        self.items.get(index)?.as_ref()
    }

    fn get_mut(&mut self, raw: u32) -> Option<&mut T> {
        let index = raw.checked_sub(1)? as usize;
        self.items.get_mut(index)?.as_mut()
    }

    fn remove(&mut self, raw: u32) -> Option<T> {
        let index = raw.checked_sub(1)? as usize;
        self.items.get_mut(index)?.take()
    }
}

struct Program {
    kind: ProgramKind,
    module: wgpu::ShaderModule,
    uniforms: DrawUniforms,
}

struct Buffer {
    buffer: wgpu::Buffer,
}

struct VertexArray {
    program: ProgramId,
    buffer: BufferId,
    vertex_count: u32,
    pipeline: wgpu::RenderPipeline,
}

struct Texture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    kind: TextureKind,
}

struct Framebuffer {
    depth: TextureId,
}

type TextureGroupKey = (TextureScheme, [Option<TextureId>; TextureUnit::COUNT]);

struct QueuedDraw {
    vertex_array: VertexArrayId,
    uniform_offset: u32,
    textures: Option<TextureGroupKey>,
}

/// One render pass worth of work: every call between two target switches.
struct Segment {
    target: RenderTarget,
    clear_color: Option<wgpu::Color>,
    clear_depth: bool,
    draws: Vec<QueuedDraw>,
}

struct FrameRecording {
    segments: Vec<Segment>,
    bound: [Option<TextureId>; TextureUnit::COUNT],
}

/// Per-draw uniform blocks packed into one buffer, addressed by dynamic offset.
struct UniformArena {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u64,
    stride: u64,
    staging: Vec<u8>,
}

impl UniformArena {
    const INITIAL_DRAWS: u64 = 256;

    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let size = mem::size_of::<DrawUniforms>() as u64;
        let stride = (size + alignment - 1) & !(alignment - 1);
        let capacity = stride * Self::INITIAL_DRAWS;
        let (buffer, bind_group) = Self::allocate(device, layout, capacity);
        Self {
            buffer,
            bind_group,
            capacity,
            stride,
            staging: Vec::new(),
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DrawUniformBuffer"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DrawUniformBindGroup"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn push(&mut self, uniforms: &DrawUniforms) -> u32 {
        let offset = self.staging.len();
        self.staging.extend_from_slice(bytemuck::bytes_of(uniforms));
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) {
        let needed = self.staging.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            debug!("Growing draw uniform buffer to {} bytes", self.capacity);
            let (buffer, bind_group) = Self::allocate(device, layout, self.capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
        self.staging.clear();
    }
}

struct ScreenDepth {
    view: wgpu::TextureView,
}

impl ScreenDepth {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ScreenDepth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view }
    }
}

/// [`GpuContext`] backed by wgpu and a winit window surface.
///
/// Calls are recorded during the frame and encoded in call order by
/// [`end_frame`](GpuContext::end_frame) onto a single command encoder.
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    screen_depth: ScreenDepth,
    layouts: BindingLayouts,
    samplers: Samplers,
    uniforms: UniformArena,
    programs: Slots<Program>,
    buffers: Slots<Buffer>,
    vertex_arrays: Slots<VertexArray>,
    textures: Slots<Texture>,
    framebuffers: Slots<Framebuffer>,
    pipelines: HashMap<(ProgramId, &'static str), wgpu::RenderPipeline>,
    texture_groups: HashMap<TextureGroupKey, wgpu::BindGroup>,
    frame: Option<FrameRecording>,
}

impl WgpuContext {
    pub async fn new(window: Arc<Window>, settings: &ViewerSettings) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|err| Error::Context(format!("failed to create surface: {err}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| Error::Context(format!("no suitable adapter: {err}")))?;
        info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| Error::Context(format!("failed to create device: {err}")))?;

        let caps = surface.get_capabilities(&adapter);
        // Shaders apply gamma themselves, so prefer a linear surface.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| Error::Context("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&caps.present_modes),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            "Surface configured: {}x{} {:?} {:?}",
            config.width, config.height, config.format, config.present_mode
        );

        let screen_depth = ScreenDepth::new(&device, config.width, config.height);
        let layouts = BindingLayouts::new(&device);
        let samplers = Samplers::new(&device);
        let uniforms = UniformArena::new(&device, &layouts.uniforms);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            screen_depth,
            layouts,
            samplers,
            uniforms,
            programs: Slots::new(),
            buffers: Slots::new(),
            vertex_arrays: Slots::new(),
            textures: Slots::new(),
            framebuffers: Slots::new(),
            pipelines: HashMap::new(),
            texture_groups: HashMap::new(),
            frame: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.screen_depth = ScreenDepth::new(&self.device, width, height);
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    fn texture(&self, texture: TextureId) -> Result<&Texture> {
        self.textures
            .get(texture.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Texture(texture)))
    }

    fn frame_mut(&mut self) -> Result<&mut FrameRecording> {
        self.frame.as_mut().ok_or(Error::NoActiveFrame)
    }

    /// Runs `create` inside a validation error scope, turning failures into errors.
    fn validated<T>(&self, label: &str, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(Error::ShaderCompile {
                label: label.to_owned(),
                reason: err.to_string(),
            }),
            None => Ok(value),
        }
    }

    fn write_rgba_level(&self, texture: &wgpu::Texture, level: u32, layer: u32, image: &image::RgbaImage) {
        let (width, height) = image.dimensions();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: level,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn bound_view(
        &self,
        bound: &[Option<TextureId>; TextureUnit::COUNT],
        unit: TextureUnit,
    ) -> Result<&wgpu::TextureView> {
        let texture = bound[unit.slot()].ok_or(Error::MissingTextureBinding(unit))?;
        Ok(&self.texture(texture)?.view)
    }

    fn texture_group(&mut self, key: TextureGroupKey) -> Result<()> {
        if self.texture_groups.contains_key(&key) {
            return Ok(());
        }
        let (scheme, bound) = key;
        let group = match scheme {
            TextureScheme::Lit => self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("LitTextureBindGroup"),
                layout: self.layouts.textures(scheme),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.bound_view(&bound, TextureUnit::Albedo)?),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.samplers.albedo),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(self.bound_view(&bound, TextureUnit::ShadowMap)?),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&self.samplers.shadow),
                    },
                ],
            }),
            TextureScheme::Cube => self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("SkyTextureBindGroup"),
                layout: self.layouts.textures(scheme),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.bound_view(&bound, TextureUnit::Albedo)?),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.samplers.cube),
                    },
                ],
            }),
        };
        self.texture_groups.insert(key, group);
        Ok(())
    }

    fn encode(&self, frame: &FrameRecording, surface_view: &wgpu::TextureView) -> Result<wgpu::CommandBuffer> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("FrameEncoder"),
            });

        for segment in &frame.segments {
            let (color_view, depth_view) = match segment.target {
                RenderTarget::Screen => (Some(surface_view), &self.screen_depth.view),
                RenderTarget::Framebuffer(id) => {
                    let framebuffer = self
                        .framebuffers
                        .get(id.raw())
                        .ok_or(Error::UnknownHandle(ResourceId::Framebuffer(id)))?;
                    (None, &self.texture(framebuffer.depth)?.view)
                }
            };

            let color_attachments = [color_view.map(|view| wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: match segment.clear_color {
                        Some(color) => wgpu::LoadOp::Clear(color),
                        None => wgpu::LoadOp::Load,
                    },
                    store: wgpu::StoreOp::Store,
                },
            })];

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(match segment.target {
                    RenderTarget::Screen => "MainPass",
                    RenderTarget::Framebuffer(_) => "ShadowPass",
                }),
                color_attachments: if color_view.is_some() {
                    &color_attachments[..]
                } else {
                    &[]
                },
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: if segment.clear_depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &segment.draws {
                let vertex_array = self
                    .vertex_arrays
                    .get(draw.vertex_array.raw())
                    .ok_or(Error::UnknownHandle(ResourceId::VertexArray(draw.vertex_array)))?;
                let buffer = self
                    .buffers
                    .get(vertex_array.buffer.raw())
                    .ok_or(Error::UnknownHandle(ResourceId::Buffer(vertex_array.buffer)))?;

                pass.set_pipeline(&vertex_array.pipeline);
                pass.set_bind_group(0, &self.uniforms.bind_group, &[draw.uniform_offset]);
                if let Some(key) = draw.textures {
                    if let Some(group) = self.texture_groups.get(&key) {
                        pass.set_bind_group(1, group, &[]);
                    }
                }
                pass.set_vertex_buffer(0, buffer.buffer.slice(..));
                pass.draw(0..vertex_array.vertex_count, 0..1);
            }
        }

        Ok(encoder.finish())
    }
}

impl GpuContext for WgpuContext {
    fn create_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Result<ProgramId> {
        let module = self.validated(descriptor.label, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.label),
                source: wgpu::ShaderSource::Wgsl(descriptor.source.into()),
            })
        })?;
        let raw = self.programs.insert(Program {
            kind: descriptor.kind,
            module,
            uniforms: DrawUniforms::default(),
        });
        debug!("Created program `{}` ({:?})", descriptor.label, descriptor.kind);
        Ok(ProgramId::from_raw(raw))
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferId> {
        use wgpu::util::DeviceExt;

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let raw = self.buffers.insert(Buffer { buffer });
        debug!("Created vertex buffer `{}` ({} floats)", label, data.len());
        Ok(BufferId::from_raw(raw))
    }

    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId> {
        let buffer_size = self
            .buffers
            .get(buffer.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Buffer(buffer)))?
            .buffer
            .size();
        let floats = buffer_size as usize / mem::size_of::<f32>();
        let vertex_count = layout
            .vertex_count(floats)
            .ok_or_else(|| Error::MalformedMesh {
                name: format!("{buffer:?}"),
                reason: format!(
                    "{floats} floats is not a whole number of `{}` vertices",
                    layout.format
                ),
            })?;

        let pipeline = match self.pipelines.get(&(program, layout.format)) {
            Some(pipeline) => pipeline.clone(),
            None => {
                let entry = self
                    .programs
                    .get(program.raw())
                    .ok_or(Error::UnknownHandle(ResourceId::Program(program)))?;
                let label = format!("{:?}Pipeline({})", entry.kind, layout.format);
                let pipeline = self.validated(&label, |device| {
                    create_pipeline(
                        device,
                        &self.layouts,
                        &label,
                        entry.kind,
                        &entry.module,
                        layout,
                        self.config.format,
                    )
                })?;
                self.pipelines.insert((program, layout.format), pipeline.clone());
                pipeline
            }
        };

        let raw = self.vertex_arrays.insert(VertexArray {
            program,
            buffer,
            vertex_count,
            pipeline,
        });
        Ok(VertexArrayId::from_raw(raw))
    }

    fn create_texture_2d(&mut self, label: &str, image: &ImageData) -> Result<TextureId> {
        let base = image::RgbaImage::from_raw(image.width, image.height, image.pixels.clone())
            .ok_or_else(|| Error::AssetDecode {
                path: label.into(),
                reason: "pixel buffer does not match dimensions".into(),
            })?;
        let mip_level_count = image.width.max(image.height).max(1).ilog2() + 1;

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut level_image = base;
        for level in 0..mip_level_count {
            if level > 0 {
                let (width, height) = level_image.dimensions();
                level_image = image::imageops::resize(
                    &level_image,
                    (width / 2).max(1),
                    (height / 2).max(1),
                    image::imageops::FilterType::Triangle,
                );
            }
            self.write_rgba_level(&texture, level, 0, &level_image);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let raw = self.textures.insert(Texture {
            _texture: texture,
            view,
            kind: TextureKind::Color2d,
        });
        debug!("Created texture `{}` ({}x{}, {} mips)", label, image.width, image.height, mip_level_count);
        Ok(TextureId::from_raw(raw))
    }

    fn create_texture_cube(&mut self, label: &str, faces: &CubeFaces) -> Result<TextureId> {
        let size = faces.face_size();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.faces().iter().enumerate() {
            let face_image = image::RgbaImage::from_raw(face.width, face.height, face.pixels.clone())
                .ok_or_else(|| Error::AssetDecode {
                    path: label.into(),
                    reason: format!("cube face {layer} does not match its dimensions"),
                })?;
            self.write_rgba_level(&texture, 0, layer as u32, &face_image);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let raw = self.textures.insert(Texture {
            _texture: texture,
            view,
            kind: TextureKind::Cube,
        });
        debug!("Created cube texture `{}` ({}px faces)", label, size);
        Ok(TextureId::from_raw(raw))
    }

    fn create_depth_texture(&mut self, label: &str, size: [u32; 2]) -> Result<TextureId> {
        if size[0] == 0 || size[1] == 0 {
            return Err(Error::Context(format!("depth texture `{label}` has zero size")));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size[0],
                height: size[1],
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let raw = self.textures.insert(Texture {
            _texture: texture,
            view,
            kind: TextureKind::Depth,
        });
        debug!("Created depth texture `{}` ({}x{})", label, size[0], size[1]);
        Ok(TextureId::from_raw(raw))
    }

    fn create_framebuffer(&mut self, depth_attachment: TextureId) -> Result<FramebufferId> {
        if self.texture(depth_attachment)?.kind != TextureKind::Depth {
            return Err(Error::Context(format!("{depth_attachment:?} is not a depth texture")));
        }
        let raw = self.framebuffers.insert(Framebuffer {
            depth: depth_attachment,
        });
        Ok(FramebufferId::from_raw(raw))
    }

    fn begin_frame(&mut self) -> Result<()> {
        if self.frame.is_some() {
            warn!("begin_frame called twice; discarding the unfinished frame");
        }
        self.uniforms.staging.clear();
        self.frame = Some(FrameRecording {
            segments: Vec::new(),
            bound: [None; TextureUnit::COUNT],
        });
        Ok(())
    }

    fn bind_framebuffer(&mut self, target: RenderTarget) -> Result<()> {
        if let RenderTarget::Framebuffer(id) = target {
            if self.framebuffers.get(id.raw()).is_none() {
                return Err(Error::UnknownHandle(ResourceId::Framebuffer(id)));
            }
        }
        self.frame_mut()?.segments.push(Segment {
            target,
            clear_color: None,
            clear_depth: false,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn clear(&mut self, color: Option<[f32; 4]>) -> Result<()> {
        let frame = self.frame_mut()?;
        let segment = frame.segments.last_mut().ok_or(Error::NoRenderTarget)?;
        let target = segment.target;
        let clear_color = match (target, color) {
            (RenderTarget::Screen, Some([r, g, b, a])) => Some(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            _ => None,
        };

        if segment.draws.is_empty() {
            segment.clear_color = clear_color.or(segment.clear_color);
            segment.clear_depth = true;
        } else {
            // Clearing after draws needs a fresh pass over the same target.
            frame.segments.push(Segment {
                target,
                clear_color,
                clear_depth: true,
                draws: Vec::new(),
            });
        }
        Ok(())
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureId) -> Result<()> {
        self.texture(texture)?;
        self.frame_mut()?.bound[unit.slot()] = Some(texture);
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramId, uniform: Uniform) -> Result<()> {
        self.programs
            .get_mut(program.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Program(program)))?
            .uniforms
            .apply(uniform);
        Ok(())
    }

    fn draw(&mut self, vertex_array: VertexArrayId) -> Result<()> {
        let frame = self.frame.as_ref().ok_or(Error::NoActiveFrame)?;
        let target = frame.segments.last().ok_or(Error::NoRenderTarget)?.target;
        let bound = frame.bound;

        let program_id = self
            .vertex_arrays
            .get(vertex_array.raw())
            .ok_or(Error::UnknownHandle(ResourceId::VertexArray(vertex_array)))?
            .program;
        let program = self
            .programs
            .get(program_id.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Program(program_id)))?;
        let kind = program.kind;
        let uniforms = program.uniforms;

        let mut bound_kinds = [None; TextureUnit::COUNT];
        for (slot, texture) in bound.iter().enumerate() {
            if let Some(texture) = texture {
                bound_kinds[slot] = Some(self.texture(*texture)?.kind);
            }
        }
        validate_draw(kind, target, bound_kinds)?;

        let textures = match TextureScheme::for_program(kind) {
            Some(scheme) => {
                let wanted = kind.texture_bindings();
                let key = (scheme, std::array::from_fn(|slot| wanted[slot].and(bound[slot])));
                self.texture_group(key)?;
                Some(key)
            }
            None => None,
        };

        let uniform_offset = self.uniforms.push(&uniforms);
        let frame = self.frame_mut()?;
        if let Some(segment) = frame.segments.last_mut() {
            segment.draws.push(QueuedDraw {
                vertex_array,
                uniform_offset,
                textures,
            });
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self.frame.take().ok_or(Error::NoActiveFrame)?;
        self.uniforms
            .upload(&self.device, &self.queue, &self.layouts.uniforms);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated; reconfiguring and dropping this frame");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring the next surface texture; dropping this frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let commands = self.encode(&frame, &surface_view)?;
        self.queue.submit(Some(commands));
        surface_texture.present();
        Ok(())
    }

    fn release_program(&mut self, program: ProgramId) -> Result<()> {
        self.programs
            .remove(program.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Program(program)))?;
        self.pipelines.retain(|(owner, _), _| *owner != program);
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferId) -> Result<()> {
        let released = self
            .buffers
            .remove(buffer.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Buffer(buffer)))?;
        released.buffer.destroy();
        Ok(())
    }

    fn release_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<()> {
        self.vertex_arrays
            .remove(vertex_array.raw())
            .ok_or(Error::UnknownHandle(ResourceId::VertexArray(vertex_array)))?;
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureId) -> Result<()> {
        self.textures
            .remove(texture.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Texture(texture)))?;
        self.texture_groups
            .retain(|(_, bound), _| !bound.contains(&Some(texture)));
        Ok(())
    }

    fn release_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()> {
        self.framebuffers
            .remove(framebuffer.raw())
            .ok_or(Error::UnknownHandle(ResourceId::Framebuffer(framebuffer)))?;
        Ok(())
    }
}
