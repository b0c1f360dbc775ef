use std::mem;
use std::num::NonZeroU64;

use super::{DrawUniforms, ProgramKind};
use crate::renderer::vertex::VertexLayout;

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Texture binding scheme of group 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(super) enum TextureScheme {
    /// Albedo 2D texture + shadow map with a comparison sampler.
    Lit,
    Cube,
}

impl TextureScheme {
    pub(super) fn for_program(kind: ProgramKind) -> Option<Self> {
        match kind {
            ProgramKind::Lit => Some(TextureScheme::Lit),
            ProgramKind::ShadowMap => None,
            ProgramKind::Skybox | ProgramKind::AdvancedSkybox => Some(TextureScheme::Cube),
        }
    }
}

pub(super) struct Samplers {
    pub(super) albedo: wgpu::Sampler,
    pub(super) cube: wgpu::Sampler,
    pub(super) shadow: wgpu::Sampler,
}

impl Samplers {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let albedo = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("AlbedoSampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: 16,
            ..Default::default()
        });

        let cube = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SkySampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shadow = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ShadowSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            albedo,
            cube,
            shadow,
        }
    }
}

pub(super) struct BindingLayouts {
    pub(super) uniforms: wgpu::BindGroupLayout,
    lit_textures: wgpu::BindGroupLayout,
    cube_textures: wgpu::BindGroupLayout,
    lit_pipeline: wgpu::PipelineLayout,
    shadow_pipeline: wgpu::PipelineLayout,
    sky_pipeline: wgpu::PipelineLayout,
}

fn texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

impl BindingLayouts {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DrawUniformLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });

        let float = wgpu::TextureSampleType::Float { filterable: true };
        let lit_textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("LitTextureLayout"),
            entries: &[
                texture_entry(0, float, wgpu::TextureViewDimension::D2),
                sampler_entry(1, wgpu::SamplerBindingType::Filtering),
                texture_entry(
                    2,
                    wgpu::TextureSampleType::Depth,
                    wgpu::TextureViewDimension::D2,
                ),
                sampler_entry(3, wgpu::SamplerBindingType::Comparison),
            ],
        });

        let cube_textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SkyTextureLayout"),
            entries: &[
                texture_entry(0, float, wgpu::TextureViewDimension::Cube),
                sampler_entry(1, wgpu::SamplerBindingType::Filtering),
            ],
        });

        let pipeline_layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                push_constant_ranges: &[],
            })
        };
        let lit_pipeline = pipeline_layout("LitPipelineLayout", &[&uniforms, &lit_textures]);
        let shadow_pipeline = pipeline_layout("ShadowPipelineLayout", &[&uniforms]);
        let sky_pipeline = pipeline_layout("SkyPipelineLayout", &[&uniforms, &cube_textures]);

        Self {
            uniforms,
            lit_textures,
            cube_textures,
            lit_pipeline,
            shadow_pipeline,
            sky_pipeline,
        }
    }

    pub(super) fn textures(&self, scheme: TextureScheme) -> &wgpu::BindGroupLayout {
        match scheme {
            TextureScheme::Lit => &self.lit_textures,
            TextureScheme::Cube => &self.cube_textures,
        }
    }

    fn pipeline(&self, kind: ProgramKind) -> &wgpu::PipelineLayout {
        match TextureScheme::for_program(kind) {
            Some(TextureScheme::Lit) => &self.lit_pipeline,
            Some(TextureScheme::Cube) => &self.sky_pipeline,
            None => &self.shadow_pipeline,
        }
    }
}

/// Builds the render pipeline for drawing `layout` vertices with a program.
pub(super) fn create_pipeline(
    device: &wgpu::Device,
    layouts: &BindingLayouts,
    label: &str,
    kind: ProgramKind,
    module: &wgpu::ShaderModule,
    layout: &VertexLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let color_targets = [Some(wgpu::ColorTargetState {
        format: color_format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })];

    let (fragment, cull_mode, depth_stencil) = match kind {
        ProgramKind::Lit => (
            Some(&color_targets[..]),
            Some(wgpu::Face::Back),
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        ),
        ProgramKind::ShadowMap => (
            None,
            Some(wgpu::Face::Back),
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            },
        ),
        // Sky sits on the far plane behind everything drawn earlier.
        ProgramKind::Skybox | ProgramKind::AdvancedSkybox => (
            Some(&color_targets[..]),
            None,
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        ),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layouts.pipeline(kind)),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[layout.buffer_layout()],
            compilation_options: Default::default(),
        },
        fragment: fragment.map(|targets| wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode,
            front_face: wgpu::FrontFace::Ccw,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
