//! Bind group layouts and the four render pipelines.

use std::num::NonZeroU64;

use super::{ObjectUniforms, DEPTH_FORMAT};
use crate::mesh::{MeshVertex, SkyVertex};
use crate::render::TrailVertex;
use crate::shader;
use crate::VertexLayout;

pub(super) struct Layouts {
    /// Group 0: per-frame uniforms.
    pub frame: wgpu::BindGroupLayout,
    /// Group 1 of lit and marker draws: per-draw uniforms, dynamic offset.
    pub object: wgpu::BindGroupLayout,
    /// Group 2 of lit draws: surface texture.
    pub texture: wgpu::BindGroupLayout,
    /// Group 1 of the skybox: cube texture.
    pub cube: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
                },
                count: None,
            }],
        });

        Self {
            frame,
            object,
            texture: sampled_layout(device, "Texture Bind Group Layout", wgpu::TextureViewDimension::D2),
            cube: sampled_layout(device, "Cube Bind Group Layout", wgpu::TextureViewDimension::Cube),
        }
    }
}

fn sampled_layout(
    device: &wgpu::Device,
    label: &str,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub(super) struct Pipelines {
    pub body: wgpu::RenderPipeline,
    pub marker: wgpu::RenderPipeline,
    pub trail: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
}

struct PipelineSpec<'a> {
    label: &'a str,
    source: String,
    bind_groups: &'a [&'a wgpu::BindGroupLayout],
    vertex: wgpu::VertexBufferLayout<'static>,
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

/// Premultiplied colour over what is already drawn.
const PREMULTIPLIED: wgpu::BlendState = wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING;

/// Colour added onto what is already drawn.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::OVER,
};

impl Pipelines {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, layouts: &Layouts) -> Self {
        let body = build(
            device,
            format,
            PipelineSpec {
                label: "Body",
                source: shader::body_shader(),
                bind_groups: &[&layouts.frame, &layouts.object, &layouts.texture],
                vertex: MeshVertex::buffer_layout(),
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let marker = build(
            device,
            format,
            PipelineSpec {
                label: "Marker",
                source: shader::marker_shader(),
                bind_groups: &[&layouts.frame, &layouts.object],
                vertex: MeshVertex::buffer_layout(),
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: PREMULTIPLIED,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let trail = build(
            device,
            format,
            PipelineSpec {
                label: "Trail",
                source: shader::trail_shader(),
                bind_groups: &[&layouts.frame],
                vertex: TrailVertex::buffer_layout(),
                topology: wgpu::PrimitiveTopology::LineStrip,
                blend: ADDITIVE,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let skybox = build(
            device,
            format,
            PipelineSpec {
                label: "Skybox",
                source: shader::skybox_shader(),
                bind_groups: &[&layouts.frame, &layouts.cube],
                vertex: SkyVertex::buffer_layout(),
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );

        Self {
            body,
            marker,
            trail,
            skybox,
        }
    }
}

fn build(device: &wgpu::Device, format: wgpu::TextureFormat, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{} Shader", spec.label)),
        source: wgpu::ShaderSource::Wgsl(spec.source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", spec.label)),
        bind_group_layouts: spec.bind_groups,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", spec.label)),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[spec.vertex],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Spheres are drawn mirrored about x, so winding varies per draw.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
