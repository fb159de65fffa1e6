//! The wgpu implementation of [`RenderBackend`].
//!
//! The scene submits [`DrawCommand`]s between [`RenderBackend::begin_frame`]
//! and [`Renderer::render`]. Rendering happens in one pass, in this order:
//!
//! 1. the skybox, at the far plane, without depth writes
//! 2. bodies and model meshes, depth tested and written
//! 3. comet trails, additively blended
//! 4. selection markers, alpha blended
//!
//! Per-draw transforms live in one uniform buffer addressed with dynamic
//! offsets, so a frame costs two buffer writes regardless of how many
//! bodies it draws.

mod pipelines;
mod resources;

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use winit::window::Window;

use crate::error::GpuError;
use crate::mesh::{self, MeshData};
use crate::model;
use crate::render::{
    DrawCommand, FrameView, GeometryHandle, MeshHandle, RenderBackend, Shading, SphereGeometry, TextureHandle,
    TrailHandle, TrailVertex, MAX_OCCLUDERS,
};
use crate::textures::{CubeFaces, TextureData};

use pipelines::{Layouts, Pipelines};
use resources::{GpuGeometry, GpuMesh, GpuTrail};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_OBJECT_SLOTS: usize = 64;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    sky_view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    light: [f32; 4],
    occluders: [[f32; 4]; MAX_OCCLUDERS],
    occluder_count: u32,
    _pad: [u32; 3],
}

impl FrameUniforms {
    fn new(view: &FrameView) -> Self {
        let mut occluders = [[0.0; 4]; MAX_OCCLUDERS];
        for (slot, o) in occluders.iter_mut().zip(&view.occluders) {
            *slot = [o.center.x, o.center.y, o.center.z, o.radius];
        }
        // The skybox follows the camera's rotation only.
        let rotation = Mat4::from_mat3(Mat3::from_mat4(view.view));
        Self {
            view_proj: (view.projection * view.view).to_cols_array_2d(),
            sky_view_proj: (view.projection * rotation).to_cols_array_2d(),
            eye: view.eye.extend(1.0).to_array(),
            light: view.light_position.extend(1.0).to_array(),
            occluders,
            occluder_count: view.occluders.len().min(MAX_OCCLUDERS) as u32,
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
}

impl ObjectUniforms {
    fn new(transform: Mat4, tint: Vec3, shading: Shading) -> Self {
        let unlit = match shading {
            Shading::Lit => 0.0,
            Shading::Unlit => 1.0,
        };
        Self {
            model: transform.to_cols_array_2d(),
            tint: tint.extend(unlit).to_array(),
        }
    }

    fn for_command(command: &DrawCommand) -> Option<Self> {
        match *command {
            DrawCommand::Body { transform, shading, .. } | DrawCommand::Mesh { transform, shading, .. } => {
                Some(Self::new(transform, Vec3::ONE, shading))
            }
            DrawCommand::Marker { transform, color, .. } => Some(Self::new(transform, color, Shading::Lit)),
            DrawCommand::Skybox | DrawCommand::Trail { .. } => None,
        }
    }
}

struct ObjectBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl ObjectBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let size = std::mem::size_of::<ObjectUniforms>() as u64;
        let stride = size.div_ceil(alignment) * alignment;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(size),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

/// Window surface, pipelines and every uploaded resource.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    layouts: Layouts,
    pipelines: Pipelines,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    objects: ObjectBuffer,
    surface_sampler: wgpu::Sampler,
    sky_sampler: wgpu::Sampler,
    fallback_texture: wgpu::BindGroup,
    textures: Vec<wgpu::BindGroup>,
    geometries: Vec<GpuGeometry>,
    meshes: Vec<GpuMesh>,
    trails: Vec<GpuTrail>,
    sky_cube: wgpu::Buffer,
    sky_vertex_count: u32,
    skybox: Option<wgpu::BindGroup>,
    view: Option<FrameView>,
    draws: Vec<DrawCommand>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = resources::create_depth_texture(&device, &config);
        let layouts = Layouts::new(&device);
        let pipelines = Pipelines::new(&device, surface_format, &layouts);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });
        let objects = ObjectBuffer::new(&device, &layouts.object, INITIAL_OBJECT_SLOTS);

        let surface_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Surface Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let sky_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sky Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let fallback_texture = resources::upload_texture(
            &device,
            &queue,
            &layouts.texture,
            &surface_sampler,
            "Fallback Texture",
            &TextureData::solid([255, 255, 255, 255]),
        );

        let cube = mesh::skybox_cube();
        let sky_cube = resources::create_sky_cube(&device, &cube);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            layouts,
            pipelines,
            frame_buffer,
            frame_bind_group,
            objects,
            surface_sampler,
            sky_sampler,
            fallback_texture,
            textures: Vec::new(),
            geometries: Vec::new(),
            meshes: Vec::new(),
            trails: Vec::new(),
            sky_cube,
            sky_vertex_count: cube.len() as u32,
            skybox: None,
            view: None,
            draws: Vec::new(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = resources::create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Width over height of the surface.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Draw everything submitted since the last [`RenderBackend::begin_frame`].
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let offsets = self.write_object_uniforms();
        let Some(view) = &self.view else {
            return Ok(());
        };
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&FrameUniforms::new(view)));

        let output = self.surface.get_current_texture()?;
        let target = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            if let Some(sky) = &self.skybox {
                if self.draws.contains(&DrawCommand::Skybox) {
                    render_pass.set_pipeline(&self.pipelines.skybox);
                    render_pass.set_bind_group(1, sky, &[]);
                    render_pass.set_vertex_buffer(0, self.sky_cube.slice(..));
                    render_pass.draw(0..self.sky_vertex_count, 0..1);
                }
            }

            render_pass.set_pipeline(&self.pipelines.body);
            for (command, offset) in self.draws.iter().zip(&offsets) {
                let (geometry, texture) = match *command {
                    DrawCommand::Body { geometry, texture, .. } => match self.geometries.get(geometry.index()) {
                        Some(g) => (g, texture),
                        None => continue,
                    },
                    DrawCommand::Mesh { mesh, .. } => match self.meshes.get(mesh.index()) {
                        Some(m) => (&m.geometry, m.texture),
                        None => continue,
                    },
                    _ => continue,
                };
                let Some(offset) = offset else { continue };
                render_pass.set_bind_group(1, &self.objects.bind_group, &[*offset]);
                render_pass.set_bind_group(2, self.texture_bind_group(texture), &[]);
                draw_indexed(&mut render_pass, geometry);
            }

            render_pass.set_pipeline(&self.pipelines.trail);
            for command in &self.draws {
                if let DrawCommand::Trail { trail } = command {
                    if let Some(trail) = self.trails.get(trail.index()).filter(|t| t.count >= 2) {
                        render_pass.set_vertex_buffer(0, trail.buffer.slice(..trail.byte_len()));
                        render_pass.draw(0..trail.count as u32, 0..1);
                    }
                }
            }

            render_pass.set_pipeline(&self.pipelines.marker);
            for (command, offset) in self.draws.iter().zip(&offsets) {
                if let (DrawCommand::Marker { geometry, .. }, Some(offset)) = (command, offset) {
                    if let Some(geometry) = self.geometries.get(geometry.index()) {
                        render_pass.set_bind_group(1, &self.objects.bind_group, &[*offset]);
                        draw_indexed(&mut render_pass, geometry);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn texture_bind_group(&self, handle: TextureHandle) -> &wgpu::BindGroup {
        self.textures.get(handle.index()).unwrap_or(&self.fallback_texture)
    }

    /// Pack per-draw uniforms; returns each draw's dynamic offset.
    fn write_object_uniforms(&mut self) -> Vec<Option<u32>> {
        let uniforms: Vec<Option<ObjectUniforms>> = self.draws.iter().map(ObjectUniforms::for_command).collect();
        let needed = uniforms.iter().flatten().count();
        if needed == 0 {
            return vec![None; uniforms.len()];
        }
        if needed > self.objects.capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("Growing object uniform buffer to {} slots", capacity);
            self.objects = ObjectBuffer::new(&self.device, &self.layouts.object, capacity);
        }

        let stride = self.objects.stride as usize;
        let mut bytes = vec![0u8; stride * needed];
        let mut slot = 0;
        let offsets = uniforms
            .iter()
            .map(|u| {
                u.map(|u| {
                    let start = slot * stride;
                    bytes[start..start + std::mem::size_of::<ObjectUniforms>()].copy_from_slice(bytemuck::bytes_of(&u));
                    slot += 1;
                    start as u32
                })
            })
            .collect();
        self.queue.write_buffer(&self.objects.buffer, 0, &bytes);
        offsets
    }

    fn upload_mesh(&self, label: &str, data: &MeshData) -> GpuGeometry {
        GpuGeometry::upload(&self.device, label, data)
    }
}

fn draw_indexed(render_pass: &mut wgpu::RenderPass<'_>, geometry: &GpuGeometry) {
    if geometry.index_count == 0 {
        return;
    }
    render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
    render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..geometry.index_count, 0, 0..1);
}

impl RenderBackend for Renderer {
    fn create_sphere_geometry(&mut self, rings: u32, sectors: u32) -> SphereGeometry {
        let geometry = self.upload_mesh("Sphere", &mesh::uv_sphere(rings, sectors));
        let index_count = geometry.index_count;
        self.geometries.push(geometry);
        SphereGeometry {
            handle: GeometryHandle::new(self.geometries.len() as u32 - 1),
            index_count,
        }
    }

    fn load_texture(&mut self, path: &Path) -> TextureHandle {
        let pixels = match TextureData::from_file(path) {
            Ok(pixels) => pixels,
            Err(e) => {
                log::warn!("Texture {} failed to load: {}", path.display(), e);
                return TextureHandle::MISSING;
            }
        };
        let bind_group = resources::upload_texture(
            &self.device,
            &self.queue,
            &self.layouts.texture,
            &self.surface_sampler,
            &path.display().to_string(),
            &pixels,
        );
        self.textures.push(bind_group);
        log::debug!("Loaded texture {} ({}x{})", path.display(), pixels.width, pixels.height);
        TextureHandle::new(self.textures.len() as u32 - 1)
    }

    fn load_model(&mut self, path: &Path) -> Vec<MeshHandle> {
        let meshes = match model::load_obj(path) {
            Ok(meshes) => meshes,
            Err(e) => {
                log::warn!("Model {} failed to load: {}", path.display(), e);
                return Vec::new();
            }
        };

        meshes
            .iter()
            .map(|data| {
                let texture = data
                    .texture
                    .as_deref()
                    .map_or(TextureHandle::MISSING, |t| self.load_texture(t));
                let geometry = self.upload_mesh("Model Mesh", data);
                self.meshes.push(GpuMesh { geometry, texture });
                MeshHandle::new(self.meshes.len() as u32 - 1)
            })
            .collect()
    }

    fn load_skybox(&mut self, faces: &[PathBuf; 6]) -> bool {
        match CubeFaces::load(faces) {
            Ok(cube) => {
                self.skybox = Some(resources::upload_cubemap(
                    &self.device,
                    &self.queue,
                    &self.layouts.cube,
                    &self.sky_sampler,
                    &cube,
                ));
                true
            }
            Err(e) => {
                log::warn!("Skybox failed to load: {}", e);
                false
            }
        }
    }

    fn create_trail(&mut self, capacity: usize) -> TrailHandle {
        self.trails.push(GpuTrail::new(&self.device, capacity));
        TrailHandle::new(self.trails.len() as u32 - 1)
    }

    fn update_trail(&mut self, trail: TrailHandle, vertices: &[TrailVertex]) {
        if let Some(buffer) = self.trails.get_mut(trail.index()) {
            buffer.write(&self.queue, vertices);
        }
    }

    fn begin_frame(&mut self, view: &FrameView) {
        self.view = Some(view.clone());
        self.draws.clear();
    }

    fn draw(&mut self, command: DrawCommand) {
        self.draws.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Occluder;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        // Frame: two mat4, two vec4, 16 vec4, u32 + padding.
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 432);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 80);
    }

    #[test]
    fn test_frame_uniforms_pack_occluders() {
        let view = FrameView {
            view: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            projection: Mat4::IDENTITY,
            eye: Vec3::ZERO,
            light_position: Vec3::new(0.0, 0.0, -20.0),
            occluders: vec![Occluder {
                center: Vec3::X,
                radius: 0.5,
            }],
        };
        let u = FrameUniforms::new(&view);
        assert_eq!(u.occluder_count, 1);
        assert_eq!(u.occluders[0], [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(u.light, [0.0, 0.0, -20.0, 1.0]);
        // Translation is stripped from the sky transform.
        assert_eq!(u.sky_view_proj[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_object_uniforms_shading_flag() {
        let lit = ObjectUniforms::new(Mat4::IDENTITY, Vec3::ONE, Shading::Lit);
        let unlit = ObjectUniforms::new(Mat4::IDENTITY, Vec3::ONE, Shading::Unlit);
        assert_eq!(lit.tint[3], 0.0);
        assert_eq!(unlit.tint[3], 1.0);
        assert!(ObjectUniforms::for_command(&DrawCommand::Skybox).is_none());
    }
}
