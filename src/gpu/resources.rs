//! Uploading CPU meshes and pixels into GPU buffers and textures.

use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;
use crate::mesh::{MeshData, SkyVertex};
use crate::render::TrailVertex;
use crate::textures::{CubeFaces, TextureData};

pub(super) const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// An indexed triangle list on the GPU.
pub(super) struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuGeometry {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// One mesh of a loaded model and its texture.
pub(super) struct GpuMesh {
    pub geometry: GpuGeometry,
    pub texture: crate::render::TextureHandle,
}

/// A fixed-capacity dynamic line strip.
pub(super) struct GpuTrail {
    pub buffer: wgpu::Buffer,
    pub capacity: usize,
    pub count: usize,
}

impl GpuTrail {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trail Buffer"),
            size: (capacity * std::mem::size_of::<TrailVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity,
            count: 0,
        }
    }

    /// Overwrite the strip; points past capacity are dropped.
    pub fn write(&mut self, queue: &wgpu::Queue, vertices: &[TrailVertex]) {
        let count = vertices.len().min(self.capacity);
        if count > 0 {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&vertices[..count]));
        }
        self.count = count;
    }

    pub fn byte_len(&self) -> u64 {
        (self.count * std::mem::size_of::<TrailVertex>()) as u64
    }
}

pub(super) fn create_sky_cube(device: &wgpu::Device, vertices: &[SkyVertex]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Skybox Vertices"),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// Upload a 2D texture and bind it with `sampler`.
pub(super) fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    pixels: &TextureData,
) -> wgpu::BindGroup {
    let size = wgpu::Extent3d {
        width: pixels.width,
        height: pixels.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_layer(queue, &texture, 0, pixels);

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    bind_texture(device, layout, sampler, label, &view)
}

/// Upload six faces as a cube texture.
pub(super) fn upload_cubemap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    cube: &CubeFaces,
) -> wgpu::BindGroup {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Skybox Texture"),
        size: wgpu::Extent3d {
            width: cube.size.0,
            height: cube.size.1,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (layer, face) in cube.faces.iter().enumerate() {
        write_layer(queue, &texture, layer as u32, face);
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Skybox View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    bind_texture(device, layout, sampler, "Skybox", &view)
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, pixels: &TextureData) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        &pixels.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(pixels.bytes_per_row()),
            rows_per_image: Some(pixels.height),
        },
        wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        },
    );
}

fn bind_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

pub(super) fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
