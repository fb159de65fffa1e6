//! The boundary between the scene and whatever draws it.
//!
//! The scene never touches the GPU. It asks a [`RenderBackend`] for
//! resources once at startup (sphere geometry, textures, the avatar model,
//! trail buffers) and receives opaque handles back. Every frame it describes
//! what to draw as a list of [`DrawCommand`]s.
//!
//! Resource loading never fails from the scene's point of view: a texture
//! that cannot be loaded comes back as [`TextureHandle::MISSING`], and a
//! model that cannot be loaded comes back as an empty mesh list. Backends
//! log the underlying error.
//!
//! [`gpu::Renderer`](crate::gpu::Renderer) is the wgpu implementation.
//! [`RecordingBackend`] keeps everything in memory and is used for tests,
//! benchmarks and headless runs.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::mesh::sphere_index_count;
use crate::Vertex;

/// Most occluding spheres passed to the lighting shader per frame.
pub const MAX_OCCLUDERS: usize = 16;

/// Handle to uploaded geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(u32);

/// Handle to an uploaded 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

/// Handle to one mesh of a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(u32);

/// Handle to a dynamic trail vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrailHandle(u32);

macro_rules! handle_index {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Wrap a backend-assigned index.
                pub const fn new(index: u32) -> Self {
                    Self(index)
                }

                /// The backend-assigned index.
                pub const fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

handle_index!(GeometryHandle, TextureHandle, MeshHandle, TrailHandle);

impl TextureHandle {
    /// Returned when a texture could not be loaded. Draws as plain white.
    pub const MISSING: TextureHandle = TextureHandle(u32::MAX);

    /// Whether this is the [`TextureHandle::MISSING`] sentinel.
    pub const fn is_missing(self) -> bool {
        self.0 == u32::MAX
    }
}

/// A sphere mesh and the number of indices to draw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphereGeometry {
    /// Geometry to reference in draw commands.
    pub handle: GeometryHandle,
    /// Index count of the triangle list.
    pub index_count: u32,
}

/// One point of a comet trail line strip.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Vertex)]
pub struct TrailVertex {
    /// World position.
    pub position: [f32; 3],
    /// Premultiplied colour; alpha is the fade.
    pub color: [f32; 4],
}

/// A sphere that can shadow other bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    /// Sphere center.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

/// Per-frame camera and lighting parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform.
    pub projection: Mat4,
    /// Eye position in world space.
    pub eye: Vec3,
    /// Position of the light source.
    pub light_position: Vec3,
    /// Spheres that cast shadows, at most [`MAX_OCCLUDERS`].
    pub occluders: Vec<Occluder>,
}

/// How a surface reacts to the light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Diffuse lighting with shadows.
    Lit,
    /// Texture colour only (the sun, the avatar).
    Unlit,
}

/// One thing to draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// The cubemap background.
    Skybox,
    /// A textured sphere.
    Body {
        /// Sphere geometry.
        geometry: GeometryHandle,
        /// Surface texture.
        texture: TextureHandle,
        /// Model transform.
        transform: Mat4,
        /// Lighting mode.
        shading: Shading,
    },
    /// One mesh of a loaded model, with its own texture.
    Mesh {
        /// The mesh.
        mesh: MeshHandle,
        /// Model transform.
        transform: Mat4,
        /// Lighting mode.
        shading: Shading,
    },
    /// A trail line strip, as last uploaded.
    Trail {
        /// The trail buffer.
        trail: TrailHandle,
    },
    /// Translucent highlight shell around a selected body.
    Marker {
        /// Sphere geometry.
        geometry: GeometryHandle,
        /// Model transform.
        transform: Mat4,
        /// Tint.
        color: Vec3,
    },
}

/// Resource creation and draw submission.
pub trait RenderBackend {
    /// Upload a UV sphere with `rings` bands and `sectors` slices.
    fn create_sphere_geometry(&mut self, rings: u32, sectors: u32) -> SphereGeometry;

    /// Load a 2D texture, or return [`TextureHandle::MISSING`].
    fn load_texture(&mut self, path: &Path) -> TextureHandle;

    /// Load a model. Returns no meshes if it cannot be loaded.
    fn load_model(&mut self, path: &Path) -> Vec<MeshHandle>;

    /// Load six cubemap faces as the background. Returns whether it worked.
    fn load_skybox(&mut self, faces: &[PathBuf; 6]) -> bool;

    /// Allocate a trail buffer holding up to `capacity` points.
    fn create_trail(&mut self, capacity: usize) -> TrailHandle;

    /// Replace the contents of a trail buffer.
    fn update_trail(&mut self, trail: TrailHandle, vertices: &[TrailVertex]);

    /// Start a frame; clears previously submitted draws.
    fn begin_frame(&mut self, view: &FrameView);

    /// Queue a draw for the current frame.
    fn draw(&mut self, command: DrawCommand);
}

/// A backend that records every call instead of drawing.
///
/// All resources load successfully unless marked otherwise with
/// [`RecordingBackend::with_missing_texture`] or
/// [`RecordingBackend::with_model`].
#[derive(Debug, Default)]
pub struct RecordingBackend {
    /// Spheres created, as `(rings, sectors)`.
    pub spheres: Vec<(u32, u32)>,
    /// Texture paths requested, in order.
    pub textures: Vec<PathBuf>,
    /// Model paths requested, in order.
    pub models: Vec<PathBuf>,
    /// Whether a skybox was loaded.
    pub skybox: bool,
    /// Latest contents of each trail buffer.
    pub trails: Vec<Vec<TrailVertex>>,
    /// Total trail uploads.
    pub trail_uploads: usize,
    /// Frames started.
    pub frames: usize,
    /// View of the current frame.
    pub view: Option<FrameView>,
    /// Draws of the current frame.
    pub draws: Vec<DrawCommand>,
    missing_textures: Vec<PathBuf>,
    model_meshes: HashMap<PathBuf, u32>,
    next_mesh: u32,
}

impl RecordingBackend {
    /// A backend where every texture loads and no model exists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make loads of `path` fail.
    pub fn with_missing_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.missing_textures.push(path.into());
        self
    }

    /// Make `path` load as a model with `meshes` meshes.
    pub fn with_model(mut self, path: impl Into<PathBuf>, meshes: u32) -> Self {
        self.model_meshes.insert(path.into(), meshes);
        self
    }

    /// Draws of the current frame matching `pred`.
    pub fn count_draws(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.draws.iter().filter(|d| pred(d)).count()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_sphere_geometry(&mut self, rings: u32, sectors: u32) -> SphereGeometry {
        self.spheres.push((rings, sectors));
        SphereGeometry {
            handle: GeometryHandle::new(self.spheres.len() as u32 - 1),
            index_count: sphere_index_count(rings, sectors),
        }
    }

    fn load_texture(&mut self, path: &Path) -> TextureHandle {
        if self.missing_textures.iter().any(|p| p == path) {
            log::warn!("Texture {} not found", path.display());
            return TextureHandle::MISSING;
        }
        self.textures.push(path.to_path_buf());
        TextureHandle::new(self.textures.len() as u32 - 1)
    }

    fn load_model(&mut self, path: &Path) -> Vec<MeshHandle> {
        self.models.push(path.to_path_buf());
        let count = self.model_meshes.get(path).copied().unwrap_or(0);
        let first = self.next_mesh;
        self.next_mesh += count;
        (first..first + count).map(MeshHandle::new).collect()
    }

    fn load_skybox(&mut self, _faces: &[PathBuf; 6]) -> bool {
        self.skybox = true;
        true
    }

    fn create_trail(&mut self, _capacity: usize) -> TrailHandle {
        self.trails.push(Vec::new());
        TrailHandle::new(self.trails.len() as u32 - 1)
    }

    fn update_trail(&mut self, trail: TrailHandle, vertices: &[TrailVertex]) {
        if let Some(buffer) = self.trails.get_mut(trail.index()) {
            buffer.clear();
            buffer.extend_from_slice(vertices);
            self.trail_uploads += 1;
        }
    }

    fn begin_frame(&mut self, view: &FrameView) {
        self.frames += 1;
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

    #[test]
    fn test_missing_texture_sentinel() {
        let mut backend = RecordingBackend::new().with_missing_texture("gone.png");
        assert!(backend.load_texture(Path::new("gone.png")).is_missing());
        assert!(!backend.load_texture(Path::new("here.png")).is_missing());
    }

    #[test]
    fn test_model_meshes() {
        let mut backend = RecordingBackend::new().with_model("duck.obj", 2);
        assert_eq!(backend.load_model(Path::new("duck.obj")).len(), 2);
        assert!(backend.load_model(Path::new("other.obj")).is_empty());
    }

    #[test]
    fn test_begin_frame_clears_draws() {
        let mut backend = RecordingBackend::new();
        let view = FrameView {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            eye: Vec3::ZERO,
            light_position: Vec3::ZERO,
            occluders: Vec::new(),
        };
        backend.begin_frame(&view);
        backend.draw(DrawCommand::Skybox);
        assert_eq!(backend.draws.len(), 1);
        backend.begin_frame(&view);
        assert!(backend.draws.is_empty());
        assert_eq!(backend.frames, 2);
    }
}
