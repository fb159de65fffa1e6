//! # Orrery
//!
//! An interactive solar system: textured planets and moons on circular
//! orbits around a glowing sun, comets on eccentric ellipses with fading
//! trails, and a "black hole" effect that pulls everything into one point.
//!
//! The crate is split in two halves:
//!
//! - the **scene** ([`Scene`]) owns all simulated state and is plain CPU
//!   code, driven one frame at a time by a [`SceneClock`] and a list of
//!   [`Action`]s, and describing what to draw to a [`RenderBackend`]
//! - the **application** ([`Simulation`]) opens a window, feeds keyboard
//!   and mouse input through [`Input`], and draws with wgpu
//!
//! ## Quick Start
//!
//! ```ignore
//! use orrery::{SceneConfig, Simulation};
//!
//! fn main() -> Result<(), orrery::SimulationError> {
//!     Simulation::new(SceneConfig::solar_system()).run()
//! }
//! ```
//!
//! ## Headless
//!
//! ```ignore
//! use orrery::{Action, RecordingBackend, Scene, SceneClock, SceneConfig};
//!
//! let mut backend = RecordingBackend::new();
//! let mut scene = Scene::build(&SceneConfig::solar_system(), &mut backend)?;
//! let mut clock = SceneClock::starting_at(0.0);
//!
//! scene.advance_frame(&mut clock, 0.016, &[Action::ActivateCollapse], &Default::default());
//! scene.submit(&mut backend, 16.0 / 9.0);
//! ```
//!
//! ## Controls
//!
//! | Key | Action |
//! |-----|--------|
//! | W A S D, Q E | Move (Shift for speed) |
//! | Mouse, arrows | Look |
//! | Space | Pause animation |
//! | 1 / 2 | First / third person |
//! | 3 / 4 | Cycle / leave body selection |
//! | X / R | Start / reset the collapse |
//! | Esc | Quit |

extern crate self as orrery;

pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod input;
pub mod mesh;
pub mod model;
pub mod render;
pub mod scene;
pub mod shader;
mod simulation;
pub mod textures;
pub mod time;

pub use bytemuck;
pub use glam::{Vec2, Vec3, Vec4};
pub use orrery_derive::Vertex;
pub use wgpu;

pub use camera::{Camera, CameraControls, ViewMode};
pub use config::SceneConfig;
pub use error::{ConfigError, GpuError, ModelError, SimulationError, TextureError};
pub use input::{Action, Bindings, Input, KeyCode};
pub use render::{DrawCommand, RecordingBackend, RenderBackend};
pub use scene::{FrameReport, Placement, Scene};
pub use simulation::Simulation;
pub use time::{SceneClock, Tick};

/// Vertex types that can feed a render pipeline.
///
/// Implemented by `#[derive(Vertex)]`, which lays attributes out in field
/// order at locations `0..n` and emits the matching WGSL input struct:
///
/// ```ignore
/// #[repr(C)]
/// #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Vertex)]
/// struct Point {
///     position: [f32; 3],
///     color: [f32; 4],
/// }
///
/// // struct VertexInput {
/// //     @location(0) position: vec3<f32>,
/// //     @location(1) color: vec4<f32>,
/// // }
/// assert!(Point::WGSL_INPUT.contains("@location(1) color: vec4<f32>"));
/// ```
pub trait VertexLayout: Sized {
    /// One attribute per field, with byte offsets.
    const ATTRIBUTES: &'static [wgpu::VertexAttribute];

    /// WGSL declaration of `struct VertexInput`.
    const WGSL_INPUT: &'static str;

    /// Per-vertex buffer layout spanning the whole struct.
    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: Self::ATTRIBUTES,
        }
    }
}
