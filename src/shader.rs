//! WGSL sources for the render pipelines.
//!
//! Each program is assembled from shared pieces: the `MAX_OCCLUDERS`
//! constant, the per-frame uniform block (group 0), the per-draw object
//! block (group 1, where used), the `VertexInput` struct generated by
//! `#[derive(Vertex)]` for the vertex type the pipeline consumes, and the
//! program's own entry points `vs_main` and `fs_main`.

use crate::mesh::{MeshVertex, SkyVertex};
use crate::render::{TrailVertex, MAX_OCCLUDERS};
use crate::VertexLayout;

const FRAME_WGSL: &str = include_str!("shaders/frame.wgsl");
const OBJECT_WGSL: &str = include_str!("shaders/object.wgsl");
const BODY_WGSL: &str = include_str!("shaders/body.wgsl");
const MARKER_WGSL: &str = include_str!("shaders/marker.wgsl");
const TRAIL_WGSL: &str = include_str!("shaders/trail.wgsl");
const SKYBOX_WGSL: &str = include_str!("shaders/skybox.wgsl");

fn compose(parts: &[&str]) -> String {
    let mut code = format!("const MAX_OCCLUDERS: u32 = {}u;\n\n", MAX_OCCLUDERS);
    for part in parts {
        code.push_str(part);
        code.push('\n');
    }
    code
}

/// Textured spheres and model meshes: diffuse light with sphere shadows.
pub fn body_shader() -> String {
    compose(&[FRAME_WGSL, OBJECT_WGSL, MeshVertex::WGSL_INPUT, BODY_WGSL])
}

/// Translucent rim shell around the selected body.
pub fn marker_shader() -> String {
    compose(&[FRAME_WGSL, OBJECT_WGSL, MeshVertex::WGSL_INPUT, MARKER_WGSL])
}

/// Comet trail line strips.
pub fn trail_shader() -> String {
    compose(&[FRAME_WGSL, TrailVertex::WGSL_INPUT, TRAIL_WGSL])
}

/// Cubemap background.
pub fn skybox_shader() -> String {
    compose(&[FRAME_WGSL, SkyVertex::WGSL_INPUT, SKYBOX_WGSL])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programs_have_entry_points() {
        for src in [body_shader(), marker_shader(), trail_shader(), skybox_shader()] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
            assert!(src.contains("struct VertexInput"));
            assert!(src.starts_with("const MAX_OCCLUDERS: u32 = 16u;"));
        }
    }

    #[test]
    fn test_object_block_only_where_needed() {
        assert!(body_shader().contains("var<uniform> object"));
        assert!(!trail_shader().contains("var<uniform> object"));
        assert!(!skybox_shader().contains("var<uniform> object"));
    }
}
