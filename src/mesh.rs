//! CPU-side triangle meshes: the shared UV sphere and the skybox cube.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::path::PathBuf;

use crate::Vertex;

/// Vertex of a lit, textured surface.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Vertex)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertex of the background cube.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Vertex)]
pub struct SkyVertex {
    pub position: [f32; 3],
}

/// Indexed triangle list plus the texture it was authored with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Diffuse texture, already resolved against the model's directory.
    pub texture: Option<PathBuf>,
}

impl MeshData {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Index count of a [`uv_sphere`] with the same parameters.
pub fn sphere_index_count(rings: u32, sectors: u32) -> u32 {
    rings.saturating_sub(1) * sectors.saturating_sub(1) * 6
}

/// A unit sphere with `rings` latitude rows and `sectors` longitude columns.
///
/// Rows run from the south pole (`v = 0`) to the north pole (`v = 1`). The
/// first and last column share a position but not a texture coordinate, so
/// the seam wraps cleanly. Fewer than two rings or sectors gives an empty
/// mesh.
pub fn uv_sphere(rings: u32, sectors: u32) -> MeshData {
    if rings < 2 || sectors < 2 {
        return MeshData::default();
    }

    let ring_step = 1.0 / (rings - 1) as f32;
    let sector_step = 1.0 / (sectors - 1) as f32;

    let mut vertices = Vec::with_capacity((rings * sectors) as usize);
    for r in 0..rings {
        let polar = PI * r as f32 * ring_step;
        let y = (-FRAC_PI_2 + polar).sin();
        for s in 0..sectors {
            let theta = TAU * s as f32 * sector_step;
            let x = theta.cos() * polar.sin();
            let z = theta.sin() * polar.sin();
            vertices.push(MeshVertex {
                position: [x, y, z],
                normal: [x, y, z],
                uv: [s as f32 * sector_step, r as f32 * ring_step],
            });
        }
    }

    let mut indices = Vec::with_capacity(sphere_index_count(rings, sectors) as usize);
    for r in 0..rings - 1 {
        for s in 0..sectors - 1 {
            let current = r * sectors + s;
            let next = current + 1;
            let below = (r + 1) * sectors + s;
            let below_next = below + 1;
            indices.extend_from_slice(&[current, next, below_next, current, below_next, below]);
        }
    }

    MeshData {
        vertices,
        indices,
        texture: None,
    }
}

/// 36 vertices of a cube spanning `[-1, 1]`, wound to be seen from inside.
pub fn skybox_cube() -> Vec<SkyVertex> {
    const CORNERS: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    const FACES: [[usize; 6]; 6] = [
        [1, 5, 6, 6, 2, 1], // +x
        [4, 0, 3, 3, 7, 4], // -x
        [3, 2, 6, 6, 7, 3], // +y
        [4, 5, 1, 1, 0, 4], // -y
        [5, 4, 7, 7, 6, 5], // +z
        [0, 1, 2, 2, 3, 0], // -z
    ];

    FACES
        .iter()
        .flatten()
        .map(|&i| SkyVertex { position: CORNERS[i] })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts() {
        let sphere = uv_sphere(40, 40);
        assert_eq!(sphere.vertices.len(), 1600);
        assert_eq!(sphere.indices.len() as u32, sphere_index_count(40, 40));
        assert_eq!(sphere.triangle_count(), 39 * 39 * 2);
    }

    #[test]
    fn test_sphere_is_unit() {
        for v in uv_sphere(12, 16).vertices {
            let [x, y, z] = v.position;
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() < 1e-5, "vertex off the unit sphere: {len}");
            assert_eq!(v.position, v.normal);
        }
    }

    #[test]
    fn test_sphere_poles_and_uv() {
        let sphere = uv_sphere(10, 10);
        let first = sphere.vertices.first().unwrap();
        let last = sphere.vertices.last().unwrap();
        assert!((first.position[1] + 1.0).abs() < 1e-6);
        assert!((last.position[1] - 1.0).abs() < 1e-6);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert!((last.uv[0] - 1.0).abs() < 1e-6 && (last.uv[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_indices_in_range() {
        let sphere = uv_sphere(8, 9);
        let n = sphere.vertices.len() as u32;
        assert!(sphere.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_degenerate_sphere() {
        assert!(uv_sphere(1, 40).indices.is_empty());
        assert_eq!(sphere_index_count(1, 40), 0);
    }

    #[test]
    fn test_skybox_cube() {
        let cube = skybox_cube();
        assert_eq!(cube.len(), 36);
        assert!(cube.iter().all(|v| v.position.iter().all(|c| c.abs() == 1.0)));
    }
}
