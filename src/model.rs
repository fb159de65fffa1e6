//! Wavefront OBJ loading for the avatar model.

use std::path::Path;

use crate::error::ModelError;
use crate::mesh::{MeshData, MeshVertex};

/// Load every mesh of an OBJ file as triangle lists.
///
/// Missing normals fall back to `+y`, missing texture coordinates to zero.
/// Diffuse textures named by the material library are resolved against the
/// OBJ file's directory. A material library that fails to load only costs
/// the textures.
pub fn load_obj(path: &Path) -> Result<Vec<MeshData>, ModelError> {
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("Materials for {} failed to load: {}", path.display(), e);
        Vec::new()
    });
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let meshes: Vec<MeshData> = models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            let texture = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|m| m.diffuse_texture.as_deref())
                .filter(|name| !name.is_empty())
                .map(|name| base.join(name));
            MeshData {
                vertices: interleave(&mesh.positions, &mesh.normals, &mesh.texcoords),
                indices: mesh.indices,
                texture,
            }
        })
        .filter(|mesh| !mesh.indices.is_empty())
        .collect();

    if meshes.is_empty() {
        return Err(ModelError::Empty(path.to_path_buf()));
    }
    log::debug!("Loaded {} meshes from {}", meshes.len(), path.display());
    Ok(meshes)
}

fn interleave(positions: &[f32], normals: &[f32], texcoords: &[f32]) -> Vec<MeshVertex> {
    positions
        .chunks_exact(3)
        .enumerate()
        .map(|(i, p)| {
            let normal = normals
                .get(i * 3..i * 3 + 3)
                .map_or([0.0, 1.0, 0.0], |n| [n[0], n[1], n[2]]);
            // OBJ texture space has v pointing up.
            let uv = texcoords
                .get(i * 2..i * 2 + 2)
                .map_or([0.0, 0.0], |t| [t[0], 1.0 - t[1]]);
            MeshVertex {
                position: [p[0], p[1], p[2]],
                normal,
                uv,
            }
        })
        .collect()
}
