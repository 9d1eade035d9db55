use std::path::Path;

use glam::Vec3;

use crate::error::ExportError;
use crate::state::model::Model;

/// Size of the free-form header at the start of a binary STL file
pub const STL_HEADER_LEN: usize = 80;
/// Normal + 3 vertices (12 f32) + attribute byte count (u16)
pub const STL_TRIANGLE_LEN: usize = 50;

const STL_HEADER_TEXT: &[u8] = b"skelview binary STL export";

/// Build a binary STL file from every visible part of the model.
///
/// Geometry is written in model space. Detached parts and their subtrees
/// are not part of the output. Face normals are recomputed from the
/// winding order.
pub fn build_binary_stl(model: &Model) -> Result<Vec<u8>, ExportError> {
    let meshes = model.visible_meshes();
    let total: usize = meshes.iter().map(|(_, m)| m.triangles().count()).sum();
    let count = u32::try_from(total).map_err(|_| ExportError::TooManyTriangles(total))?;

    let mut out = Vec::with_capacity(STL_HEADER_LEN + 4 + total * STL_TRIANGLE_LEN);

    let mut header = [0u8; STL_HEADER_LEN];
    header[..STL_HEADER_TEXT.len()].copy_from_slice(STL_HEADER_TEXT);
    out.extend_from_slice(&header);
    out.extend_from_slice(&count.to_le_bytes());

    for (_, mesh) in &meshes {
        for [a, b, c] in mesh.triangles() {
            let normal = (b - a).cross(c - a).normalize_or_zero();
            for v in [normal, a, b, c] {
                push_vec3(&mut out, v);
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
    }

    tracing::debug!(
        "Built STL for '{}': {} parts, {} triangles",
        model.name(),
        meshes.len(),
        total
    );
    Ok(out)
}

fn push_vec3(out: &mut Vec<u8>, v: Vec3) {
    for f in v.to_array() {
        out.extend_from_slice(&f.to_le_bytes());
    }
}

/// Triangle count stored in a binary STL file, if the buffer is one
pub fn stl_triangle_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(STL_HEADER_LEN..STL_HEADER_LEN + 4)?;
    let count = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let expected = STL_HEADER_LEN + 4 + count as usize * STL_TRIANGLE_LEN;
    (bytes.len() == expected).then_some(count)
}

/// Write bytes to `path` through a temporary sibling file, so a failed
/// write never leaves a truncated file behind.
pub fn save_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    tracing::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
