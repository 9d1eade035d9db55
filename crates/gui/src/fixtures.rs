//! Factory functions for creating test data.
//!
//! Provides a small synthetic skeleton (a handful of box and sphere parts in
//! a bone hierarchy), its binary glTF encoding, and a throwaway asset
//! directory. Sizes match the default camera framing, so every part is
//! visible and individually clickable from the initial view.

use std::path::{Path, PathBuf};

use shared::{AssetSource, ModelCatalog, ModelPreset, PartId, PartTransform};

use crate::loader::glb::{self, FLOAT, UNSIGNED_INT};
use crate::state::model::Model;
use crate::viewport::mesh::{self, VERTEX_STRIDE};

/// Name of the model built by [`skeleton_model`]
pub const SKELETON_NAME: &str = "Fixture Skeleton";

const BONE: [f32; 3] = [0.85, 0.83, 0.76];
const WOOD: [f32; 3] = [0.45, 0.3, 0.15];

// ── Model factories ─────────────────────────────────────────────

/// Skeleton with parts Hips > Spine > (Head, LeftArm > Bow, RightArm) and
/// Hips > (LeftLeg, RightLeg).
pub fn skeleton_model() -> Model {
    let mut m = Model::new(SKELETON_NAME);
    let at = PartTransform::from_translation;

    let hips = m.add_part(
        "Hips",
        None,
        at([0.0, 0.012, 0.0]),
        Some(mesh::cube(0.008, 0.004, 0.004, BONE)),
    );
    let spine = m.add_part(
        "Spine",
        Some(hips),
        at([0.0, 0.008, 0.0]),
        Some(mesh::cube(0.006, 0.01, 0.004, BONE)),
    );
    m.add_part(
        "Head",
        Some(spine),
        at([0.0, 0.011, 0.0]),
        Some(mesh::sphere(0.003, 12, 16, BONE)),
    );
    let left_arm = m.add_part(
        "LeftArm",
        Some(spine),
        at([0.008, 0.002, 0.0]),
        Some(mesh::cube(0.006, 0.002, 0.002, BONE)),
    );
    m.add_part(
        "Bow",
        Some(left_arm),
        at([0.006, 0.0, 0.0]),
        Some(mesh::cube(0.001, 0.012, 0.001, WOOD)),
    );
    m.add_part(
        "RightArm",
        Some(spine),
        at([-0.008, 0.002, 0.0]),
        Some(mesh::cube(0.006, 0.002, 0.002, BONE)),
    );
    m.add_part(
        "LeftLeg",
        Some(hips),
        at([0.003, -0.008, 0.0]),
        Some(mesh::cube(0.002, 0.01, 0.002, BONE)),
    );
    m.add_part(
        "RightLeg",
        Some(hips),
        at([-0.003, -0.008, 0.0]),
        Some(mesh::cube(0.002, 0.01, 0.002, BONE)),
    );
    m
}

/// Part id by name, panicking when the fixture does not have it.
pub fn part(model: &Model, name: &str) -> PartId {
    model
        .find_part(name)
        .unwrap_or_else(|| panic!("fixture has no part '{name}'"))
}

/// Two unit cubes side by side at x = -2 and x = 2, both roots.
pub fn two_cubes() -> Model {
    let mut m = Model::new("Two Cubes");
    m.add_part(
        "Left",
        None,
        PartTransform::from_translation([-2.0, 0.0, 0.0]),
        Some(mesh::cube(1.0, 1.0, 1.0, BONE)),
    );
    m.add_part(
        "Right",
        None,
        PartTransform::from_translation([2.0, 0.0, 0.0]),
        Some(mesh::cube(1.0, 1.0, 1.0, BONE)),
    );
    m
}

// ── GLB encoding ────────────────────────────────────────────────

fn floats_to_bytes(floats: &[f32]) -> Vec<u8> {
    floats.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn u32s_to_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Encode a model as binary glTF: one node per part (same index), one mesh
/// per part with geometry.
pub fn model_to_glb(model: &Model) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    let mut buffer_views = Vec::new();
    let mut accessors = Vec::new();
    let mut meshes = Vec::new();
    let mut nodes = Vec::new();

    for id in 0..model.part_count() {
        let Some(part) = model.part(id) else { continue };
        let mut node = serde_json::json!({
            "name": part.name,
            "translation": part.transform.translation,
            "rotation": part.transform.rotation,
            "scale": part.transform.scale,
        });
        if !part.children.is_empty() {
            node["children"] = serde_json::json!(part.children);
        }

        if let Some(data) = part.mesh.as_ref().filter(|m| !m.is_empty()) {
            let vertex_count = data.vertex_count();
            let mut positions = Vec::with_capacity(vertex_count * 3);
            let mut normals = Vec::with_capacity(vertex_count * 3);
            for v in data.vertices.chunks_exact(VERTEX_STRIDE) {
                positions.extend_from_slice(&v[0..3]);
                normals.extend_from_slice(&v[3..6]);
            }

            let accessor_base = accessors.len();
            for (bytes, count, kind, component) in [
                (floats_to_bytes(&positions), vertex_count, "VEC3", FLOAT),
                (floats_to_bytes(&normals), vertex_count, "VEC3", FLOAT),
                (u32s_to_bytes(&data.indices), data.indices.len(), "SCALAR", UNSIGNED_INT),
            ] {
                buffer_views.push(serde_json::json!({
                    "buffer": 0,
                    "byteOffset": bin.len(),
                    "byteLength": bytes.len(),
                }));
                accessors.push(serde_json::json!({
                    "bufferView": buffer_views.len() - 1,
                    "componentType": component,
                    "count": count,
                    "type": kind,
                }));
                bin.extend_from_slice(&bytes);
            }

            node["mesh"] = serde_json::json!(meshes.len());
            meshes.push(serde_json::json!({
                "name": part.name,
                "primitives": [{
                    "attributes": {
                        "POSITION": accessor_base,
                        "NORMAL": accessor_base + 1,
                    },
                    "indices": accessor_base + 2,
                    "material": 0,
                }]
            }));
        }

        nodes.push(node);
    }

    let doc = serde_json::json!({
        "asset": { "version": "2.0", "generator": "skelview fixtures" },
        "scene": 0,
        "scenes": [{ "nodes": model.roots() }],
        "nodes": nodes,
        "meshes": meshes,
        "materials": [{
            "pbrMetallicRoughness": { "baseColorFactor": [BONE[0], BONE[1], BONE[2], 1.0] }
        }],
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [{ "byteLength": bin.len() }],
    });

    glb::write_container(doc.to_string().as_bytes(), &bin)
}

/// [`skeleton_model`] encoded as GLB
pub fn skeleton_glb() -> Vec<u8> {
    model_to_glb(&skeleton_model())
}

// ── Asset directory ─────────────────────────────────────────────

/// Temporary asset directory, removed on drop.
pub struct TempAssets {
    dir: PathBuf,
}

impl TempAssets {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("skelview-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp asset dir");
        Self { dir }
    }

    /// Directory holding `SkeletonBowman1.glb .. SkeletonBowman5.glb`, all
    /// copies of the fixture skeleton.
    pub fn with_default_catalog() -> Self {
        let assets = Self::new();
        let bytes = skeleton_glb();
        for preset in &ModelCatalog::default().presets {
            assets.write(preset.path.trim_start_matches('/'), &bytes);
        }
        assets
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn source(&self) -> AssetSource {
        AssetSource::Directory(self.dir.clone())
    }

    /// Write a file and return its full path
    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.join(name);
        std::fs::write(&path, bytes).expect("write temp asset");
        path
    }

    /// Catalog entry pointing at a file in this directory
    pub fn preset(&self, label: &str, name: &str) -> ModelPreset {
        ModelPreset::new(label, format!("/{name}"))
    }
}

impl Default for TempAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempAssets {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_hierarchy() {
        let m = skeleton_model();
        assert_eq!(m.part_count(), 8);
        assert_eq!(m.roots().len(), 1);
        let bow = part(&m, "Bow");
        assert_eq!(m.part(bow).unwrap().parent, Some(part(&m, "LeftArm")));
        assert_eq!(m.visible_meshes().len(), 8);
    }

    #[test]
    fn test_glb_roundtrip_preserves_structure() {
        let original = skeleton_model();
        let parsed = glb::parse_glb(&skeleton_glb(), "copy", [0.0; 3]).unwrap();
        assert_eq!(parsed.part_count(), original.part_count());
        for name in ["Hips", "Head", "Bow", "RightLeg"] {
            let a = part(&original, name);
            let b = part(&parsed, name);
            assert_eq!(original.position(a), parsed.position(b));
            let ma = original.part(a).unwrap().mesh.as_ref().unwrap();
            let mb = parsed.part(b).unwrap().mesh.as_ref().unwrap();
            assert_eq!(ma.triangle_count(), mb.triangle_count());
        }
    }

    #[test]
    fn test_temp_assets_removed_on_drop() {
        let path = {
            let assets = TempAssets::with_default_catalog();
            assert!(assets.path().join("SkeletonBowman3.glb").exists());
            assets.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
