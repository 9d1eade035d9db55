//! Binary glTF 2.0 (GLB) reading.
//!
//! Supports the subset needed to show a character model: the node
//! hierarchy with names and TRS / matrix transforms, and triangle
//! primitives with float positions, optional normals and u8/u16/u32
//! indices. Skinning and animation data are ignored, so skinned meshes
//! show in their bind pose.

use std::collections::{HashMap, HashSet};

use glam::Mat4;
use serde::Deserialize;
use shared::{PartId, PartTransform};

use crate::error::LoadError;
use crate::state::model::Model;
use crate::viewport::mesh::MeshData;

/// GLB magic number: "glTF"
pub const GLB_MAGIC: u32 = 0x46546C67;
/// GLB version 2
pub const GLB_VERSION: u32 = 2;
/// JSON chunk type
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F534A;
/// BIN chunk type
pub const CHUNK_TYPE_BIN: u32 = 0x004E4942;

/// glTF component types
pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_INT: u32 = 5125;
pub const FLOAT: u32 = 5126;

/// Primitive topology: triangle list
const MODE_TRIANGLES: u32 = 4;

/// Upper bound on elements per accessor, also for zero-filled accessors
/// that have no buffer view
const MAX_ACCESSOR_COUNT: usize = 1 << 24;

// ── glTF JSON document (subset) ──────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
}

#[derive(Debug, Default, Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeDef {
    name: Option<String>,
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
    matrix: Option<[f32; 16]>,
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    #[serde(default)]
    primitives: Vec<PrimitiveDef>,
}

fn default_mode() -> u32 {
    MODE_TRIANGLES
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    #[serde(default = "default_mode")]
    mode: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDef {
    pbr_metallic_roughness: Option<PbrDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PbrDef {
    base_color_factor: Option<[f32; 4]>,
}

// ── Container ────────────────────────────────────────────────

/// JSON and BIN chunks of a GLB file
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: &'a [u8],
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Split a GLB file into its JSON and (optional) BIN chunks
pub fn split_chunks(data: &[u8]) -> Result<GlbChunks<'_>, LoadError> {
    let invalid = |msg: &str| LoadError::InvalidGlb(msg.to_string());

    if read_u32(data, 0) != Some(GLB_MAGIC) {
        return Err(invalid("missing glTF magic"));
    }
    let version = read_u32(data, 4).ok_or_else(|| invalid("truncated header"))?;
    if version != GLB_VERSION {
        return Err(LoadError::InvalidGlb(format!("unsupported version {version}")));
    }
    let total = read_u32(data, 8).ok_or_else(|| invalid("truncated header"))? as usize;
    if total > data.len() {
        return Err(LoadError::InvalidGlb(format!(
            "header declares {total} bytes, file has {}",
            data.len()
        )));
    }

    let mut json = None;
    let mut bin: &[u8] = &[];
    let mut offset = 12;

    while offset + 8 <= total {
        let length = read_u32(data, offset).ok_or_else(|| invalid("truncated chunk"))? as usize;
        let kind = read_u32(data, offset + 4).ok_or_else(|| invalid("truncated chunk"))?;
        let start = offset + 8;
        let chunk = data
            .get(start..start + length)
            .ok_or_else(|| invalid("chunk exceeds file length"))?;

        match kind {
            CHUNK_TYPE_JSON if json.is_none() => json = Some(chunk),
            CHUNK_TYPE_BIN if bin.is_empty() => bin = chunk,
            _ => {}
        }

        offset = start + length;
    }

    let json = json.ok_or_else(|| invalid("missing JSON chunk"))?;
    Ok(GlbChunks { json, bin })
}

/// Assemble a GLB file from a JSON document and a binary buffer
pub fn write_container(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = json.to_vec();
    // Pad JSON to 4-byte alignment with spaces (GLB container rule)
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let mut bin_data = bin.to_vec();
    // Pad BIN to 4-byte alignment with zeros (GLB container rule)
    while bin_data.len() % 4 != 0 {
        bin_data.push(0);
    }

    let json_chunk_length = json_bytes.len() as u32;
    let bin_chunk_length = bin_data.len() as u32;

    let mut total_length: u32 = 12 + 8 + json_chunk_length;
    if !bin_data.is_empty() {
        total_length += 8 + bin_chunk_length;
    }

    let mut glb = Vec::with_capacity(total_length as usize);

    // Header
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_length.to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&json_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    glb.extend_from_slice(&json_bytes);

    // BIN chunk
    if !bin_data.is_empty() {
        glb.extend_from_slice(&bin_chunk_length.to_le_bytes());
        glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
        glb.extend_from_slice(&bin_data);
    }

    glb
}

// ── Model building ───────────────────────────────────────────

/// Parse a GLB file into a model named `name`.
/// `default_color` is used for primitives without a material color.
pub fn parse_glb(data: &[u8], name: &str, default_color: [f32; 3]) -> Result<Model, LoadError> {
    let chunks = split_chunks(data)?;
    let doc: Document = serde_json::from_slice(chunks.json)
        .map_err(|e| LoadError::InvalidGlb(format!("JSON chunk: {e}")))?;

    let reader = Reader {
        doc: &doc,
        bin: chunks.bin,
        default_color,
    };

    let mut model = Model::new(name);
    let mut visited = HashSet::new();
    let mut stack: Vec<(usize, Option<PartId>)> =
        reader.root_nodes().into_iter().rev().map(|n| (n, None)).collect();

    while let Some((node_idx, parent)) = stack.pop() {
        if !visited.insert(node_idx) {
            tracing::warn!("glTF node {node_idx} referenced twice, skipping");
            continue;
        }
        let node = doc
            .nodes
            .get(node_idx)
            .ok_or_else(|| LoadError::InvalidGlb(format!("node {node_idx} out of range")))?;

        let mesh = match node.mesh {
            Some(mesh_idx) => Some(reader.mesh(mesh_idx)?),
            None => None,
        };
        let part_name = node
            .name
            .clone()
            .unwrap_or_else(|| format!("node_{node_idx}"));

        let part = model.add_part(part_name, parent, node_transform(node), mesh);
        stack.extend(node.children.iter().rev().map(|c| (*c, Some(part))));
    }

    tracing::debug!(
        "Parsed GLB '{name}': {} parts from {} nodes",
        model.part_count(),
        doc.nodes.len()
    );
    Ok(model)
}

fn node_transform(node: &NodeDef) -> PartTransform {
    if let Some(m) = node.matrix {
        let (scale, rotation, translation) = Mat4::from_cols_array(&m).to_scale_rotation_translation();
        return PartTransform {
            translation: translation.to_array(),
            rotation: rotation.to_array(),
            scale: scale.to_array(),
        };
    }
    let identity = PartTransform::new();
    PartTransform {
        translation: node.translation.unwrap_or(identity.translation),
        rotation: node.rotation.unwrap_or(identity.rotation),
        scale: node.scale.unwrap_or(identity.scale),
    }
}

struct Reader<'a> {
    doc: &'a Document,
    bin: &'a [u8],
    default_color: [f32; 3],
}

impl Reader<'_> {
    fn root_nodes(&self) -> Vec<usize> {
        let scene = self.doc.scene.unwrap_or(0);
        if let Some(scene) = self.doc.scenes.get(scene) {
            return scene.nodes.clone();
        }
        // No scene list: every node that is nobody's child is a root
        let children: HashSet<usize> = self
            .doc
            .nodes
            .iter()
            .flat_map(|n| n.children.iter().copied())
            .collect();
        (0..self.doc.nodes.len()).filter(|i| !children.contains(i)).collect()
    }

    fn mesh(&self, mesh_idx: usize) -> Result<MeshData, LoadError> {
        let mesh = self
            .doc
            .meshes
            .get(mesh_idx)
            .ok_or_else(|| LoadError::InvalidGlb(format!("mesh {mesh_idx} out of range")))?;

        let mut out = MeshData::default();
        for primitive in &mesh.primitives {
            if primitive.mode != MODE_TRIANGLES {
                tracing::debug!("Skipping primitive with mode {}", primitive.mode);
                continue;
            }
            let Some(&position_idx) = primitive.attributes.get("POSITION") else {
                continue;
            };

            let positions = self.read_vec3(position_idx)?;
            let normals = match primitive.attributes.get("NORMAL") {
                Some(&idx) => Some(self.read_vec3(idx)?),
                None => None,
            };
            let indices = match primitive.indices {
                Some(idx) => Some(self.read_indices(idx)?),
                None => None,
            };

            let part = MeshData::from_attributes(
                &positions,
                normals.as_deref(),
                indices,
                self.material_color(primitive.material),
            );
            out.append(&part);
        }
        Ok(out)
    }

    fn material_color(&self, material: Option<usize>) -> [f32; 3] {
        material
            .and_then(|m| self.doc.materials.get(m))
            .and_then(|m| m.pbr_metallic_roughness.as_ref())
            .and_then(|pbr| pbr.base_color_factor)
            .map(|c| [c[0], c[1], c[2]])
            .unwrap_or(self.default_color)
    }

    fn accessor(&self, idx: usize) -> Result<&AccessorDef, LoadError> {
        self.doc
            .accessors
            .get(idx)
            .ok_or_else(|| LoadError::InvalidGlb(format!("accessor {idx} out of range")))
    }

    /// Byte slice of the accessor's buffer view starting at the accessor
    /// offset, plus the element stride.
    fn element_bytes(
        &self,
        accessor: &AccessorDef,
        element_size: usize,
    ) -> Result<Option<(&[u8], usize)>, LoadError> {
        if accessor.count > MAX_ACCESSOR_COUNT {
            return Err(LoadError::InvalidGlb(format!(
                "accessor count {} exceeds {MAX_ACCESSOR_COUNT}",
                accessor.count
            )));
        }
        let Some(view_idx) = accessor.buffer_view else {
            return Ok(None);
        };
        let view = self
            .doc
            .buffer_views
            .get(view_idx)
            .ok_or_else(|| LoadError::InvalidGlb(format!("buffer view {view_idx} out of range")))?;

        let overflow = || LoadError::InvalidGlb("accessor range overflows".to_string());
        let stride = view.byte_stride.unwrap_or(element_size).max(element_size);
        let start = view
            .byte_offset
            .checked_add(accessor.byte_offset)
            .ok_or_else(overflow)?;
        let needed = match accessor.count {
            0 => 0,
            n => (n - 1)
                .checked_mul(stride)
                .and_then(|b| b.checked_add(element_size))
                .ok_or_else(overflow)?,
        };
        let end = start.checked_add(needed).ok_or_else(overflow)?;
        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .ok_or_else(overflow)?;

        if end > view_end {
            return Err(LoadError::InvalidGlb("accessor exceeds buffer view".to_string()));
        }
        let bytes = self
            .bin
            .get(start..end)
            .ok_or_else(|| LoadError::InvalidGlb("buffer view exceeds BIN chunk".to_string()))?;
        Ok(Some((bytes, stride)))
    }

    fn read_vec3(&self, idx: usize) -> Result<Vec<[f32; 3]>, LoadError> {
        let accessor = self.accessor(idx)?;
        if accessor.component_type != FLOAT || accessor.kind != "VEC3" {
            return Err(LoadError::InvalidGlb(format!(
                "accessor {idx}: expected FLOAT VEC3, got {} {}",
                accessor.component_type, accessor.kind
            )));
        }

        let Some((bytes, stride)) = self.element_bytes(accessor, 12)? else {
            return Ok(vec![[0.0; 3]; accessor.count]);
        };

        Ok((0..accessor.count)
            .map(|i| {
                let base = i * stride;
                let f = |k: usize| {
                    let o = base + k * 4;
                    f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
                };
                [f(0), f(1), f(2)]
            })
            .collect())
    }

    fn read_indices(&self, idx: usize) -> Result<Vec<u32>, LoadError> {
        let accessor = self.accessor(idx)?;
        if accessor.kind != "SCALAR" {
            return Err(LoadError::InvalidGlb(format!(
                "accessor {idx}: indices must be SCALAR"
            )));
        }
        let size = match accessor.component_type {
            UNSIGNED_BYTE => 1,
            UNSIGNED_SHORT => 2,
            UNSIGNED_INT => 4,
            other => {
                return Err(LoadError::InvalidGlb(format!(
                    "accessor {idx}: unsupported index type {other}"
                )))
            }
        };

        let Some((bytes, stride)) = self.element_bytes(accessor, size)? else {
            return Ok(vec![0; accessor.count]);
        };

        Ok((0..accessor.count)
            .map(|i| {
                let o = i * stride;
                match size {
                    1 => bytes[o] as u32,
                    2 => u16::from_le_bytes([bytes[o], bytes[o + 1]]) as u32,
                    _ => u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]),
                }
            })
            .collect())
    }
}
