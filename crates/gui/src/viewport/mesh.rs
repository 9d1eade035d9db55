use glam::{Mat3, Mat4, Vec3};

/// Floats per vertex in [`MeshData::vertices`]
pub const VERTEX_STRIDE: usize = 9;

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z, r, g, b]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// 9 floats per vertex: position(3) + normal(3) + color(3)
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        let base = vertex * VERTEX_STRIDE;
        Vec3::new(
            self.vertices[base],
            self.vertices[base + 1],
            self.vertices[base + 2],
        )
    }

    /// Build from separate attribute arrays. Missing normals are derived
    /// per face (flat), missing indices mean a plain triangle list.
    pub fn from_attributes(
        positions: &[[f32; 3]],
        normals: Option<&[[f32; 3]]>,
        indices: Option<Vec<u32>>,
        color: [f32; 3],
    ) -> Self {
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());

        match normals {
            Some(normals) if normals.len() == positions.len() => {
                let mut vertices = Vec::with_capacity(positions.len() * VERTEX_STRIDE);
                for (p, n) in positions.iter().zip(normals) {
                    push_vert(&mut vertices, p[0], p[1], p[2], Vec3::from(*n), color);
                }
                MeshData { vertices, indices }
            }
            _ => flat_shaded(positions, &indices, color),
        }
    }

    /// Copy of the mesh with positions and normals moved into another space
    pub fn transformed(&self, matrix: &Mat4) -> MeshData {
        let normal_matrix = Mat3::from_mat4(*matrix).inverse().transpose();
        let mut vertices = self.vertices.clone();

        for chunk in vertices.chunks_exact_mut(VERTEX_STRIDE) {
            let p = matrix.transform_point3(Vec3::new(chunk[0], chunk[1], chunk[2]));
            let n = (normal_matrix * Vec3::new(chunk[3], chunk[4], chunk[5])).normalize_or_zero();
            chunk[0] = p.x;
            chunk[1] = p.y;
            chunk[2] = p.z;
            chunk[3] = n.x;
            chunk[4] = n.y;
            chunk[5] = n.z;
        }

        MeshData {
            vertices,
            indices: self.indices.clone(),
        }
    }

    /// Iterate triangles as vertex position triples.
    /// Triangles referencing out-of-range vertices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let count = self.vertex_count() as u32;
        self.indices.chunks_exact(3).filter_map(move |tri| {
            if tri.iter().any(|&i| i >= count) {
                return None;
            }
            Some([
                self.position(tri[0] as usize),
                self.position(tri[1] as usize),
                self.position(tri[2] as usize),
            ])
        })
    }

    /// Append another mesh, re-basing its indices
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

/// Lines mesh: interleaved [pos.x, pos.y, pos.z, r, g, b, a]
pub struct LineMeshData {
    /// 7 floats per vertex: position(3) + color(4)
    pub vertices: Vec<f32>,
}

// ── Primitive generation (fixtures and placeholders) ──

pub fn cube(w: f32, h: f32, d: f32, color: [f32; 3]) -> MeshData {
    let hw = w * 0.5;
    let hh = h * 0.5;
    let hd = d * 0.5;

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(-hw, -hh, hd), Vec3::new(hw, -hh, hd), Vec3::new(hw, hh, hd), Vec3::new(-hw, hh, hd)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hw, -hh, -hd), Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, hh, -hd), Vec3::new(hw, hh, -hd)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hw, -hh, hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, hh, -hd), Vec3::new(hw, hh, hd)], Vec3::X),
        // Left (-X)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(-hw, -hh, hd), Vec3::new(-hw, hh, hd), Vec3::new(-hw, hh, -hd)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(-hw, hh, hd), Vec3::new(hw, hh, hd), Vec3::new(hw, hh, -hd), Vec3::new(-hw, hh, -hd)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(-hw, -hh, -hd), Vec3::new(hw, -hh, -hd), Vec3::new(hw, -hh, hd), Vec3::new(-hw, -hh, hd)], Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(24 * VERTEX_STRIDE);
    let mut indices = Vec::with_capacity(36);

    for (quad, normal) in &faces {
        let base = (vertices.len() / VERTEX_STRIDE) as u32;
        for v in quad {
            push_vert(&mut vertices, v.x, v.y, v.z, *normal, color);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

pub fn sphere(radius: f32, rings: u32, sectors: u32, color: [f32; 3]) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for r in 0..=rings {
        let phi = std::f32::consts::PI * r as f32 / rings as f32;
        let sp = phi.sin();
        let cp = phi.cos();

        for s in 0..=sectors {
            let theta = std::f32::consts::TAU * s as f32 / sectors as f32;
            let n = Vec3::new(sp * theta.cos(), cp, sp * theta.sin());
            push_vert(&mut vertices, radius * n.x, radius * n.y, radius * n.z, n, color);
        }
    }

    for r in 0..rings {
        for s in 0..sectors {
            let i0 = r * (sectors + 1) + s;
            let i1 = i0 + 1;
            let i2 = i0 + sectors + 1;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    MeshData { vertices, indices }
}

// ── Ground grid ──────────────────────────────────────────────

pub fn grid(range: i32, cell_size: f32, opacity: f32) -> LineMeshData {
    let mut vertices = Vec::new();
    let grid_color = [0.25_f32, 0.25, 0.25, opacity];
    let center_color = [0.45_f32, 0.45, 0.45, opacity];

    let extent = range as f32 * cell_size;

    for i in -range..=range {
        let f = i as f32 * cell_size;
        let color = if i == 0 { center_color } else { grid_color };
        // Line along Z
        push_line_vert(&mut vertices, f, 0.0, -extent, color);
        push_line_vert(&mut vertices, f, 0.0, extent, color);
        // Line along X
        push_line_vert(&mut vertices, -extent, 0.0, f, color);
        push_line_vert(&mut vertices, extent, 0.0, f, color);
    }

    LineMeshData { vertices }
}

// ── Helpers ──────────────────────────────────────────────────

fn flat_shaded(positions: &[[f32; 3]], indices: &[u32], color: [f32; 3]) -> MeshData {
    let mut vertices = Vec::with_capacity(indices.len() * VERTEX_STRIDE);
    let mut out_indices = Vec::with_capacity(indices.len());

    for tri in indices.chunks_exact(3) {
        let Some(corners) = tri
            .iter()
            .map(|&i| positions.get(i as usize).map(|p| Vec3::from(*p)))
            .collect::<Option<Vec<Vec3>>>()
        else {
            continue;
        };
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        for c in &corners {
            out_indices.push((vertices.len() / VERTEX_STRIDE) as u32);
            push_vert(&mut vertices, c.x, c.y, c.z, normal, color);
        }
    }

    MeshData {
        vertices,
        indices: out_indices,
    }
}

fn push_vert(v: &mut Vec<f32>, px: f32, py: f32, pz: f32, n: Vec3, c: [f32; 3]) {
    v.extend_from_slice(&[px, py, pz, n.x, n.y, n.z, c[0], c[1], c[2]]);
}

fn push_line_vert(v: &mut Vec<f32>, px: f32, py: f32, pz: f32, c: [f32; 4]) {
    v.extend_from_slice(&[px, py, pz, c[0], c[1], c[2], c[3]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let m = cube(1.0, 1.0, 1.0, [1.0, 1.0, 1.0]);
        assert_eq!(m.vertex_count(), 24);
        assert_eq!(m.triangle_count(), 12);
        assert_eq!(m.triangles().count(), 12);
    }

    #[test]
    fn test_transformed_moves_positions() {
        let m = cube(2.0, 2.0, 2.0, [1.0, 1.0, 1.0]);
        let moved = m.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        for i in 0..moved.vertex_count() {
            assert!((moved.position(i).x - 10.0).abs() <= 1.0 + 1e-5);
        }
        // Normals unchanged by pure translation
        assert_eq!(&moved.vertices[3..6], &m.vertices[3..6]);
    }

    #[test]
    fn test_from_attributes_flat_normals() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let m = MeshData::from_attributes(&positions, None, None, [0.5, 0.5, 0.5]);
        assert_eq!(m.triangle_count(), 1);
        assert_eq!(&m.vertices[3..6], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_from_attributes_skips_bad_indices() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let m = MeshData::from_attributes(&positions, None, Some(vec![0, 1, 2, 0, 1, 7]), [1.0; 3]);
        assert_eq!(m.triangle_count(), 1);
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut a = cube(1.0, 1.0, 1.0, [1.0; 3]);
        let b = cube(1.0, 1.0, 1.0, [1.0; 3]);
        a.append(&b);
        assert_eq!(a.vertex_count(), 48);
        assert_eq!(a.triangle_count(), 24);
        assert_eq!(*a.indices.iter().max().unwrap(), 47);
    }
}
