//! Mesh validation utilities.
//!
//! `MeshValidator` checks mesh data integrity: correct stride, in-range
//! indices, normalized normals, AABB dimensions. The loader runs
//! [`validate_model`] on every parsed model and logs what it finds.

use crate::state::model::Model;
use crate::viewport::mesh::{MeshData, VERTEX_STRIDE};
use crate::viewport::picking::Aabb;

/// Validator for `MeshData` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a MeshData,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a MeshData) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Check that the vertex buffer length is a multiple of the stride.
    pub fn is_stride_valid(&self) -> bool {
        self.mesh.vertices.len() % VERTEX_STRIDE == 0
    }

    /// Check that the index buffer length is a multiple of 3.
    pub fn is_index_stride_valid(&self) -> bool {
        self.mesh.indices.len() % 3 == 0
    }

    /// Check that all indices are within the valid vertex range.
    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.indices.iter().all(|&i| i < max_idx)
    }

    /// Check that all vertex normals have unit length (within epsilon).
    pub fn are_normals_normalized(&self, epsilon: f32) -> bool {
        self.mesh
            .vertices
            .chunks_exact(VERTEX_STRIDE)
            .all(|v| {
                let len = (v[3] * v[3] + v[4] * v[4] + v[5] * v[5]).sqrt();
                (len - 1.0).abs() <= epsilon
            })
    }

    /// Triangles with (near) zero area
    pub fn degenerate_triangle_count(&self) -> usize {
        self.mesh
            .triangles()
            .filter(|[a, b, c]| (*b - *a).cross(*c - *a).length_squared() < 1e-20)
            .count()
    }

    /// Whether every vertex has this color (within epsilon per channel).
    pub fn has_color(&self, color: [f32; 3], epsilon: f32) -> bool {
        self.vertex_count() > 0
            && self
                .mesh
                .vertices
                .chunks_exact(VERTEX_STRIDE)
                .all(|v| (0..3).all(|k| (v[6 + k] - color[k]).abs() < epsilon))
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_mesh(self.mesh)
    }

    /// Width, height and depth of the bounding box.
    pub fn dimensions(&self) -> [f32; 3] {
        self.aabb().size().to_array()
    }

    /// Check that the AABB dimensions are approximately equal to `expected`.
    pub fn assert_dimensions_approx(&self, expected: [f32; 3], tolerance: f32) -> bool {
        let dims = self.dimensions();
        (0..3).all(|k| (dims[k] - expected[k]).abs() < tolerance)
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the mesh is valid.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.is_stride_valid() {
            errors.push(format!(
                "Vertex buffer length {} is not a multiple of {VERTEX_STRIDE}",
                self.mesh.vertices.len()
            ));
        }

        if !self.is_index_stride_valid() {
            errors.push(format!(
                "Index buffer length {} is not a multiple of 3",
                self.mesh.indices.len()
            ));
        }

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self
                .mesh
                .indices
                .iter()
                .filter(|&&i| i >= max_idx)
                .take(5)
                .collect();
            errors.push(format!(
                "Indices out of range (vertex_count={}): {:?}",
                max_idx, out_of_range
            ));
        }

        if self.vertex_count() > 0 && !self.are_normals_normalized(0.1) {
            errors.push("Some normals are not unit-length (epsilon=0.1)".to_string());
        }

        errors
    }
}

/// Problems found in the model's part meshes, prefixed with the part name.
pub fn validate_model(model: &Model) -> Vec<String> {
    (0..model.part_count())
        .filter_map(|id| model.part(id))
        .filter_map(|part| part.mesh.as_ref().map(|m| (part.name.as_str(), m)))
        .flat_map(|(name, mesh)| {
            MeshValidator::new(mesh)
                .validate_all()
                .into_iter()
                .map(move |e| format!("{name}: {e}"))
        })
        .collect()
}
