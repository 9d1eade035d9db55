use glam::{Vec2, Vec3};
use shared::PartId;

use super::camera::OrbitCamera;
use super::mesh::MeshData;
use crate::state::model::Model;

/// A ray in world space
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Compute AABB from MeshData positions
    pub fn from_mesh(data: &MeshData) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for i in 0..data.vertex_count() {
            let p = data.position(i);
            min = min.min(p);
            max = max.max(p);
        }

        Self { min, max }
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Width, height and depth
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = Vec3::ONE / ray.direction;

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection algorithm.
/// Returns the distance along the ray if hit, or None if no intersection.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-9;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Distance to the nearest triangle of the mesh hit by the ray
pub fn nearest_triangle_hit(ray: &Ray, mesh: &MeshData) -> Option<f32> {
    mesh.triangles()
        .filter_map(|[v0, v1, v2]| ray_triangle_intersect(ray, v0, v1, v2))
        .min_by(f32::total_cmp)
}

/// A part hit by a ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartHit {
    pub part: PartId,
    pub distance: f32,
}

/// All parts hit by the ray, nearest first
pub fn intersect_parts(ray: &Ray, meshes: &[(PartId, MeshData)]) -> Vec<PartHit> {
    let mut hits: Vec<PartHit> = meshes
        .iter()
        .filter(|(_, mesh)| ray_aabb(ray, &Aabb::from_mesh(mesh)).is_some())
        .filter_map(|(part, mesh)| {
            nearest_triangle_hit(ray, mesh).map(|distance| PartHit {
                part: *part,
                distance,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Ray intersection service used by the controller
pub trait PartPicker {
    /// Visible parts of `model` under the NDC point, nearest first
    fn parts_under(&self, model: &Model, ndc: Vec2) -> Vec<PartId>;
}

/// Picks through an orbit camera
pub struct CameraPicker<'a> {
    pub camera: &'a OrbitCamera,
    /// Viewport width / height
    pub aspect: f32,
}

impl PartPicker for CameraPicker<'_> {
    fn parts_under(&self, model: &Model, ndc: Vec2) -> Vec<PartId> {
        let ray = self.camera.ndc_ray(ndc, self.aspect);
        intersect_parts(&ray, &model.visible_meshes())
            .into_iter()
            .map(|hit| hit.part)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::mesh;
    use glam::Mat4;

    fn ray_down_z(x: f32, y: f32) -> Ray {
        Ray {
            origin: Vec3::new(x, y, 10.0),
            direction: Vec3::NEG_Z,
        }
    }

    #[test]
    fn test_ray_aabb_hit_and_miss() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        assert!((ray_aabb(&ray_down_z(0.0, 0.0), &aabb).unwrap() - 9.0).abs() < 1e-5);
        assert!(ray_aabb(&ray_down_z(3.0, 0.0), &aabb).is_none());
    }

    #[test]
    fn test_ray_triangle() {
        let t = ray_triangle_intersect(
            &ray_down_z(0.1, 0.1),
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
        );
        assert!((t.unwrap() - 10.0).abs() < 1e-5);
        assert!(ray_triangle_intersect(&ray_down_z(2.0, 2.0), Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_intersect_parts_sorted_nearest_first() {
        let near = mesh::cube(1.0, 1.0, 1.0, [1.0; 3])
            .transformed(&Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0)));
        let far = mesh::cube(1.0, 1.0, 1.0, [1.0; 3]);
        let aside = mesh::cube(1.0, 1.0, 1.0, [1.0; 3])
            .transformed(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));

        let hits = intersect_parts(&ray_down_z(0.1, 0.2), &[(7, far), (3, near), (9, aside)]);
        let parts: Vec<PartId> = hits.iter().map(|h| h.part).collect();
        assert_eq!(parts, vec![3, 7]);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_intersect_parts_empty_on_miss() {
        let m = mesh::cube(1.0, 1.0, 1.0, [1.0; 3]);
        assert!(intersect_parts(&ray_down_z(4.0, 4.0), &[(0, m)]).is_empty());
    }
}
