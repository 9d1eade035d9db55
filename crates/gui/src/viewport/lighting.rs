//! Scene light rig: a sky/ground hemisphere light, a flat ambient term and
//! one directional light. The mesh fragment shader evaluates the same sum.

use glam::Vec3;

/// Lights applied to every part mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLights {
    /// Hemisphere color for normals pointing up
    pub sky: Vec3,
    /// Hemisphere color for normals pointing down
    pub ground: Vec3,
    pub hemisphere_intensity: f32,
    pub ambient_intensity: f32,
    /// Unit vector towards the directional light
    pub direction: Vec3,
    pub directional_intensity: f32,
}

impl Default for SceneLights {
    fn default() -> Self {
        Self {
            sky: Vec3::ONE,
            ground: Vec3::splat(0x8d as f32 / 255.0),
            hemisphere_intensity: 0.45,
            ambient_intensity: 0.15,
            direction: Vec3::ONE.normalize(),
            directional_intensity: 0.4,
        }
    }
}

impl SceneLights {
    /// Light reaching a surface with the given normal, per color channel
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let n = normal.normalize_or_zero();
        let up = n.y * 0.5 + 0.5;
        let hemisphere = self.ground.lerp(self.sky, up) * self.hemisphere_intensity;
        let diffuse = n.dot(self.direction).max(0.0) * self.directional_intensity;
        hemisphere + Vec3::splat(self.ambient_intensity + diffuse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sky_brighter_than_ground() {
        let lights = SceneLights::default();
        let up = lights.irradiance(Vec3::Y);
        let down = lights.irradiance(-Vec3::Y);
        assert!(up.x > down.x);
        // Ground side still gets hemisphere and ambient light
        assert!(down.x > lights.ambient_intensity);
    }

    #[test]
    fn test_directional_side_is_lit() {
        let lights = SceneLights::default();
        let facing = lights.irradiance(Vec3::new(1.0, 0.0, 1.0));
        let away = lights.irradiance(Vec3::new(-1.0, 0.0, -1.0));
        assert!(facing.x > away.x);
    }

    #[test]
    fn test_never_overexposed() {
        let lights = SceneLights::default();
        let brightest = lights.irradiance(lights.direction);
        assert!(brightest.max_element() <= 1.0);
        assert!(lights.irradiance(Vec3::ZERO).min_element() > 0.0);
    }
}
