use glam::{Mat4, Vec3};

use crate::settings::LightSettings;

const AMBIENT: f32 = 0.06;
const DIFFUSE: f32 = 0.8;
const SPECULAR: f32 = 1.0;

/// Single light aimed at the world origin. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    position: Vec3,
    color: Vec3,
    ambient: Vec3,
    diffuse: Vec3,
    specular: Vec3,
    view: Mat4,
}

impl Light {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        let target = Vec3::ZERO;
        let dir = (target - position).normalize_or_zero();
        // look_at degenerates when looking along the up axis.
        let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Self {
            position,
            color,
            ambient: color * AMBIENT,
            diffuse: color * DIFFUSE,
            specular: color * SPECULAR,
            view: Mat4::look_at_rh(position, target, up),
        }
    }

    pub fn from_settings(settings: &LightSettings) -> Self {
        Self::new(Vec3::from(settings.position), Vec3::from(settings.color))
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn diffuse(&self) -> Vec3 {
        self.diffuse
    }

    pub fn specular(&self) -> Vec3 {
        self.specular
    }

    /// World to light space.
    pub fn view(&self) -> Mat4 {
        self.view
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::from_settings(&LightSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensities_scale_color() {
        let light = Light::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 0.5, 0.0));
        assert!(light.ambient().abs_diff_eq(Vec3::new(0.06, 0.03, 0.0), 1e-6));
        assert!(light.diffuse().abs_diff_eq(Vec3::new(0.8, 0.4, 0.0), 1e-6));
        assert_eq!(light.specular(), light.color());
    }

    #[test]
    fn view_looks_at_origin() {
        let light = Light::default();
        let eye = light.view().transform_point3(light.position());
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-4));
        // origin is straight ahead on -Z in view space
        let origin = light.view().transform_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-4 && origin.y.abs() < 1e-4 && origin.z < 0.0);
    }

    #[test]
    fn overhead_light_has_a_valid_view() {
        let light = Light::new(Vec3::new(0.0, 30.0, 0.0), Vec3::ONE);
        assert!(light.view().is_finite());
        let origin = light.view().transform_point3(Vec3::ZERO);
        assert!((origin.z + 30.0).abs() < 1e-4);
    }
}
