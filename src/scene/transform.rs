use glam::{Mat4, Vec3};

/// Position, Euler rotation (radians) and non-uniform scale.
///
/// The model matrix is always `T * Rz * Ry * Rx * S`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Same as [`Transform::new`] with the rotation given in degrees.
    pub fn from_degrees(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        Self::new(
            position,
            Vec3::new(
                rotation_degrees.x.to_radians(),
                rotation_degrees.y.to_radians(),
                rotation_degrees.z.to_radians(),
            ),
            scale,
        )
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }
}
