use glam::{Mat3, Mat4, Vec3};

use crate::input::{InputSnapshot, MovementKeys};
use crate::settings::CameraSettings;

/// Pitch limit in degrees. Looking straight up or down would flip `right`.
pub const PITCH_LIMIT: f32 = 89.0;

/// Free-fly camera driven by pointer motion and movement keys.
///
/// Yaw and pitch are kept in degrees. `view` is rebuilt on every update,
/// `projection` only when the aspect ratio changes.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    fov_y_radians: f32,
    near: f32,
    far: f32,
    aspect: f32,
    speed: f32,
    sensitivity: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        let mut camera = Self {
            position: Vec3::from(settings.position),
            yaw: settings.yaw_degrees,
            pitch: settings.pitch_degrees.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            fov_y_radians: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            aspect: sanitize_aspect(aspect),
            speed: settings.speed,
            sensitivity: settings.sensitivity,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.rebuild_projection();
        camera.rebuild_basis();
        camera
    }

    /// Applies one frame of input. `dt` is the frame duration in seconds.
    pub fn update(&mut self, input: &InputSnapshot, dt: f32) {
        self.rotate(input.pointer_delta.x, input.pointer_delta.y);
        self.rebuild_basis();
        self.translate(input.held, dt);
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw = (self.yaw + dx * self.sensitivity) % 360.0;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    fn translate(&mut self, held: MovementKeys, dt: f32) {
        let step = self.speed * dt;
        let mut delta = Vec3::ZERO;
        if held.contains(MovementKeys::FORWARD) {
            delta += self.forward;
        }
        if held.contains(MovementKeys::BACK) {
            delta -= self.forward;
        }
        if held.contains(MovementKeys::RIGHT) {
            delta += self.right;
        }
        if held.contains(MovementKeys::LEFT) {
            delta -= self.right;
        }
        if held.contains(MovementKeys::UP) {
            delta += Vec3::Y;
        }
        if held.contains(MovementKeys::DOWN) {
            delta -= Vec3::Y;
        }
        self.position += delta * step;
    }

    fn rebuild_basis(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.forward = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.forward.cross(Vec3::Y).normalize();
        self.up = self.right.cross(self.forward).normalize();
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    fn rebuild_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far);
    }

    /// Called on window resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        let aspect = sanitize_aspect(aspect);
        if aspect != self.aspect {
            self.aspect = aspect;
            self.rebuild_projection();
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// View with the translation stripped, for sky rendering.
    pub fn sky_view(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.view))
    }
}

// Minimized windows report a zero height.
fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}
