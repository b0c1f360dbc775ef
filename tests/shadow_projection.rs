//! CPU replica of the shadow lookup in `lit.wgsl`, fed by the same matrices
//! the renderer uploads (camera projection times light view).

use biome_viewer::scene::{Camera, Light};
use biome_viewer::settings::{CameraSettings, LightSettings};
use glam::{Mat4, Vec3, Vec4};

const EPSILON: f32 = 1e-5;

fn shadow_matrix() -> (Mat4, Light) {
    let camera = Camera::new(&CameraSettings::default(), 1.0);
    let light = Light::from_settings(&LightSettings::default());
    (camera.projection() * light.view(), light)
}

fn shadow_clip(matrix: Mat4, world: Vec3) -> Vec4 {
    matrix * world.extend(1.0)
}

/// Returns (u, v, depth) exactly as the fragment shader derives them.
fn shadow_lookup(matrix: Mat4, world: Vec3) -> Vec3 {
    let clip = shadow_clip(matrix, world);
    let ndc = clip.truncate() / clip.w;
    Vec3::new(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5, ndc.z)
}

#[test]
fn light_target_lands_in_the_middle_of_the_map() {
    let (matrix, _) = shadow_matrix();
    let lookup = shadow_lookup(matrix, Vec3::ZERO);

    assert!((lookup.x - 0.5).abs() < EPSILON, "u = {}", lookup.x);
    assert!((lookup.y - 0.5).abs() < EPSILON, "v = {}", lookup.y);
    assert!(lookup.z > 0.0 && lookup.z < 1.0, "depth = {}", lookup.z);
}

#[test]
fn texture_v_runs_opposite_to_clip_y() {
    let (matrix, light) = shadow_matrix();
    let light_up = light.view().inverse().transform_vector3(Vec3::Y);
    let above = light_up * 2.0;

    let clip = shadow_clip(matrix, above);
    let lookup = shadow_lookup(matrix, above);

    assert!(clip.y / clip.w > 0.0);
    assert!(lookup.y < 0.5, "v = {}", lookup.y);
}

#[test]
fn points_nearer_the_light_store_smaller_depth() {
    let (matrix, light) = shadow_matrix();
    let toward_light = light.position().normalize();

    let far = shadow_lookup(matrix, toward_light * 5.0);
    let near = shadow_lookup(matrix, toward_light * 40.0);

    assert!(near.z < far.z, "near {} vs far {}", near.z, far.z);
    assert!(near.z > 0.0);
}

#[test]
fn points_behind_the_light_have_no_valid_projection() {
    let (matrix, light) = shadow_matrix();
    let behind = light.position() + light.position().normalize() * 5.0;

    assert!(shadow_clip(matrix, behind).w <= 0.0);
}
