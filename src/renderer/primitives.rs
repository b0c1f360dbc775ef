//! Builtin geometry, emitted as flat non-indexed `f32` arrays ready for upload.

/// Depth of the fullscreen sky triangle in clip space, just in front of the far plane.
pub const FULLSCREEN_SKY_DEPTH: f32 = 0.9999;

const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
];

// Two counter-clockwise triangles per face, in face order +Z, +X, -Z, -X, +Y, -Y.
const CUBE_TRIANGLES: [[usize; 3]; 12] = [
    [0, 2, 3],
    [0, 1, 2],
    [1, 7, 2],
    [1, 6, 7],
    [6, 5, 4],
    [4, 7, 6],
    [3, 4, 5],
    [3, 5, 0],
    [3, 7, 4],
    [3, 2, 7],
    [0, 6, 1],
    [0, 5, 6],
];

const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

const CUBE_UV_TRIANGLES: [[usize; 3]; 12] = [
    [0, 2, 3],
    [0, 1, 2],
    [0, 2, 3],
    [0, 1, 2],
    [0, 1, 2],
    [2, 3, 0],
    [2, 3, 0],
    [2, 0, 1],
    [0, 2, 3],
    [0, 1, 2],
    [3, 1, 2],
    [3, 0, 1],
];

const CUBE_FACE_NORMALS: [[f32; 3]; 6] = [
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
];

#[inline]
fn push_vertex(out: &mut Vec<f32>, uv: [f32; 2], normal: [f32; 3], pos: [f32; 3]) {
    out.extend_from_slice(&uv);
    out.extend_from_slice(&normal);
    out.extend_from_slice(&pos);
}

/// Textured cube spanning [-1, 1] on every axis, 36 vertices of `2f 3f 3f`.
pub fn cube() -> Vec<f32> {
    let mut data = Vec::with_capacity(36 * 8);
    for (tri, (corners, uvs)) in CUBE_TRIANGLES.iter().zip(CUBE_UV_TRIANGLES.iter()).enumerate() {
        let normal = CUBE_FACE_NORMALS[tri / 2];
        for (&corner, &uv) in corners.iter().zip(uvs.iter()) {
            push_vertex(&mut data, QUAD_UVS[uv], normal, CUBE_CORNERS[corner]);
        }
    }
    data
}

/// Quad spanning [-1, 1] in XY facing +Z, with UVs repeating `tiles` times.
/// Rotated -90 degrees about X it becomes a ground plane.
pub fn plane(tiles: f32) -> Vec<f32> {
    let normal = [0.0, 0.0, 1.0];
    let corners = [
        ([0.0, 0.0], [-1.0, -1.0, 0.0]),
        ([tiles, 0.0], [1.0, -1.0, 0.0]),
        ([tiles, tiles], [1.0, 1.0, 0.0]),
        ([0.0, tiles], [-1.0, 1.0, 0.0]),
    ];
    let mut data = Vec::with_capacity(6 * 8);
    for index in [0, 1, 2, 0, 2, 3] {
        let (uv, pos) = corners[index];
        push_vertex(&mut data, uv, normal, pos);
    }
    data
}

/// Position-only cube for the cube-mapped sky, 36 vertices of `3f`.
pub fn skybox() -> Vec<f32> {
    CUBE_TRIANGLES
        .iter()
        .flat_map(|tri| tri.iter())
        .flat_map(|&corner| CUBE_CORNERS[corner])
        .collect()
}

/// One clip-space triangle that covers the whole viewport.
pub fn fullscreen_triangle() -> Vec<f32> {
    let z = FULLSCREEN_SKY_DEPTH;
    vec![-1.0, -1.0, z, 3.0, -1.0, z, -1.0, 3.0, z]
}
