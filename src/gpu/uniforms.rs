use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::Uniform;

/// Per-draw shader inputs, laid out to match `DrawUniforms` in the WGSL sources.
/// Every program reads the subset it needs.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct DrawUniforms {
    pub m_proj: [[f32; 4]; 4],
    pub m_view: [[f32; 4]; 4],
    pub m_model: [[f32; 4]; 4],
    /// Inverse-transpose of `m_model`, derived whenever the model is written.
    pub m_normal: [[f32; 4]; 4],
    pub m_view_light: [[f32; 4]; 4],
    pub m_inv_proj_view: [[f32; 4]; 4],
    pub cam_pos: [f32; 4],
    pub light_position: [f32; 4],
    pub light_ia: [f32; 4],
    pub light_id: [f32; 4],
    pub light_is: [f32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            m_proj: identity,
            m_view: identity,
            m_model: identity,
            m_normal: identity,
            m_view_light: identity,
            m_inv_proj_view: identity,
            cam_pos: [0.0; 4],
            light_position: [0.0; 4],
            light_ia: [0.0; 4],
            light_id: [0.0; 4],
            light_is: [0.0; 4],
        }
    }
}

impl DrawUniforms {
    pub fn apply(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Projection(m) => self.m_proj = m.to_cols_array_2d(),
            Uniform::View(m) => self.m_view = m.to_cols_array_2d(),
            Uniform::Model(m) => {
                self.m_model = m.to_cols_array_2d();
                self.m_normal = m.inverse().transpose().to_cols_array_2d();
            }
            Uniform::LightView(m) => self.m_view_light = m.to_cols_array_2d(),
            Uniform::InvProjView(m) => self.m_inv_proj_view = m.to_cols_array_2d(),
            Uniform::CameraPosition(v) => self.cam_pos = point(v),
            Uniform::LightPosition(v) => self.light_position = point(v),
            Uniform::LightAmbient(v) => self.light_ia = color(v),
            Uniform::LightDiffuse(v) => self.light_id = color(v),
            Uniform::LightSpecular(v) => self.light_is = color(v),
        }
    }
}

fn point(v: Vec3) -> [f32; 4] {
    v.extend(1.0).to_array()
}

fn color(v: Vec3) -> [f32; 4] {
    v.extend(0.0).to_array()
}
