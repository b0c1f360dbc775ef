use std::mem;

/// Describes how a flat `f32` vertex buffer maps onto shader inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexLayout {
    /// Short format string, `"2f 3f 3f"` style.
    pub format: &'static str,
    pub floats_per_vertex: usize,
    pub attributes: &'static [wgpu::VertexAttribute],
}

const TEXTURED_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2, // uv
    1 => Float32x3, // normal
    2 => Float32x3  // position
];

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

impl VertexLayout {
    /// Interleaved uv, normal, position. Every lit mesh uses this.
    pub const TEXTURED: VertexLayout = VertexLayout {
        format: "2f 3f 3f",
        floats_per_vertex: 8,
        attributes: &TEXTURED_ATTRS,
    };

    /// Position only, for sky geometry.
    pub const POSITION: VertexLayout = VertexLayout {
        format: "3f",
        floats_per_vertex: 3,
        attributes: &POSITION_ATTRS,
    };

    pub fn stride(&self) -> wgpu::BufferAddress {
        (self.floats_per_vertex * mem::size_of::<f32>()) as wgpu::BufferAddress
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: self.attributes,
        }
    }

    /// Number of whole vertices in `floats` values, or `None` if it does not divide evenly.
    pub fn vertex_count(&self, floats: usize) -> Option<u32> {
        if floats % self.floats_per_vertex != 0 {
            return None;
        }
        u32::try_from(floats / self.floats_per_vertex).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textured_stride_covers_all_attributes() {
        let layout = VertexLayout::TEXTURED;
        let last = layout.attributes[2];
        assert_eq!(layout.stride(), 32);
        assert_eq!(last.offset + last.format.size(), layout.stride());
    }

    #[test]
    fn position_layout_is_three_floats() {
        assert_eq!(VertexLayout::POSITION.stride(), 12);
        assert_eq!(VertexLayout::POSITION.attributes[0].shader_location, 0);
    }

    #[test]
    fn vertex_count_rejects_partial_vertices() {
        assert_eq!(VertexLayout::TEXTURED.vertex_count(16), Some(2));
        assert_eq!(VertexLayout::TEXTURED.vertex_count(15), None);
    }
}
