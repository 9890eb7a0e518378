use bytemuck::{Pod, Zeroable};

/// One interleaved vertex as uploaded to the GPU.
///
/// The field order and the 24 byte stride are what the batch shaders read, so they must
/// not change.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, Pod, Zeroable)]
pub struct BatchVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    /// Premultiplied color whose little-endian bytes read R, G, B, A.
    pub color: u32,
    /// Texture slot within the draw call, 0 for directly batched geometry.
    pub texture_id: f32,
}

impl BatchVertex {
    pub const STRIDE: usize = std::mem::size_of::<BatchVertex>();

    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Unorm8x4,
        3 => Float32
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BatchVertex;

    #[test]
    fn stride_is_six_words() {
        assert_eq!(BatchVertex::STRIDE, 24);
        assert_eq!(BatchVertex::desc().array_stride, 24);
    }

    #[test]
    fn attribute_offsets_follow_field_order() {
        let offsets: Vec<u64> = BatchVertex::desc()
            .attributes
            .iter()
            .map(|attribute| attribute.offset)
            .collect();
        assert_eq!(offsets, vec![0, 8, 16, 20]);
    }

    #[test]
    fn color_bytes_land_at_offset_sixteen() {
        let vertex = BatchVertex {
            color: u32::from_le_bytes([1, 2, 3, 4]),
            ..Default::default()
        };
        let bytes = bytemuck::bytes_of(&vertex);
        assert_eq!(&bytes[16..20], &[1, 2, 3, 4]);
    }
}
