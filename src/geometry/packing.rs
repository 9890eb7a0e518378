use super::*;

impl GraphicsGeometry {
    /// Prepares a batchable geometry for direct consumption.
    ///
    /// Every part gets its color and texture slot 0, and its indices are rebased onto its
    /// first vertex so the part can be copied into a batch renderer's buffers on its own.
    pub(super) fn pack_batches(&mut self) {
        self.release_draw_calls();
        self.batch_dirty += 1;

        let vertex_count = self.points.len();
        self.colors.resize(vertex_count, 0);
        self.texture_ids.resize(vertex_count, 0.0);

        for part in &self.batches {
            let Some(style) = part.style() else {
                continue;
            };
            let range = part.attrib_start()..part.attrib_end();
            self.colors[range.clone()].fill(style.packed_color());
            self.texture_ids[range].fill(0.0);
            self.index_buffer
                .rebase(part.index_start()..part.index_end(), part.attrib_start());
        }

        self.pack_attributes();
    }

    /// Interleaves position, UV, color and texture slot into the packed vertex buffer.
    pub(super) fn pack_attributes(&mut self) {
        self.packed.clear();
        self.packed.extend(
            self.points
                .iter()
                .zip(&self.uvs)
                .zip(&self.colors)
                .zip(&self.texture_ids)
                .map(|(((position, uv), &color), &texture_id)| BatchVertex {
                    position: position.to_array(),
                    tex_coords: *uv,
                    color,
                    texture_id,
                }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn batchable_parts_are_rebased_onto_their_first_vertex() {
        let mut geometry = GraphicsGeometry::new();
        geometry
            .draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), FillStyle::solid(Color::WHITE), LineStyle::default(), None)
            .draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), FillStyle::solid(Color::BLACK), LineStyle::default(), None);
        geometry.update_batches();

        assert!(geometry.is_batchable());
        assert_eq!(
            geometry.index_buffer(),
            &IndexBuffer::U16(vec![0, 1, 2, 0, 2, 3, 0, 1, 2, 0, 2, 3])
        );
        assert_eq!(&geometry.indices()[6..], &[4, 5, 6, 4, 6, 7]);
        assert!(geometry.texture_ids().iter().all(|&id| id == 0.0));
    }

    #[test]
    fn packed_vertex_carries_every_attribute() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 16.0, 16.0),
            FillStyle::solid(Color::rgb(1, 2, 3)),
            LineStyle::default(),
            None,
        );
        geometry.update_batches();

        let vertices = geometry.packed_vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[2].position, [16.0, 16.0]);
        assert_eq!(vertices[2].tex_coords, [1.0, 1.0]);
        assert_eq!(vertices[2].color.to_le_bytes(), [1, 2, 3, 255]);
        assert_eq!(vertices[2].texture_id, 0.0);
        assert_eq!(geometry.packed_bytes().len(), 4 * BatchVertex::STRIDE);
    }

    #[test]
    fn rebuilding_twice_is_byte_identical() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::circle(10.0, 10.0, 5.0),
            FillStyle::solid(Color::WHITE),
            LineStyle::solid(1.0, Color::BLACK),
            None,
        );
        geometry.update_batches();
        let bytes = geometry.packed_bytes().to_vec();
        let indices = geometry.index_buffer().as_bytes().to_vec();
        let batch_dirty = geometry.batch_dirty();

        geometry.update_batches();
        assert_eq!(geometry.packed_bytes(), bytes.as_slice());
        assert_eq!(geometry.index_buffer().as_bytes(), indices.as_slice());
        assert_eq!(geometry.batch_dirty(), batch_dirty);
    }
}
