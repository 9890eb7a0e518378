use super::*;
use crate::style::mergeable;
use crate::tessellation::TessellationError;
use crate::texture::WrapMode;

/// Above this many vertices a 16-bit index buffer can no longer address every vertex.
pub(super) const MAX_U16_VERTICES: usize = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StyleSlot {
    Fill,
    Line,
}

impl GraphicsGeometry {
    /// Brings the batches, draw calls and packed buffers up to date with the drawn shapes.
    ///
    /// Calling this again without drawing anything in between does nothing. Shapes drawn
    /// since the previous call are appended to the existing batches instead of rebuilding
    /// everything. While any style references a texture that has not loaded yet, the
    /// update is postponed.
    pub fn update_batches(&mut self) {
        if self.shapes.is_empty() {
            self.batchable = true;
            return;
        }

        if self.cache_dirty == Some(self.dirty) {
            return;
        }

        if !self.textures_valid() {
            warn!("deferring geometry rebuild until all style textures are loaded");
            return;
        }

        self.cache_dirty = Some(self.dirty);
        debug!(
            from = self.shape_index,
            to = self.shapes.len(),
            "updating geometry batches"
        );

        // The last part stays open so the first new style can extend it.
        let mut open = !self.batches.is_empty();

        while self.shape_index < self.shapes.len() {
            let shape_index = self.shape_index;
            self.shape_index += 1;
            open = self.build_record(shape_index, open);
        }

        let index_end = self.indices.len();
        let attrib_end = self.points.len();
        if open {
            if let Some(part) = self.batches.last_mut() {
                part.end(index_end, attrib_end);
            }
        }

        if self.batches.is_empty() {
            self.batchable = true;
            return;
        }

        let wide = attrib_end > MAX_U16_VERTICES;
        self.index_buffer.write_from(&self.indices, wide);

        self.batchable = self.is_batchable_now();
        if self.batchable {
            self.pack_batches();
        } else {
            self.build_draw_calls();
        }

        debug!(
            vertices = attrib_end,
            indices = index_end,
            batches = self.batches.len(),
            draw_calls = self.draw_calls.len(),
            batchable = self.batchable,
            "geometry batches updated"
        );
    }

    /// Tessellates one record into the shared buffers. Takes and returns whether the last
    /// batch part is still open.
    fn build_record(&mut self, shape_index: usize, mut open: bool) -> bool {
        let Self {
            shapes,
            tessellator,
            points,
            uvs,
            indices,
            batches,
            ..
        } = self;
        let record = &mut shapes[shape_index];

        tessellator.build_shape(record);

        let fill_visible = record.fill_style().visible;
        let line_visible = record.line_style().visible;
        if fill_visible || line_visible {
            for hole in record.holes_mut() {
                tessellator.build_hole(hole);
            }
        }
        let record = &*record;

        for slot in [StyleSlot::Fill, StyleSlot::Line] {
            let style = match slot {
                StyleSlot::Fill if fill_visible => BatchStyle::from(record.fill_style()),
                StyleSlot::Line if line_visible => BatchStyle::from(record.line_style()),
                _ => continue,
            };

            let index_start = indices.len();
            let attrib_start = points.len();
            style.texture.base().set_wrap_mode(WrapMode::Repeat);

            let result = match slot {
                StyleSlot::Fill => tessellator.triangulate(record, points, indices),
                StyleSlot::Line => build_lines_with_holes(tessellator, record, points, indices),
            };
            if let Err(error) = result {
                warn!(shape = shape_index, ?slot, %error, "dropping geometry that failed to tessellate");
                points.truncate(attrib_start);
                indices.truncate(index_start);
            }

            if points.len() == attrib_start {
                continue;
            }

            if open {
                let current = batches.last().and_then(|part| part.style());
                if !mergeable(current, Some(&style)) {
                    if let Some(part) = batches.last_mut() {
                        part.end(index_start, attrib_start);
                    }
                    trace!(parts = batches.len(), "closed batch part on style change");
                    open = false;
                }
            }

            uvs.resize(attrib_start, [0.0; 2]);
            uv::add_uvs(
                &points[attrib_start..],
                &style.texture,
                style.matrix.as_ref(),
                uvs,
            );

            if !open {
                let mut part = with_pool(|pool| pool.acquire_batch_part());
                part.begin(style, index_start, attrib_start);
                batches.push(part);
                open = true;
            }
        }

        open
    }

    fn textures_valid(&self) -> bool {
        self.shapes.iter().all(|record| {
            record.fill_style().texture.base().is_valid()
                && record.line_style().texture.base().is_valid()
        })
    }

    /// Small geometries without native lines skip draw-call compilation entirely.
    fn is_batchable_now(&self) -> bool {
        let vertices = self.points.len();
        vertices <= self.config.batchable_size
            && vertices <= MAX_U16_VERTICES
            && !self
                .batches
                .iter()
                .any(|part| part.style().is_some_and(|style| style.native))
    }
}

/// Strokes the record and then each of its holes.
fn build_lines_with_holes(
    tessellator: &mut Tessellator,
    record: &ShapeRecord,
    points: &mut Vec<Point>,
    indices: &mut Vec<u32>,
) -> Result<(), TessellationError> {
    tessellator.build_lines(record, points, indices)?;
    for hole in record.holes() {
        tessellator.build_lines(hole, points, indices)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::texture::{BaseTexture, Texture};

    fn fill(color: Color) -> FillStyle {
        FillStyle::solid(color)
    }

    #[test]
    fn empty_geometry_is_trivially_batchable() {
        let mut geometry = GraphicsGeometry::new();
        geometry.update_batches();
        assert!(geometry.is_batchable());
        assert!(geometry.batches().is_empty());
    }

    #[test]
    fn same_style_shapes_share_one_part() {
        let mut geometry = GraphicsGeometry::new();
        for i in 0..3 {
            geometry.draw_shape(
                Shape::rect(i as f32 * 20.0, 0.0, 10.0, 10.0),
                fill(Color::WHITE),
                LineStyle::default(),
                None,
            );
        }
        geometry.update_batches();

        assert_eq!(geometry.batches().len(), 1);
        assert_eq!(geometry.batches()[0].attrib_size(), 12);
        assert_eq!(geometry.batches()[0].size(), 18);
    }

    #[test]
    fn style_change_closes_the_part() {
        let mut geometry = GraphicsGeometry::new();
        geometry
            .draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), fill(Color::WHITE), LineStyle::default(), None)
            .draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), fill(Color::BLACK), LineStyle::default(), None);
        geometry.update_batches();

        let parts = geometry.batches();
        assert_eq!(parts.len(), 2);
        assert_eq!((parts[0].attrib_start(), parts[0].attrib_end()), (0, 4));
        assert_eq!((parts[1].attrib_start(), parts[1].attrib_end()), (4, 8));
        assert_eq!((parts[1].index_start(), parts[1].index_end()), (6, 12));
    }

    #[test]
    fn invisible_styles_produce_no_parts() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::default(),
            LineStyle::default(),
            None,
        );
        geometry.update_batches();

        assert!(geometry.batches().is_empty());
        assert!(geometry.is_batchable());
        assert_eq!(geometry.tessellation_counts().shapes_built, 1);
    }

    #[test]
    fn degenerate_shape_is_skipped() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(Shape::circle(0.0, 0.0, 0.0), fill(Color::WHITE), LineStyle::default(), None);
        geometry.update_batches();

        assert!(geometry.batches().is_empty());
        assert!(geometry.is_batchable());
    }

    #[test]
    fn fill_then_line_of_same_style_merge() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            fill(Color::WHITE),
            LineStyle::solid(2.0, Color::WHITE),
            None,
        );
        geometry.update_batches();
        assert_eq!(geometry.batches().len(), 1);
    }

    #[test]
    fn native_lines_force_draw_calls() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::default(),
            LineStyle::native(Color::BLACK),
            None,
        );
        geometry.update_batches();

        assert!(!geometry.is_batchable());
        assert_eq!(geometry.draw_calls().len(), 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = GeometryConfig::default().with_batchable_size(4);
        let mut geometry = GraphicsGeometry::with_config(config);
        geometry.draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), fill(Color::WHITE), LineStyle::default(), None);
        geometry.update_batches();
        assert!(geometry.is_batchable());

        geometry.draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), fill(Color::WHITE), LineStyle::default(), None);
        geometry.update_batches();
        assert!(!geometry.is_batchable());
    }

    #[test]
    fn pending_texture_defers_the_rebuild() {
        let base = BaseTexture::pending();
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::textured(Texture::from_base(base.clone())),
            LineStyle::default(),
            None,
        );

        geometry.update_batches();
        assert!(geometry.batches().is_empty());
        assert_eq!(geometry.tessellation_counts().shapes_built, 0);

        base.set_size(10, 10);
        geometry.update_batches();
        assert_eq!(geometry.batches().len(), 1);
    }

    #[test]
    fn style_texture_is_switched_to_repeat() {
        let texture = Texture::from_base(BaseTexture::new(8, 8));
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::textured(texture.clone()),
            LineStyle::default(),
            None,
        );
        geometry.update_batches();

        assert_eq!(texture.base().wrap_mode(), WrapMode::Repeat);
    }

    #[test]
    fn uvs_track_every_vertex() {
        let mut geometry = GraphicsGeometry::new();
        geometry
            .draw_shape(Shape::circle(0.0, 0.0, 20.0), fill(Color::WHITE), LineStyle::solid(3.0, Color::BLACK), None)
            .draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), fill(Color::BLACK), LineStyle::default(), None);
        geometry.update_batches();

        assert_eq!(geometry.uvs().len(), geometry.vertex_count());
        assert_eq!(geometry.colors().len(), geometry.vertex_count());
        assert_eq!(geometry.texture_ids().len(), geometry.vertex_count());
        assert_eq!(geometry.packed_vertices().len(), geometry.vertex_count());
    }

    fn unbounded_threshold() -> GraphicsGeometry {
        GraphicsGeometry::with_config(GeometryConfig::default().with_batchable_size(usize::MAX))
    }

    fn draw_unit_rects(geometry: &mut GraphicsGeometry, count: usize) {
        for i in 0..count {
            geometry.draw_shape(
                Shape::rect((i % 256) as f32, (i / 256) as f32, 1.0, 1.0),
                fill(Color::WHITE),
                LineStyle::default(),
                None,
            );
        }
    }

    #[test]
    fn sixteen_bit_cap_overrides_the_threshold() {
        let mut geometry = unbounded_threshold();
        draw_unit_rects(&mut geometry, 16_384);
        geometry.update_batches();

        assert_eq!(geometry.vertex_count(), MAX_U16_VERTICES + 1);
        assert!(!geometry.is_batchable());
        assert_eq!(geometry.draw_calls().len(), 1);
        assert_eq!(geometry.draw_calls()[0].size(), 16_384 * 6);
        assert!(geometry.index_buffer().is_wide());
    }

    #[test]
    fn exactly_u16_max_vertices_keeps_narrow_indices() {
        let mut geometry = unbounded_threshold();
        draw_unit_rects(&mut geometry, 16_383);
        geometry.draw_shape(
            Shape::polygon([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
            fill(Color::WHITE),
            LineStyle::default(),
            None,
        );
        geometry.update_batches();

        assert_eq!(geometry.vertex_count(), MAX_U16_VERTICES);
        assert!(matches!(geometry.index_buffer(), IndexBuffer::U16(_)));
        assert!(geometry.is_batchable());
    }

    #[test]
    fn holes_are_stroked_with_the_shape() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 100.0, 100.0),
            fill(Color::WHITE),
            LineStyle::solid(2.0, Color::BLACK),
            None,
        );
        geometry.draw_hole(Shape::rect(40.0, 40.0, 20.0, 20.0), None);
        geometry.update_batches();

        let counts = geometry.tessellation_counts();
        assert_eq!(counts.holes_built, 1);
        assert_eq!(counts.fills, 1);
        assert_eq!(counts.lines, 2);

        // Only the hole's stroke has vertices one unit either side of its left edge.
        let on_hole_outline = |x: f32| {
            geometry
                .points()
                .iter()
                .any(|p| (p.x - x).abs() < 1e-3 && (38.0..=62.0).contains(&p.y))
        };
        assert!(on_hole_outline(39.0));
        assert!(on_hole_outline(41.0));
    }

    #[test]
    fn holes_are_built_for_line_only_shapes() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 100.0, 100.0),
            FillStyle::default(),
            LineStyle::solid(2.0, Color::BLACK),
            None,
        );
        geometry.draw_hole(Shape::rect(40.0, 40.0, 20.0, 20.0), None);
        geometry.update_batches();

        let counts = geometry.tessellation_counts();
        assert_eq!(counts.holes_built, 1);
        assert_eq!(counts.fills, 0);
        assert_eq!(counts.lines, 2);
        assert_eq!(geometry.shapes()[0].holes()[0].points().len(), 4);
        assert!(geometry
            .points()
            .iter()
            .any(|p| (p.x - 61.0).abs() < 1e-3 && (38.0..=62.0).contains(&p.y)));
    }
}
