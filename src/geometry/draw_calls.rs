use super::*;
use crate::batch::{BatchTick, PrimitiveType};
use crate::texture::{BaseTexture, WrapMode};
use std::sync::Arc;

impl GraphicsGeometry {
    /// Merges the batch parts, in order, into as few draw calls as the texture budget
    /// allows, and packs the vertex attributes with each part's texture slot.
    ///
    /// A draw call never mixes triangles with lines and never binds more than
    /// `max_textures` distinct base textures. Parts are never reordered.
    pub(super) fn build_draw_calls(&mut self) {
        self.release_draw_calls();
        self.batch_dirty += 1;

        let max_textures = self.config.max_textures.max(1);
        let vertex_count = self.points.len();
        self.colors.resize(vertex_count, 0);
        self.texture_ids.resize(vertex_count, 0.0);

        let mut tick = BatchTick::acquire();
        let mut draw_calls = Vec::new();
        let mut current = with_pool(|pool| pool.acquire_draw_call());

        let mut texture_count = 0;
        let mut primitive = PrimitiveType::Triangles;
        let mut current_base: Option<&Arc<BaseTexture>> = None;
        let mut index = 0;

        for part in &self.batches {
            let Some(style) = part.style() else {
                continue;
            };
            let base = style.texture.base();

            if part.primitive() != primitive {
                primitive = part.primitive();
                current_base = None;
                texture_count = max_textures;
                tick.advance();
            }

            let same_as_previous =
                current_base.is_some_and(|previous| Arc::ptr_eq(previous, base));
            if !same_as_previous {
                current_base = Some(base);

                if base.batch_slot(tick.current()).is_none() {
                    if texture_count >= max_textures {
                        tick.advance();
                        texture_count = 0;

                        if current.size > 0 {
                            let next = with_pool(|pool| pool.acquire_draw_call());
                            draw_calls.push(std::mem::replace(&mut current, next));
                        }
                        current.start = index;
                        current.size = 0;
                        current.textures.clear();
                        current.primitive = primitive;
                    }

                    base.mark_batched(tick.current(), texture_count as u32);
                    base.set_wrap_mode(WrapMode::Repeat);
                    current.textures.push(style.texture.clone());
                    texture_count += 1;
                    trace!(
                        texture = %base.id(),
                        slot = texture_count - 1,
                        call = draw_calls.len(),
                        "bound texture"
                    );
                }
            }

            current.size += part.size();
            index += part.size();

            let texture_id = base.batch_location() as f32;
            let range = part.attrib_start()..part.attrib_end();
            self.colors[range.clone()].fill(style.packed_color());
            self.texture_ids[range].fill(texture_id);
        }

        draw_calls.push(current);
        drop(tick);

        self.draw_calls = draw_calls;
        trace!(draw_calls = self.draw_calls.len(), "compiled draw calls");
        self.pack_attributes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::texture::{BaseTexture, Texture};

    fn compiled() -> GraphicsGeometry {
        GraphicsGeometry::with_config(GeometryConfig::default().with_batchable_size(0))
    }

    fn textured_rect(geometry: &mut GraphicsGeometry, texture: &Texture) {
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::textured(texture.clone()),
            LineStyle::default(),
            None,
        );
    }

    fn unique_textures(count: usize) -> Vec<Texture> {
        (0..count)
            .map(|_| Texture::from_base(BaseTexture::new(4, 4)))
            .collect()
    }

    #[test]
    fn repeated_texture_reuses_its_slot() {
        let textures = unique_textures(2);
        let mut geometry = compiled();
        for texture in [&textures[0], &textures[1], &textures[0]] {
            textured_rect(&mut geometry, texture);
        }
        geometry.update_batches();

        assert_eq!(geometry.batches().len(), 3);
        assert_eq!(geometry.draw_calls().len(), 1);
        assert_eq!(geometry.draw_calls()[0].textures().len(), 2);
        assert_eq!(geometry.texture_ids()[8..12], [0.0; 4]);
        assert_eq!(geometry.texture_ids()[4..8], [1.0; 4]);
    }

    #[test]
    fn ninth_texture_spills_into_second_call() {
        let textures = unique_textures(9);
        let mut geometry = compiled();
        for texture in &textures {
            textured_rect(&mut geometry, texture);
        }
        geometry.update_batches();

        let calls = geometry.draw_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].textures().len(), 8);
        assert_eq!((calls[0].start(), calls[0].size()), (0, 48));
        assert_eq!(calls[1].textures().len(), 1);
        assert!(calls[1].textures()[0].same_base(&textures[8]));
        assert_eq!((calls[1].start(), calls[1].size()), (48, 6));
        assert_eq!(geometry.texture_ids()[32..36], [0.0; 4]);
    }

    #[test]
    fn smaller_budget_is_respected() {
        let textures = unique_textures(5);
        let config = GeometryConfig::default()
            .with_batchable_size(0)
            .with_max_textures(2);
        let mut geometry = GraphicsGeometry::with_config(config);
        for texture in &textures {
            textured_rect(&mut geometry, texture);
        }
        geometry.update_batches();

        let sizes: Vec<usize> = geometry
            .draw_calls()
            .iter()
            .map(|call| call.textures().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn primitive_change_starts_a_new_call() {
        let mut geometry = compiled();
        geometry
            .draw_shape(
                Shape::rect(0.0, 0.0, 10.0, 10.0),
                FillStyle::solid(Color::WHITE),
                LineStyle::native(Color::WHITE),
                None,
            )
            .draw_shape(
                Shape::rect(20.0, 0.0, 10.0, 10.0),
                FillStyle::solid(Color::WHITE),
                LineStyle::default(),
                None,
            );
        geometry.update_batches();

        let primitives: Vec<PrimitiveType> = geometry
            .draw_calls()
            .iter()
            .map(|call| call.primitive())
            .collect();
        assert_eq!(
            primitives,
            vec![
                PrimitiveType::Triangles,
                PrimitiveType::Lines,
                PrimitiveType::Triangles
            ]
        );
        let lines = &geometry.draw_calls()[1];
        assert_eq!((lines.start(), lines.size()), (6, 8));
    }

    #[test]
    fn leading_native_line_reuses_the_empty_first_call() {
        let mut geometry = compiled();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::default(),
            LineStyle::native(Color::BLACK),
            None,
        );
        geometry.update_batches();

        assert_eq!(geometry.draw_calls().len(), 1);
        assert_eq!(geometry.draw_calls()[0].primitive(), PrimitiveType::Lines);
        assert_eq!(geometry.draw_calls()[0].size(), 8);
    }

    #[test]
    fn colors_are_written_per_part() {
        let mut geometry = compiled();
        geometry
            .draw_shape(Shape::rect(0.0, 0.0, 1.0, 1.0), FillStyle::solid(Color::rgb(255, 0, 0)), LineStyle::default(), None)
            .draw_shape(
                Shape::rect(0.0, 0.0, 1.0, 1.0),
                FillStyle::solid(Color::rgb(0, 0, 255)).with_alpha(0.5),
                LineStyle::default(),
                None,
            );
        geometry.update_batches();

        let colors = geometry.colors();
        assert_eq!(colors[0].to_le_bytes(), [255, 0, 0, 255]);
        assert_eq!(colors[4].to_le_bytes(), [0, 0, 128, 127]);
    }

    #[test]
    fn recompiling_bumps_batch_dirty() {
        let mut geometry = compiled();
        textured_rect(&mut geometry, &Texture::white());
        geometry.update_batches();
        let first = geometry.batch_dirty();

        textured_rect(&mut geometry, &Texture::white());
        geometry.update_batches();
        assert!(geometry.batch_dirty() > first);
        assert_eq!(geometry.draw_calls().len(), 1);
    }
}
