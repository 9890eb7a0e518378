use super::*;
use lyon::math::point;

impl GraphicsGeometry {
    /// Axis-aligned bounds of every tessellated vertex, grown by
    /// [`GeometryConfig::bounds_padding`] on each side.
    ///
    /// Brings the batches up to date first. Geometry without vertices reports an empty box.
    pub fn bounds(&mut self) -> Box2D {
        self.update_batches();

        let current = self.shapes.is_empty() || self.cache_dirty == Some(self.dirty);
        if current && self.bounds_dirty != Some(self.dirty) {
            self.bounds_dirty = Some(self.dirty);
            self.calculate_bounds();
        }

        self.bounds
    }

    fn calculate_bounds(&mut self) {
        let Some(first) = self.points.first() else {
            self.bounds = Box2D::zero();
            return;
        };

        let (mut min, mut max) = (*first, *first);
        for p in &self.points[1..] {
            min = point(min.x.min(p.x), min.y.min(p.y));
            max = point(max.x.max(p.x), max.y.max(p.y));
        }

        let padding = self.config.bounds_padding;
        self.bounds = Box2D::new(min, max).inflate(padding, padding);
    }
}
