//! [`GraphicsGeometry`] collects drawn shapes and compiles them into GPU-ready buffers.
//!
//! Nothing is tessellated when a shape is drawn. [`GraphicsGeometry::update_batches`] does
//! the work lazily, and only for shapes it has not processed yet:
//!
//! 1. every new record is flattened and triangulated into the shared vertex and index
//!    lists, and consecutive styles that can share a draw are grouped into batch parts,
//! 2. small geometries without native lines are marked batchable and packed as-is, each
//!    batch part becoming a self-contained mesh for an external batch renderer,
//! 3. everything else is compiled into draw calls that bind at most
//!    [`GeometryConfig::max_textures`] textures each.
//!
//! Version stamps decide what needs redoing. `dirty` moves on every mutation,
//! `cache_dirty` remembers which `dirty` the batches were built for, and `batch_dirty`
//! moves whenever the packed output changes so uploaders know to re-read it.

mod batching;
mod bounds;
mod draw_calls;
mod packing;
mod uv;

use crate::batch::{BatchDrawCall, BatchPart};
use crate::config::GeometryConfig;
use crate::pool::with_pool;
use crate::record::ShapeRecord;
use crate::shape::Shape;
use crate::style::{BatchStyle, FillStyle, LineStyle};
use crate::tessellation::{TessellationCounts, Tessellator};
use crate::vertex::BatchVertex;
use lyon::math::{Box2D, Point, Transform};
use tracing::{debug, trace, warn};

/// Index buffer in the narrowest width that can address every vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Default for IndexBuffer {
    fn default() -> Self {
        IndexBuffer::U16(Vec::new())
    }
}

impl IndexBuffer {
    /// Overwrites the buffer with `indices`. The current allocation is reused when the
    /// width does not change.
    pub(crate) fn write_from(&mut self, indices: &[u32], wide: bool) {
        match (self, wide) {
            (IndexBuffer::U32(buffer), true) => {
                buffer.clear();
                buffer.extend_from_slice(indices);
            }
            (IndexBuffer::U16(buffer), false) => {
                buffer.clear();
                buffer.extend(indices.iter().map(|&index| index as u16));
            }
            (this, true) => *this = IndexBuffer::U32(indices.to_vec()),
            (this, false) => {
                *this = IndexBuffer::U16(indices.iter().map(|&index| index as u16).collect())
            }
        }
    }

    /// Subtracts `offset` from every index in `range`.
    ///
    /// Every index in the range must be at least `offset`.
    pub(crate) fn rebase(&mut self, range: std::ops::Range<usize>, offset: usize) {
        match self {
            IndexBuffer::U16(buffer) => {
                let offset = offset as u16;
                for index in &mut buffer[range] {
                    debug_assert!(*index >= offset, "index {index} below part start {offset}");
                    *index -= offset;
                }
            }
            IndexBuffer::U32(buffer) => {
                let offset = offset as u32;
                for index in &mut buffer[range] {
                    debug_assert!(*index >= offset, "index {index} below part start {offset}");
                    *index -= offset;
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            IndexBuffer::U16(buffer) => buffer.clear(),
            IndexBuffer::U32(buffer) => buffer.clear(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(buffer) => buffer.len(),
            IndexBuffer::U32(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, IndexBuffer::U32(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexBuffer::U16(buffer) => bytemuck::cast_slice(buffer),
            IndexBuffer::U32(buffer) => bytemuck::cast_slice(buffer),
        }
    }

    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            IndexBuffer::U16(_) => wgpu::IndexFormat::Uint16,
            IndexBuffer::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }
}

/// An ordered list of drawn shapes and the batches compiled from them.
///
/// ```
/// use polybatch::{Color, FillStyle, GraphicsGeometry, LineStyle, Shape};
///
/// let mut geometry = GraphicsGeometry::new();
/// geometry.draw_shape(
///     Shape::rect(0.0, 0.0, 100.0, 100.0),
///     FillStyle::solid(Color::WHITE),
///     LineStyle::default(),
///     None,
/// );
/// geometry.update_batches();
///
/// assert!(geometry.is_batchable());
/// assert_eq!(geometry.batches().len(), 1);
/// assert_eq!(geometry.packed_bytes().len(), 4 * 24);
/// ```
#[derive(Debug)]
pub struct GraphicsGeometry {
    config: GeometryConfig,
    shapes: Vec<ShapeRecord>,
    tessellator: Tessellator,

    points: Vec<Point>,
    uvs: Vec<[f32; 2]>,
    colors: Vec<u32>,
    texture_ids: Vec<f32>,
    indices: Vec<u32>,
    index_buffer: IndexBuffer,
    packed: Vec<BatchVertex>,

    batches: Vec<BatchPart>,
    draw_calls: Vec<BatchDrawCall>,
    batchable: bool,

    dirty: u64,
    cache_dirty: Option<u64>,
    batch_dirty: u64,
    clear_dirty: u64,
    bounds_dirty: Option<u64>,
    /// Number of records already folded into the batches.
    shape_index: usize,
    bounds: Box2D,
}

impl Default for GraphicsGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsGeometry {
    pub fn new() -> Self {
        Self::with_config(GeometryConfig::default())
    }

    pub fn with_config(config: GeometryConfig) -> Self {
        Self {
            config,
            shapes: Vec::new(),
            tessellator: Tessellator::new(config.tolerance, config.closed_point_eps),
            points: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            texture_ids: Vec::new(),
            indices: Vec::new(),
            index_buffer: IndexBuffer::default(),
            packed: Vec::new(),
            batches: Vec::new(),
            draw_calls: Vec::new(),
            batchable: false,
            dirty: 0,
            cache_dirty: None,
            batch_dirty: 0,
            clear_dirty: 0,
            bounds_dirty: None,
            shape_index: 0,
            bounds: Box2D::zero(),
        }
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Appends a shape. It is tessellated on the next [`update_batches`](Self::update_batches).
    pub fn draw_shape(
        &mut self,
        shape: impl Into<Shape>,
        fill_style: FillStyle,
        line_style: LineStyle,
        transform: Option<Transform>,
    ) -> &mut Self {
        self.shapes.push(ShapeRecord::new(
            shape.into(),
            fill_style,
            line_style,
            transform,
        ));
        self.dirty += 1;
        self
    }

    /// Cuts a hole into the most recently drawn shape.
    ///
    /// Returns `None`, and changes nothing, when no shape has been drawn yet. The hole
    /// strokes with the line style of its shape.
    pub fn draw_hole(
        &mut self,
        shape: impl Into<Shape>,
        transform: Option<Transform>,
    ) -> Option<&mut Self> {
        let already_built = self.shape_index >= self.shapes.len();
        let last = self.shapes.last_mut()?;
        last.add_hole(shape.into(), transform);

        if already_built {
            // The shape's fill is already in the buffers without this hole.
            self.invalidate();
        } else {
            self.dirty += 1;
        }
        Some(self)
    }

    /// Removes every shape.
    pub fn clear(&mut self) -> &mut Self {
        if !self.shapes.is_empty() {
            self.invalidate();
            self.clear_dirty += 1;
            self.shapes.clear();
        }
        self
    }

    /// Throws away every derived buffer so the next update rebuilds all shapes.
    pub fn invalidate(&mut self) {
        self.bounds_dirty = None;
        self.dirty += 1;
        self.batch_dirty += 1;
        self.shape_index = 0;

        self.points.clear();
        self.uvs.clear();
        self.colors.clear();
        self.texture_ids.clear();
        self.indices.clear();
        self.index_buffer.clear();
        self.packed.clear();
        self.release_batches();
        self.release_draw_calls();
    }

    /// Whether the point hits the fill of any shape, holes excluded.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.shapes
            .iter()
            .filter(|record| record.fill_style().visible)
            .any(|record| record.contains(x, y))
    }

    pub fn shapes(&self) -> &[ShapeRecord] {
        &self.shapes
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn texture_ids(&self) -> &[f32] {
        &self.texture_ids
    }

    /// Indices as produced by tessellation, before batching rebases them.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }

    pub fn packed_vertices(&self) -> &[BatchVertex] {
        &self.packed
    }

    /// The interleaved vertex buffer, 24 bytes per vertex.
    pub fn packed_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.packed)
    }

    pub fn batches(&self) -> &[BatchPart] {
        &self.batches
    }

    pub fn draw_calls(&self) -> &[BatchDrawCall] {
        &self.draw_calls
    }

    pub fn is_batchable(&self) -> bool {
        self.batchable
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn dirty(&self) -> u64 {
        self.dirty
    }

    pub fn batch_dirty(&self) -> u64 {
        self.batch_dirty
    }

    pub fn clear_dirty(&self) -> u64 {
        self.clear_dirty
    }

    pub fn tessellation_counts(&self) -> TessellationCounts {
        self.tessellator.counts()
    }

    fn release_batches(&mut self) {
        if self.batches.is_empty() {
            return;
        }
        let batches = std::mem::take(&mut self.batches);
        with_pool(|pool| {
            for part in batches {
                pool.release_batch_part(part);
            }
        });
    }

    fn release_draw_calls(&mut self) {
        if self.draw_calls.is_empty() {
            return;
        }
        let draw_calls = std::mem::take(&mut self.draw_calls);
        with_pool(|pool| {
            for call in draw_calls {
                pool.release_draw_call(call);
            }
        });
    }
}

impl Drop for GraphicsGeometry {
    fn drop(&mut self) {
        self.release_batches();
        self.release_draw_calls();
    }
}

#[cfg(test)]
mod tests {
    use super::{GraphicsGeometry, IndexBuffer};
    use crate::color::Color;
    use crate::shape::Shape;
    use crate::style::{FillStyle, LineStyle};

    fn filled_rect(geometry: &mut GraphicsGeometry, x: f32) {
        geometry.draw_shape(
            Shape::rect(x, 0.0, 10.0, 10.0),
            FillStyle::solid(Color::WHITE),
            LineStyle::default(),
            None,
        );
    }

    #[test]
    fn index_buffer_keeps_width_class_allocation() {
        let mut buffer = IndexBuffer::default();
        buffer.write_from(&[0, 1, 2], false);
        assert_eq!(buffer, IndexBuffer::U16(vec![0, 1, 2]));

        buffer.write_from(&[3, 4, 5], false);
        assert_eq!(buffer, IndexBuffer::U16(vec![3, 4, 5]));

        buffer.write_from(&[70_000], true);
        assert!(buffer.is_wide());
        assert_eq!(buffer.as_bytes().len(), 4);
        assert_eq!(buffer.format(), wgpu::IndexFormat::Uint32);
    }

    #[test]
    fn index_buffer_rebase_only_touches_range() {
        let mut buffer = IndexBuffer::U16(vec![4, 5, 6, 4, 5, 6]);
        buffer.rebase(3..6, 4);
        assert_eq!(buffer, IndexBuffer::U16(vec![4, 5, 6, 0, 1, 2]));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "below part start")]
    fn index_buffer_rebase_rejects_index_before_part_start() {
        let mut buffer = IndexBuffer::U32(vec![0, 1, 2, 3]);
        buffer.rebase(0..4, 2);
    }

    #[test]
    fn draw_hole_without_shape_returns_none() {
        let mut geometry = GraphicsGeometry::new();
        let dirty = geometry.dirty();
        assert!(geometry
            .draw_hole(Shape::rect(0.0, 0.0, 1.0, 1.0), None)
            .is_none());
        assert_eq!(geometry.dirty(), dirty);
    }

    #[test]
    fn mutations_bump_dirty() {
        let mut geometry = GraphicsGeometry::new();
        filled_rect(&mut geometry, 0.0);
        assert_eq!(geometry.dirty(), 1);

        geometry
            .draw_hole(Shape::rect(1.0, 1.0, 2.0, 2.0), None)
            .unwrap();
        assert_eq!(geometry.dirty(), 2);
    }

    #[test]
    fn clear_on_empty_geometry_is_a_no_op() {
        let mut geometry = GraphicsGeometry::new();
        geometry.clear();
        assert_eq!(geometry.clear_dirty(), 0);
        assert_eq!(geometry.dirty(), 0);
    }

    #[test]
    fn clear_resets_buffers_and_counts_the_reset() {
        let mut geometry = GraphicsGeometry::new();
        filled_rect(&mut geometry, 0.0);
        geometry.update_batches();
        assert_eq!(geometry.vertex_count(), 4);

        geometry.clear();
        assert_eq!(geometry.clear_dirty(), 1);
        assert!(geometry.points().is_empty());
        assert!(geometry.indices().is_empty());
        assert!(geometry.index_buffer().is_empty());
        assert!(geometry.batches().is_empty());

        geometry.update_batches();
        assert!(geometry.is_batchable());
        assert!(geometry.packed_bytes().is_empty());
    }

    #[test]
    fn hole_added_after_build_rebuilds_the_shape() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 100.0, 100.0),
            FillStyle::solid(Color::WHITE),
            LineStyle::default(),
            None,
        );
        geometry.update_batches();
        assert_eq!(geometry.vertex_count(), 4);

        geometry
            .draw_hole(Shape::rect(25.0, 25.0, 50.0, 50.0), None)
            .unwrap();
        geometry.update_batches();

        assert!(geometry.vertex_count() >= 8);
        assert_eq!(geometry.batches().len(), 1);
        assert!(!geometry.contains_point(50.0, 50.0));
    }

    #[test]
    fn contains_point_ignores_invisible_fills() {
        let mut geometry = GraphicsGeometry::new();
        geometry.draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::default(),
            LineStyle::solid(1.0, Color::BLACK),
            None,
        );
        assert!(!geometry.contains_point(5.0, 5.0));

        filled_rect(&mut geometry, 0.0);
        assert!(geometry.contains_point(5.0, 5.0));
    }
}
