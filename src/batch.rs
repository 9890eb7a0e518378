//! Batch parts, draw calls and the global batch tick.
//!
//! A batch part is a contiguous run of indices and vertices that share one style. Draw
//! calls merge consecutive batch parts of the same primitive type, binding up to a fixed
//! number of textures each.
//!
//! The global batch tick identifies the draw-call compilation currently running in the
//! process. Base textures remember the tick and slot they were last bound with, so a
//! compilation can tell in constant time whether a texture is already bound in the call it
//! is building. A compilation holds the tick lock for its whole duration, so two
//! compilations never observe the same tick.

use crate::style::BatchStyle;
use crate::texture::Texture;
use smallvec::SmallVec;
use std::sync::{Mutex, MutexGuard, PoisonError};

static GLOBAL_BATCH_TICK: Mutex<u64> = Mutex::new(0);

/// A run of geometry sharing one style.
///
/// Index offsets point into the geometry's index list, attribute offsets into its vertex
/// list. Both end offsets are exclusive.
#[derive(Debug, Clone, Default)]
pub struct BatchPart {
    pub(crate) style: Option<BatchStyle>,
    pub(crate) index_start: usize,
    pub(crate) index_end: usize,
    pub(crate) attrib_start: usize,
    pub(crate) attrib_end: usize,
    pub(crate) size: usize,
    pub(crate) attrib_size: usize,
}

impl BatchPart {
    pub(crate) fn begin(&mut self, style: BatchStyle, index_start: usize, attrib_start: usize) {
        self.style = Some(style);
        self.index_start = index_start;
        self.attrib_start = attrib_start;
        self.index_end = index_start;
        self.attrib_end = attrib_start;
        self.size = 0;
        self.attrib_size = 0;
    }

    pub(crate) fn end(&mut self, index_end: usize, attrib_end: usize) {
        self.index_end = index_end;
        self.attrib_end = attrib_end;
        self.size = index_end - self.index_start;
        self.attrib_size = attrib_end - self.attrib_start;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn style(&self) -> Option<&BatchStyle> {
        self.style.as_ref()
    }

    pub fn index_start(&self) -> usize {
        self.index_start
    }

    pub fn index_end(&self) -> usize {
        self.index_end
    }

    pub fn attrib_start(&self) -> usize {
        self.attrib_start
    }

    pub fn attrib_end(&self) -> usize {
        self.attrib_end
    }

    /// Number of indices.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of vertices.
    pub fn attrib_size(&self) -> usize {
        self.attrib_size
    }

    pub fn primitive(&self) -> PrimitiveType {
        match &self.style {
            Some(style) if style.native => PrimitiveType::Lines,
            _ => PrimitiveType::Triangles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    #[default]
    Triangles,
    Lines,
}

/// One GPU submission: an index range drawn with one primitive type and a set of bound
/// textures. The texture at position `i` is bound to slot `i`.
#[derive(Debug, Clone, Default)]
pub struct BatchDrawCall {
    pub(crate) textures: SmallVec<[Texture; 8]>,
    pub(crate) primitive: PrimitiveType,
    pub(crate) start: usize,
    pub(crate) size: usize,
}

impl BatchDrawCall {
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    /// First index of the call.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of indices.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn reset(&mut self) {
        self.textures.clear();
        self.primitive = PrimitiveType::Triangles;
        self.start = 0;
        self.size = 0;
    }
}

/// Exclusive access to the global batch tick for the duration of one compilation.
pub(crate) struct BatchTick {
    guard: MutexGuard<'static, u64>,
}

impl BatchTick {
    /// Locks the tick and advances it, so the compilation starts with a value no texture
    /// has been stamped with.
    pub(crate) fn acquire() -> Self {
        let mut guard = GLOBAL_BATCH_TICK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard += 1;
        Self { guard }
    }

    pub(crate) fn current(&self) -> u64 {
        *self.guard
    }

    pub(crate) fn advance(&mut self) -> u64 {
        *self.guard += 1;
        *self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchPart, BatchTick, PrimitiveType};
    use crate::color::Color;
    use crate::style::{BatchStyle, FillStyle, LineStyle};

    #[test]
    fn batch_part_end_derives_sizes() {
        let mut part = BatchPart::default();
        part.begin(BatchStyle::from(&FillStyle::solid(Color::WHITE)), 6, 4);
        part.end(18, 12);

        assert_eq!(part.size(), 12);
        assert_eq!(part.attrib_size(), 8);
        assert_eq!(part.primitive(), PrimitiveType::Triangles);

        part.reset();
        assert!(part.style().is_none());
        assert_eq!(part.index_end(), 0);
    }

    #[test]
    fn native_line_parts_are_line_primitives() {
        let mut part = BatchPart::default();
        part.begin(BatchStyle::from(&LineStyle::native(Color::BLACK)), 0, 0);
        assert_eq!(part.primitive(), PrimitiveType::Lines);
    }

    #[test]
    fn tick_advances_on_acquire_and_is_monotonic() {
        let first = {
            let mut tick = BatchTick::acquire();
            let start = tick.current();
            assert_eq!(tick.advance(), start + 1);
            tick.current()
        };

        let tick = BatchTick::acquire();
        assert!(tick.current() > first);
    }
}
