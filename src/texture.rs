//! Texture handles consumed by fill and line styles.
//!
//! A [`BaseTexture`] stands for one underlying GPU image. It is shared through an [`Arc`]
//! and compared by pointer identity, which is what decides whether two styles can share a
//! batch. A [`Texture`] is a rectangular [`Frame`] inside a base texture, which is how atlas
//! packed images are addressed.
//!
//! The base texture also carries the marker the draw-call compiler uses to remember which
//! texture unit slot it was bound to during the compilation that is currently running. The
//! marker is only meaningful while it matches the global batch tick, see
//! [`crate::batch`].

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Size of the process-wide white texture used by styles that do not set a texture.
const WHITE_TEXTURE_SIZE: u32 = 16;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TextureError {
    #[error("texture frame {width}x{height} is empty")]
    EmptyFrame { width: f32, height: f32 },
    #[error("texture frame {frame:?} lies outside its {base_width}x{base_height} base texture")]
    FrameOutOfBounds {
        frame: Frame,
        base_width: u32,
        base_height: u32,
    },
}

/// How a texture is sampled outside of the [0, 1] UV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum WrapMode {
    #[default]
    Clamp = 0,
    Repeat = 1,
    MirroredRepeat = 2,
}

impl WrapMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WrapMode::Repeat,
            2 => WrapMode::MirroredRepeat,
            _ => WrapMode::Clamp,
        }
    }
}

/// A rectangle inside a base texture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The underlying image resource shared by every [`Texture`] cut from it.
///
/// A base texture created with [`BaseTexture::pending`] has no dimensions yet and is not
/// valid; geometry that references it defers its rebuild until [`BaseTexture::set_size`]
/// is called.
#[derive(Debug)]
pub struct BaseTexture {
    id: TextureId,
    width: AtomicU32,
    height: AtomicU32,
    wrap_mode: AtomicU8,
    /// Global batch tick of the last draw-call compilation that bound this texture.
    batch_tick: AtomicU64,
    /// Texture unit slot assigned during that compilation.
    batch_location: AtomicU32,
}

impl BaseTexture {
    /// Creates a loaded base texture with the given pixel dimensions.
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            wrap_mode: AtomicU8::new(WrapMode::Clamp as u8),
            batch_tick: AtomicU64::new(0),
            batch_location: AtomicU32::new(0),
        })
    }

    /// Creates a base texture whose image has not been loaded yet.
    pub fn pending() -> Arc<Self> {
        Self::new(0, 0)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width.load(Ordering::Relaxed)
    }

    pub fn height(&self) -> u32 {
        self.height.load(Ordering::Relaxed)
    }

    /// Records the dimensions of the loaded image, making the texture valid.
    pub fn set_size(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
    }

    /// True once the texture has non-zero dimensions.
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    pub fn wrap_mode(&self) -> WrapMode {
        WrapMode::from_u8(self.wrap_mode.load(Ordering::Relaxed))
    }

    pub fn set_wrap_mode(&self, wrap_mode: WrapMode) {
        self.wrap_mode.store(wrap_mode as u8, Ordering::Relaxed);
    }

    /// Slot this texture occupies in the compilation running at `tick`, if any.
    pub(crate) fn batch_slot(&self, tick: u64) -> Option<u32> {
        (self.batch_tick.load(Ordering::Acquire) == tick)
            .then(|| self.batch_location.load(Ordering::Acquire))
    }

    pub(crate) fn batch_location(&self) -> u32 {
        self.batch_location.load(Ordering::Acquire)
    }

    pub(crate) fn mark_batched(&self, tick: u64, slot: u32) {
        self.batch_location.store(slot, Ordering::Release);
        self.batch_tick.store(tick, Ordering::Release);
    }
}

/// A frame of a [`BaseTexture`].
///
/// Cloning is cheap; clones share the base texture.
#[derive(Debug, Clone)]
pub struct Texture {
    base: Arc<BaseTexture>,
    /// `None` covers the whole base texture, whatever its size ends up being.
    frame: Option<Frame>,
}

impl Texture {
    /// A texture covering the whole of `base`.
    pub fn from_base(base: Arc<BaseTexture>) -> Self {
        Self { base, frame: None }
    }

    /// A texture covering `frame` inside `base`.
    ///
    /// The frame must not be empty and, when the base texture is already loaded, must lie
    /// within it.
    ///
    /// ```
    /// use polybatch::{BaseTexture, Frame, Texture, TextureError};
    ///
    /// let atlas = BaseTexture::new(256, 256);
    /// let icon = Texture::with_frame(atlas.clone(), Frame::new(64.0, 0.0, 32.0, 32.0)).unwrap();
    /// assert!(!icon.is_full_frame());
    ///
    /// let outside = Texture::with_frame(atlas, Frame::new(240.0, 0.0, 32.0, 32.0));
    /// assert!(matches!(outside, Err(TextureError::FrameOutOfBounds { .. })));
    /// ```
    pub fn with_frame(base: Arc<BaseTexture>, frame: Frame) -> Result<Self, TextureError> {
        if frame.width <= 0.0 || frame.height <= 0.0 {
            return Err(TextureError::EmptyFrame {
                width: frame.width,
                height: frame.height,
            });
        }

        if base.is_valid() {
            let (base_width, base_height) = (base.width(), base.height());
            let fits = frame.x >= 0.0
                && frame.y >= 0.0
                && frame.x + frame.width <= base_width as f32
                && frame.y + frame.height <= base_height as f32;
            if !fits {
                return Err(TextureError::FrameOutOfBounds {
                    frame,
                    base_width,
                    base_height,
                });
            }
        }

        Ok(Self {
            base,
            frame: Some(frame),
        })
    }

    /// The process-wide white texture. Untextured styles use it so that they still batch
    /// together with everything else that samples it.
    pub fn white() -> Self {
        static WHITE: OnceLock<Texture> = OnceLock::new();
        WHITE
            .get_or_init(|| {
                Texture::from_base(BaseTexture::new(WHITE_TEXTURE_SIZE, WHITE_TEXTURE_SIZE))
            })
            .clone()
    }

    pub fn base(&self) -> &Arc<BaseTexture> {
        &self.base
    }

    /// The frame in pixels. Whole-image textures report the current base dimensions.
    pub fn frame(&self) -> Frame {
        self.frame.unwrap_or_else(|| {
            Frame::new(0.0, 0.0, self.base.width() as f32, self.base.height() as f32)
        })
    }

    /// True when the frame covers the whole base texture.
    pub fn is_full_frame(&self) -> bool {
        let frame = self.frame();
        frame.width >= self.base.width() as f32 && frame.height >= self.base.height() as f32
    }

    /// True when both textures are cut from the same base texture.
    pub fn same_base(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.base, &other.base)
    }
}

impl From<Arc<BaseTexture>> for Texture {
    fn from(base: Arc<BaseTexture>) -> Self {
        Texture::from_base(base)
    }
}
