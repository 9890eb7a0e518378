//! Fill and line styles, and the comparison that decides which styled spans may share a
//! batch part.

use crate::color::Color;
use crate::texture::Texture;
use lyon::math::Transform;
use lyon::tessellation::{LineCap, LineJoin};

/// How the inside of a shape is painted.
///
/// A default fill style is invisible. Use [`FillStyle::solid`] or [`FillStyle::textured`]
/// to get a visible one.
#[derive(Debug, Clone)]
pub struct FillStyle {
    pub visible: bool,
    pub color: Color,
    pub alpha: f32,
    pub texture: Texture,
    /// Maps local positions into texture pixel space before they are normalized.
    pub matrix: Option<Transform>,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            visible: false,
            color: Color::WHITE,
            alpha: 1.0,
            texture: Texture::white(),
            matrix: None,
        }
    }
}

impl FillStyle {
    /// A visible fill of a single color.
    pub fn solid(color: impl Into<Color>) -> Self {
        Self {
            visible: true,
            color: color.into(),
            ..Default::default()
        }
    }

    /// A visible white fill sampling `texture`.
    pub fn textured(texture: Texture) -> Self {
        Self {
            visible: true,
            texture,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_matrix(mut self, matrix: Transform) -> Self {
        self.matrix = Some(matrix);
        self
    }
}

/// How the outline of a shape is painted.
///
/// Lines with `native` set are emitted as GPU line primitives, one pixel wide regardless of
/// `width`. Every other line is tessellated into triangles.
#[derive(Debug, Clone)]
pub struct LineStyle {
    pub visible: bool,
    pub width: f32,
    pub color: Color,
    pub alpha: f32,
    pub texture: Texture,
    pub matrix: Option<Transform>,
    pub native: bool,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            visible: false,
            width: 0.0,
            color: Color::WHITE,
            alpha: 1.0,
            texture: Texture::white(),
            matrix: None,
            native: false,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
        }
    }
}

impl LineStyle {
    /// A visible tessellated line.
    pub fn solid(width: f32, color: impl Into<Color>) -> Self {
        Self {
            visible: true,
            width,
            color: color.into(),
            ..Default::default()
        }
    }

    /// A visible line drawn with the GPU line primitive.
    pub fn native(color: impl Into<Color>) -> Self {
        Self {
            visible: true,
            width: 1.0,
            color: color.into(),
            native: true,
            ..Default::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_matrix(mut self, matrix: Transform) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_miter_limit(mut self, miter_limit: f32) -> Self {
        self.miter_limit = miter_limit;
        self
    }
}

/// Snapshot of the parts of a fill or line style that matter once geometry is batched.
#[derive(Debug, Clone)]
pub struct BatchStyle {
    pub texture: Texture,
    pub color: Color,
    pub alpha: f32,
    pub native: bool,
    pub matrix: Option<Transform>,
}

impl BatchStyle {
    /// Color and alpha folded into one comparable value.
    pub fn color_key(&self) -> u64 {
        ((u32::from_le_bytes(self.color.0) as u64) << 32) | self.alpha.to_bits() as u64
    }

    /// The per-vertex color attribute for this style.
    pub fn packed_color(&self) -> u32 {
        self.color.pack_premultiplied(self.alpha)
    }
}

impl From<&FillStyle> for BatchStyle {
    fn from(style: &FillStyle) -> Self {
        Self {
            texture: style.texture.clone(),
            color: style.color,
            alpha: style.alpha,
            native: false,
            matrix: style.matrix,
        }
    }
}

impl From<&LineStyle> for BatchStyle {
    fn from(style: &LineStyle) -> Self {
        Self {
            texture: style.texture.clone(),
            color: style.color,
            alpha: style.alpha,
            native: style.native,
            matrix: style.matrix,
        }
    }
}

/// Whether geometry drawn with `b` can extend a batch part drawn with `a`.
///
/// Both styles must exist, sample the same base texture, carry the same color and alpha
/// and agree on `native`. Nothing is compared with a tolerance.
pub fn mergeable(a: Option<&BatchStyle>, b: Option<&BatchStyle>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.texture.same_base(&b.texture)
                && a.color_key() == b.color_key()
                && a.native == b.native
        }
        _ => false,
    }
}
