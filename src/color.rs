/// Represents a color in RGBA format.
///
/// Each channel is an 8-bit unsigned integer. Styles pair a color with a separate floating
/// point alpha; the color's own alpha channel multiplies into it when the color is packed
/// for the GPU.
///
/// # Examples
///
/// ```
/// use polybatch::Color;
///
/// let red = Color::rgb(255, 0, 0);
/// assert_eq!(red.normalize(), [1.0, 0.0, 0.0, 1.0]);
///
/// let from_hex = Color::from_hex(0x00ff00);
/// assert_eq!(from_hex, Color::rgb(0, 255, 0));
/// assert_eq!(from_hex.to_hex(), 0x00ff00);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// A transparent color.
    ///
    /// All color channels are set to zero, making the color fully transparent.
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    /// A black color.
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    /// A white color.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Creates a new color with the specified RGB values and full opacity.
    ///
    /// ```
    /// use polybatch::Color;
    ///
    /// let green = Color::rgb(0, 255, 0);
    /// assert_eq!(green, Color([0, 255, 0, 255]));
    /// ```
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Creates a new color with the specified RGBA values.
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Creates an opaque color from a `0xRRGGBB` value. Bits above the low 24 are ignored.
    pub fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Returns the color as a `0xRRGGBB` value, dropping the alpha channel.
    pub fn to_hex(&self) -> u32 {
        let [r, g, b, _] = self.0;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    /// Normalizes the color values to the range [0.0, 1.0].
    pub fn normalize(&self) -> [f32; 4] {
        [
            self.0[0] as f32 / 255.0,
            self.0[1] as f32 / 255.0,
            self.0[2] as f32 / 255.0,
            self.0[3] as f32 / 255.0,
        ]
    }

    /// Returns the color as an array of 4 `u8` values.
    pub fn to_array(&self) -> [u8; 4] {
        self.0
    }

    /// Packs the color into the 32-bit per-vertex color attribute.
    ///
    /// The effective alpha is `alpha` multiplied by the color's own alpha channel. RGB is
    /// premultiplied by it, and the channels are laid out so the little-endian bytes of the
    /// result read `R, G, B, A`, matching an `Unorm8x4` vertex attribute.
    ///
    /// ```
    /// use polybatch::Color;
    ///
    /// assert_eq!(Color::rgb(255, 0, 0).pack_premultiplied(1.0).to_le_bytes(), [255, 0, 0, 255]);
    /// assert_eq!(Color::WHITE.pack_premultiplied(0.0), 0);
    /// ```
    pub fn pack_premultiplied(&self, alpha: f32) -> u32 {
        let [r, g, b, a] = self.0;
        let alpha = (alpha * a as f32 / 255.0).clamp(0.0, 1.0);

        if alpha == 0.0 {
            return 0;
        }

        let alpha_byte = (alpha * 255.0) as u32;
        if alpha == 1.0 {
            return (alpha_byte << 24) | ((b as u32) << 16) | ((g as u32) << 8) | r as u32;
        }

        let premultiply = |channel: u8| ((channel as f32 * alpha) + 0.5) as u32;
        (alpha_byte << 24) | (premultiply(b) << 16) | (premultiply(g) << 8) | premultiply(r)
    }
}

impl From<[u8; 4]> for Color {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}
