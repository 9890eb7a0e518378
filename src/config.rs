/// Tuning knobs for a [`GraphicsGeometry`](crate::GraphicsGeometry).
///
/// ```
/// use polybatch::GeometryConfig;
///
/// let config = GeometryConfig::default()
///     .with_batchable_size(0)
///     .with_bounds_padding(2.0);
/// assert_eq!(config.max_textures, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    /// Geometries with at most this many vertices are handed to the batch renderer whole.
    pub batchable_size: usize,
    /// Texture slots available to one draw call.
    pub max_textures: usize,
    /// Added on every side of the computed bounds.
    pub bounds_padding: f32,
    /// Maximum distance between a curve and its flattened polyline.
    pub tolerance: f32,
    /// A polygon whose last point is closer than this to its first point is treated as
    /// explicitly closed, and the duplicate is dropped.
    pub closed_point_eps: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            batchable_size: 100,
            max_textures: 8,
            bounds_padding: 0.0,
            tolerance: 0.25,
            closed_point_eps: 1e-4,
        }
    }
}

impl GeometryConfig {
    pub fn with_batchable_size(mut self, batchable_size: usize) -> Self {
        self.batchable_size = batchable_size;
        self
    }

    /// Values below one are raised to one.
    pub fn with_max_textures(mut self, max_textures: usize) -> Self {
        self.max_textures = max_textures.max(1);
        self
    }

    pub fn with_bounds_padding(mut self, bounds_padding: f32) -> Self {
        self.bounds_padding = bounds_padding;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_closed_point_eps(mut self, closed_point_eps: f32) -> Self {
        self.closed_point_eps = closed_point_eps;
        self
    }
}
