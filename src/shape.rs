//! The `shape` module defines the closed set of shapes a geometry can draw, together with the
//! point containment tests used for hit-testing.
//!
//! Shapes are plain descriptions in their own local space. Turning them into points and
//! triangles is the job of [`crate::tessellation`].
//!
//! # Examples
//!
//! ```rust
//! use polybatch::{BorderRadii, Shape};
//!
//! let rect = Shape::rect(0.0, 0.0, 100.0, 50.0);
//! assert!(rect.contains(10.0, 10.0));
//!
//! let pill = Shape::rounded_rect(0.0, 0.0, 100.0, 20.0, BorderRadii::new(10.0));
//! assert!(!pill.contains(0.5, 0.5));
//!
//! let triangle = Shape::polygon_builder()
//!     .begin((0.0, 0.0))
//!     .line_to((50.0, 0.0))
//!     .line_to((0.0, 50.0))
//!     .close()
//!     .build();
//! assert!(triangle.contains(5.0, 5.0));
//! ```

use lyon::math::{point, Point};
use lyon::path::iterator::PathIterator;
use lyon::path::PathEvent;

/// Flattening tolerance used by [`PolygonBuilder`] unless told otherwise.
const DEFAULT_CURVE_TOLERANCE: f32 = 0.25;

/// A drawable shape in local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Ellipse(Ellipse),
    Polygon(Polygon),
    Rectangle(Rectangle),
    RoundedRectangle(RoundedRectangle),
}

impl Shape {
    pub fn circle(x: f32, y: f32, radius: f32) -> Self {
        Shape::Circle(Circle { x, y, radius })
    }

    /// An ellipse centered on `(x, y)`.
    pub fn ellipse(x: f32, y: f32, half_width: f32, half_height: f32) -> Self {
        Shape::Ellipse(Ellipse {
            x,
            y,
            half_width,
            half_height,
        })
    }

    /// A closed polygon through `points`.
    pub fn polygon(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Shape::Polygon(Polygon::new(points))
    }

    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Shape::Rectangle(Rectangle {
            x,
            y,
            width,
            height,
        })
    }

    pub fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radii: BorderRadii) -> Self {
        Shape::RoundedRectangle(RoundedRectangle {
            x,
            y,
            width,
            height,
            radii,
        })
    }

    /// Starts a polygon from path commands. Curves are flattened when the polygon is built.
    pub fn polygon_builder() -> PolygonBuilder {
        PolygonBuilder::new()
    }

    /// Whether the local point `(x, y)` lies inside the shape.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Shape::Circle(circle) => circle.contains(x, y),
            Shape::Ellipse(ellipse) => ellipse.contains(x, y),
            Shape::Polygon(polygon) => polygon.contains(x, y),
            Shape::Rectangle(rect) => rect.contains(x, y),
            Shape::RoundedRectangle(rect) => rect.contains(x, y),
        }
    }

    /// Whether a stroke around this shape joins its last point back to the first.
    ///
    /// Every shape except an open polygon is closed.
    pub fn is_closed_stroke(&self) -> bool {
        match self {
            Shape::Polygon(polygon) => polygon.close_stroke,
            _ => true,
        }
    }

    /// The point fan triangulation radiates from, for shapes that have one.
    pub(crate) fn center(&self) -> Option<Point> {
        match self {
            Shape::Circle(circle) => Some(point(circle.x, circle.y)),
            Shape::Ellipse(ellipse) => Some(point(ellipse.x, ellipse.y)),
            Shape::RoundedRectangle(rect) => Some(point(
                rect.x + rect.width / 2.0,
                rect.y + rect.height / 2.0,
            )),
            Shape::Polygon(_) | Shape::Rectangle(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Circle {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.radius <= 0.0 {
            return false;
        }

        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ellipse {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Ellipse {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.half_width <= 0.0 || self.half_height <= 0.0 {
            return false;
        }

        let nx = (x - self.x) / self.half_width;
        let ny = (y - self.y) / self.half_height;
        nx * nx + ny * ny <= 1.0
    }
}

/// A polygon given by its outline points.
///
/// `close_stroke` only affects strokes: an open polygon is still filled as if it were
/// closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub close_stroke: bool,
}

impl Polygon {
    pub fn new(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            points: points.into_iter().map(|(x, y)| point(x, y)).collect(),
            close_stroke: true,
        }
    }

    /// A polyline whose stroke does not return to the first point.
    pub fn open(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            close_stroke: false,
            ..Self::new(points)
        }
    }

    /// Even-odd ray casting.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let points = &self.points;
        if points.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = points.len() - 1;
        for i in 0..points.len() {
            let (pi, pj) = (points[i], points[j]);
            let crosses = (pi.y > y) != (pj.y > y)
                && x < (pj.x - pi.x) * ((y - pi.y) / (pj.y - pi.y)) + pi.x;
            if crosses {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}

impl From<Polygon> for Shape {
    fn from(value: Polygon) -> Self {
        Shape::Polygon(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    /// Half-open on the right and bottom edges.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }

        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

impl From<Rectangle> for Shape {
    fn from(value: Rectangle) -> Self {
        Shape::Rectangle(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoundedRectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radii: BorderRadii,
}

impl RoundedRectangle {
    /// Corner radii limited to half of the shorter side, which is how they are drawn.
    pub fn clamped_radii(&self) -> BorderRadii {
        let limit = (self.width.min(self.height) / 2.0).max(0.0);
        let clamp = |radius: f32| radius.clamp(0.0, limit);
        BorderRadii {
            top_left: clamp(self.radii.top_left),
            top_right: clamp(self.radii.top_right),
            bottom_left: clamp(self.radii.bottom_left),
            bottom_right: clamp(self.radii.bottom_right),
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }

        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        if x < left || x > right || y < top || y > bottom {
            return false;
        }

        let r = self.clamped_radii();
        // (radius, center x, center y) in top left, top right, bottom left, bottom right order
        let corners = [
            (r.top_left, left + r.top_left, top + r.top_left),
            (r.top_right, right - r.top_right, top + r.top_right),
            (r.bottom_left, left + r.bottom_left, bottom - r.bottom_left),
            (r.bottom_right, right - r.bottom_right, bottom - r.bottom_right),
        ];

        for (index, (radius, cx, cy)) in corners.into_iter().enumerate() {
            let beyond_x = if index % 2 == 0 { x < cx } else { x > cx };
            let beyond_y = if index < 2 { y < cy } else { y > cy };
            if beyond_x && beyond_y {
                let (dx, dy) = (x - cx, y - cy);
                return dx * dx + dy * dy <= radius * radius;
            }
        }

        true
    }
}

impl From<RoundedRectangle> for Shape {
    fn from(value: RoundedRectangle) -> Self {
        Shape::RoundedRectangle(value)
    }
}

/// A set of border radii for a rounded rectangle
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct BorderRadii {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
}

impl BorderRadii {
    /// The same radius on every corner.
    ///
    /// ```rust
    /// use polybatch::BorderRadii;
    ///
    /// let radii = BorderRadii::new(-10.0);
    /// assert_eq!(radii.top_right, 10.0);
    /// ```
    pub fn new(radius: f32) -> Self {
        let r = radius.abs();
        BorderRadii {
            top_left: r,
            top_right: r,
            bottom_left: r,
            bottom_right: r,
        }
    }
}

impl core::fmt::Display for BorderRadii {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // CSS order, clockwise from top left
        write!(
            f,
            "BorderRadii({}, {}, {}, {})",
            self.top_left, self.top_right, self.bottom_right, self.bottom_left
        )
    }
}

impl From<BorderRadii> for lyon::path::builder::BorderRadii {
    fn from(val: BorderRadii) -> Self {
        lyon::path::builder::BorderRadii {
            top_left: val.top_left,
            top_right: val.top_right,
            bottom_left: val.bottom_left,
            bottom_right: val.bottom_right,
        }
    }
}

/// Builds a [`Shape::Polygon`] from path commands.
///
/// Only the first sub-path is kept. Bézier curves are flattened into line segments no
/// further than the builder's tolerance from the true curve.
///
/// ```rust
/// use polybatch::{PolygonBuilder, Shape};
///
/// let arch = PolygonBuilder::new()
///     .begin((0.0, 0.0))
///     .quadratic_bezier_to((25.0, 40.0), (50.0, 0.0))
///     .build();
///
/// let Shape::Polygon(polygon) = arch else { unreachable!() };
/// assert!(polygon.points.len() > 3);
/// assert!(!polygon.close_stroke);
/// ```
#[derive(Clone)]
pub struct PolygonBuilder {
    tolerance: f32,
    path_builder: lyon::path::Builder,
}

impl Default for PolygonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonBuilder {
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_CURVE_TOLERANCE,
            path_builder: lyon::path::Path::builder(),
        }
    }

    /// Sets the curve flattening tolerance.
    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Begin path at point
    pub fn begin(mut self, point: (f32, f32)) -> Self {
        self.path_builder.begin(point.into());
        self
    }

    pub fn line_to(mut self, point: (f32, f32)) -> Self {
        self.path_builder.line_to(point.into());
        self
    }

    pub fn cubic_bezier_to(mut self, ctrl: (f32, f32), ctrl2: (f32, f32), to: (f32, f32)) -> Self {
        self.path_builder
            .cubic_bezier_to(ctrl.into(), ctrl2.into(), to.into());
        self
    }

    pub fn quadratic_bezier_to(mut self, ctrl: (f32, f32), to: (f32, f32)) -> Self {
        self.path_builder
            .quadratic_bezier_to(ctrl.into(), to.into());
        self
    }

    /// Closes the current sub-path. The stroke of the built polygon will join its ends.
    pub fn close(mut self) -> Self {
        self.path_builder.close();
        self
    }

    pub fn build(self) -> Shape {
        let path = self.path_builder.build();
        let mut points = Vec::new();
        let mut close_stroke = false;

        for event in path.iter().flattened(self.tolerance) {
            match event {
                PathEvent::Begin { at } => points.push(at),
                PathEvent::Line { to, .. } => points.push(to),
                PathEvent::End { close, .. } => {
                    close_stroke = close;
                    break;
                }
                _ => {}
            }
        }

        Shape::Polygon(Polygon {
            points,
            close_stroke,
        })
    }
}

impl From<PolygonBuilder> for Shape {
    fn from(value: PolygonBuilder) -> Self {
        value.build()
    }
}

#[cfg(test)]
mod tests {
    use super::{BorderRadii, Polygon, Shape};

    #[test]
    fn rectangle_contains_is_half_open() {
        let rect = Shape::rect(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(0.0, 0.0));
        assert!(rect.contains(9.99, 9.99));
        assert!(!rect.contains(10.0, 5.0));
        assert!(!Shape::rect(0.0, 0.0, 0.0, 10.0).contains(0.0, 0.0));
    }

    #[test]
    fn circle_and_ellipse_contain_their_boundary() {
        assert!(Shape::circle(0.0, 0.0, 5.0).contains(5.0, 0.0));
        assert!(!Shape::circle(0.0, 0.0, 5.0).contains(4.0, 4.0));
        assert!(Shape::ellipse(0.0, 0.0, 10.0, 2.0).contains(9.0, 0.0));
        assert!(!Shape::ellipse(0.0, 0.0, 10.0, 2.0).contains(0.0, 3.0));
    }

    #[test]
    fn polygon_contains_uses_even_odd_rule() {
        let square = Shape::polygon([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert!(square.contains(5.0, 5.0));
        assert!(!square.contains(15.0, 5.0));

        let degenerate = Shape::polygon([(0.0, 0.0), (10.0, 0.0)]);
        assert!(!degenerate.contains(5.0, 0.0));
    }

    #[test]
    fn rounded_rectangle_excludes_cut_corners() {
        let rect = Shape::rounded_rect(0.0, 0.0, 100.0, 50.0, BorderRadii::new(10.0));
        assert!(!rect.contains(1.0, 1.0));
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(50.0, 0.5));
        assert!(!rect.contains(99.0, 49.0));
    }

    #[test]
    fn oversized_radii_are_clamped_to_half_the_short_side() {
        let Shape::RoundedRectangle(rect) =
            Shape::rounded_rect(0.0, 0.0, 40.0, 20.0, BorderRadii::new(50.0))
        else {
            unreachable!();
        };
        assert_eq!(rect.clamped_radii(), BorderRadii::new(10.0));
    }

    #[test]
    fn open_polygon_does_not_close_its_stroke() {
        assert!(!Shape::from(Polygon::open([(0.0, 0.0), (1.0, 1.0)])).is_closed_stroke());
        assert!(Shape::circle(0.0, 0.0, 1.0).is_closed_stroke());
    }

    #[test]
    fn builder_keeps_line_points_and_close_flag() {
        let shape = Shape::polygon_builder()
            .begin((0.0, 0.0))
            .line_to((10.0, 0.0))
            .line_to((10.0, 10.0))
            .close()
            .build();

        let Shape::Polygon(polygon) = shape else {
            unreachable!();
        };
        assert_eq!(polygon.points.len(), 3);
        assert!(polygon.close_stroke);
    }
}
