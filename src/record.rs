use crate::shape::Shape;
use crate::style::{FillStyle, LineStyle};
use lyon::math::{point, Point, Transform};

/// One drawn shape: what was drawn, how it is painted, where it sits, and what was cut out
/// of it.
///
/// `points` holds the flattened outline in world space once the record has been built by
/// the tessellator; it is empty before that.
#[derive(Debug, Clone)]
pub struct ShapeRecord {
    shape: Shape,
    fill_style: FillStyle,
    line_style: LineStyle,
    transform: Option<Transform>,
    holes: Vec<ShapeRecord>,
    pub(crate) points: Vec<Point>,
}

impl ShapeRecord {
    pub fn new(
        shape: Shape,
        fill_style: FillStyle,
        line_style: LineStyle,
        transform: Option<Transform>,
    ) -> Self {
        Self {
            shape,
            fill_style,
            line_style,
            transform,
            holes: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn fill_style(&self) -> &FillStyle {
        &self.fill_style
    }

    pub fn line_style(&self) -> &LineStyle {
        &self.line_style
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn holes(&self) -> &[ShapeRecord] {
        &self.holes
    }

    /// The flattened outline, valid after the owning geometry has been rebuilt.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Holes carry no fill and stroke with the line style of the shape they are cut from.
    pub(crate) fn add_hole(&mut self, shape: Shape, transform: Option<Transform>) {
        let hole = ShapeRecord::new(
            shape,
            FillStyle::default(),
            self.line_style.clone(),
            transform,
        );
        self.holes.push(hole);
    }

    pub(crate) fn holes_mut(&mut self) -> &mut [ShapeRecord] {
        &mut self.holes
    }

    /// Moves the built points from local into world space.
    pub(crate) fn apply_transform(&mut self) {
        if let Some(transform) = self.transform {
            for p in self.points.iter_mut() {
                *p = transform.transform_point(*p);
            }
        }
    }

    /// Maps a world point into this record's local space. `None` for a singular transform.
    pub(crate) fn to_local(&self, world: Point) -> Option<Point> {
        match self.transform {
            Some(transform) => transform
                .inverse()
                .map(|inverse| inverse.transform_point(world)),
            None => Some(world),
        }
    }

    /// Whether the world point hits this record's shape and misses all of its holes.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let world = point(x, y);
        let hits_shape = self
            .to_local(world)
            .is_some_and(|local| self.shape.contains(local.x, local.y));

        hits_shape
            && !self.holes.iter().any(|hole| {
                hole.to_local(world)
                    .is_some_and(|local| hole.shape.contains(local.x, local.y))
            })
    }
}
