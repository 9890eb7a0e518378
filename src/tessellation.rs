//! Turns shape records into points, triangles and line segments.
//!
//! Three steps are exposed, and a geometry calls them in this order for every record it
//! has not seen before:
//!
//! - [`Tessellator::build_shape`] / [`Tessellator::build_hole`] flatten the outline into
//!   the record's point list and move it into world space,
//! - [`Tessellator::triangulate`] appends the fill triangles,
//! - [`Tessellator::build_lines`] appends the stroke, either as line primitives (native
//!   lines) or as triangles.
//!
//! Curves are flattened and thick strokes are tessellated with `lyon`. Fills with holes go
//! through lyon's fill tessellator with the even-odd rule, so hole outlines are subtracted.

use crate::record::ShapeRecord;
use crate::shape::Shape;
use lyon::math::{point, vector, Angle, Box2D, Point};
use lyon::path::iterator::PathIterator;
use lyon::path::{PathEvent, Winding};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, StrokeOptions,
    StrokeTessellator, StrokeVertex, VertexBuffers,
};

#[derive(Debug, thiserror::Error)]
pub enum TessellationError {
    #[error("fill tessellation failed: {0:?}")]
    Fill(lyon::tessellation::TessellationError),
    #[error("stroke tessellation failed: {0:?}")]
    Stroke(lyon::tessellation::TessellationError),
}

/// How many times each tessellation step ran over the lifetime of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TessellationCounts {
    pub shapes_built: usize,
    pub holes_built: usize,
    pub fills: usize,
    pub lines: usize,
}

/// Per-geometry tessellation state. Holds lyon's tessellators and a scratch buffer so
/// repeated rebuilds do not reallocate them.
pub struct Tessellator {
    fill: FillTessellator,
    stroke: StrokeTessellator,
    scratch: VertexBuffers<Point, u32>,
    tolerance: f32,
    closed_point_eps: f32,
    counts: TessellationCounts,
}

impl std::fmt::Debug for Tessellator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tessellator")
            .field("tolerance", &self.tolerance)
            .field("closed_point_eps", &self.closed_point_eps)
            .field("counts", &self.counts)
            .finish_non_exhaustive()
    }
}

impl Tessellator {
    pub fn new(tolerance: f32, closed_point_eps: f32) -> Self {
        Self {
            fill: FillTessellator::new(),
            stroke: StrokeTessellator::new(),
            scratch: VertexBuffers::new(),
            tolerance,
            closed_point_eps,
            counts: TessellationCounts::default(),
        }
    }

    pub fn counts(&self) -> TessellationCounts {
        self.counts
    }

    /// Flattens the record's shape into its point list and applies its transform.
    pub fn build_shape(&mut self, record: &mut ShapeRecord) {
        self.counts.shapes_built += 1;
        self.build(record);
    }

    pub fn build_hole(&mut self, hole: &mut ShapeRecord) {
        self.counts.holes_built += 1;
        self.build(hole);
    }

    fn build(&mut self, record: &mut ShapeRecord) {
        let mut points = std::mem::take(&mut record.points);
        points.clear();
        flatten_shape(record.shape(), self.tolerance, self.closed_point_eps, &mut points);
        record.points = points;
        record.apply_transform();
    }

    /// Appends fill triangles for an already built record.
    ///
    /// Records with holes are filled with the even-odd rule over the outline and every hole
    /// outline. Otherwise rectangles become a quad, curved shapes a fan around their
    /// center and polygons go through the fill tessellator.
    pub fn triangulate(
        &mut self,
        record: &ShapeRecord,
        positions: &mut Vec<Point>,
        indices: &mut Vec<u32>,
    ) -> Result<(), TessellationError> {
        self.counts.fills += 1;

        let points = record.points();
        if points.len() < 3 {
            return Ok(());
        }

        if !record.holes().is_empty() {
            let mut builder = lyon::path::Path::builder();
            add_contour(&mut builder, points, true);
            for hole in record.holes() {
                if hole.points().len() >= 3 {
                    add_contour(&mut builder, hole.points(), true);
                }
            }
            return self.fill_path(&builder.build(), positions, indices);
        }

        match record.shape() {
            Shape::Rectangle(_) => {
                let Some(corners) = points.get(..4) else {
                    return Ok(());
                };
                let base = positions.len() as u32;
                positions.extend_from_slice(corners);
                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
                Ok(())
            }
            shape @ (Shape::Circle(_) | Shape::Ellipse(_) | Shape::RoundedRectangle(_)) => {
                let Some(center) = shape.center() else {
                    return Ok(());
                };
                let center = match record.transform() {
                    Some(transform) => transform.transform_point(center),
                    None => center,
                };

                let base = positions.len() as u32;
                let count = points.len() as u32;
                positions.push(center);
                positions.extend_from_slice(points);
                for i in 0..count {
                    indices.extend_from_slice(&[base, base + 1 + i, base + 1 + (i + 1) % count]);
                }
                Ok(())
            }
            Shape::Polygon(_) => {
                let mut builder = lyon::path::Path::builder();
                add_contour(&mut builder, points, true);
                self.fill_path(&builder.build(), positions, indices)
            }
        }
    }

    /// Appends the stroke of one record. Holes are stroked by calling this once per hole.
    ///
    /// Native lines become index pairs over the outline points, to be drawn with a line
    /// primitive. Other lines are tessellated into triangles `line_style.width` wide.
    pub fn build_lines(
        &mut self,
        record: &ShapeRecord,
        positions: &mut Vec<Point>,
        indices: &mut Vec<u32>,
    ) -> Result<(), TessellationError> {
        self.counts.lines += 1;

        let points = record.points();
        let style = record.line_style();
        if points.len() < 2 {
            return Ok(());
        }

        let closed = record.shape().is_closed_stroke();

        if style.native {
            let base = positions.len() as u32;
            let count = points.len() as u32;
            positions.extend_from_slice(points);
            for i in 0..count - 1 {
                indices.extend_from_slice(&[base + i, base + i + 1]);
            }
            if closed && count > 2 {
                indices.extend_from_slice(&[base + count - 1, base]);
            }
            return Ok(());
        }

        if style.width <= 0.0 {
            return Ok(());
        }

        let mut builder = lyon::path::Path::builder();
        add_contour(&mut builder, points, closed);
        let path = builder.build();

        let options = StrokeOptions::default()
            .with_line_width(style.width)
            .with_line_cap(style.cap)
            .with_line_join(style.join)
            .with_miter_limit(style.miter_limit.max(StrokeOptions::MINIMUM_MITER_LIMIT))
            .with_tolerance(self.tolerance);

        self.scratch.vertices.clear();
        self.scratch.indices.clear();
        self.stroke
            .tessellate_path(
                &path,
                &options,
                &mut BuffersBuilder::new(&mut self.scratch, |vertex: StrokeVertex| {
                    vertex.position()
                }),
            )
            .map_err(TessellationError::Stroke)?;

        append_scratch(&self.scratch, positions, indices);
        Ok(())
    }

    fn fill_path(
        &mut self,
        path: &lyon::path::Path,
        positions: &mut Vec<Point>,
        indices: &mut Vec<u32>,
    ) -> Result<(), TessellationError> {
        let options = FillOptions::default()
            .with_fill_rule(FillRule::EvenOdd)
            .with_tolerance(self.tolerance);

        self.scratch.vertices.clear();
        self.scratch.indices.clear();
        self.fill
            .tessellate_path(
                path,
                &options,
                &mut BuffersBuilder::new(&mut self.scratch, |vertex: FillVertex| {
                    vertex.position()
                }),
            )
            .map_err(TessellationError::Fill)?;

        append_scratch(&self.scratch, positions, indices);
        Ok(())
    }
}

fn append_scratch(
    scratch: &VertexBuffers<Point, u32>,
    positions: &mut Vec<Point>,
    indices: &mut Vec<u32>,
) {
    let base = positions.len() as u32;
    positions.extend_from_slice(&scratch.vertices);
    indices.extend(scratch.indices.iter().map(|index| index + base));
}

fn add_contour(builder: &mut lyon::path::Builder, points: &[Point], closed: bool) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };

    builder.begin(*first);
    for p in rest {
        builder.line_to(*p);
    }
    builder.end(closed);
}

/// Writes the local outline of `shape` into `out`.
///
/// Closed outlines never repeat their first point at the end, and consecutive points
/// closer than `eps` are merged.
fn flatten_shape(shape: &Shape, tolerance: f32, eps: f32, out: &mut Vec<Point>) {
    match shape {
        Shape::Rectangle(rect) => {
            out.extend_from_slice(&[
                point(rect.x, rect.y),
                point(rect.x + rect.width, rect.y),
                point(rect.x + rect.width, rect.y + rect.height),
                point(rect.x, rect.y + rect.height),
            ]);
            return;
        }
        Shape::Polygon(polygon) => {
            out.extend_from_slice(&polygon.points);
            if polygon.close_stroke {
                drop_closing_point(out, eps);
            }
            return;
        }
        _ => {}
    }

    let mut builder = lyon::path::Path::builder();
    match shape {
        Shape::Circle(circle) if circle.radius > 0.0 => {
            builder.add_circle(point(circle.x, circle.y), circle.radius, Winding::Positive);
        }
        Shape::Ellipse(ellipse) if ellipse.half_width > 0.0 && ellipse.half_height > 0.0 => {
            builder.add_ellipse(
                point(ellipse.x, ellipse.y),
                vector(ellipse.half_width, ellipse.half_height),
                Angle::radians(0.0),
                Winding::Positive,
            );
        }
        Shape::RoundedRectangle(rect) if rect.width > 0.0 && rect.height > 0.0 => {
            builder.add_rounded_rectangle(
                &Box2D::new(
                    point(rect.x, rect.y),
                    point(rect.x + rect.width, rect.y + rect.height),
                ),
                &rect.clamped_radii().into(),
                Winding::Positive,
            );
        }
        _ => return,
    }

    for event in builder.build().iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => out.push(at),
            PathEvent::Line { to, .. } => {
                let repeated = out
                    .last()
                    .is_some_and(|last| (*last - to).square_length() < eps * eps);
                if !repeated {
                    out.push(to);
                }
            }
            PathEvent::End { .. } => break,
            _ => {}
        }
    }
    drop_closing_point(out, eps);
}

fn drop_closing_point(points: &mut Vec<Point>, eps: f32) {
    if points.len() > 1 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if (*first - *last).square_length() < eps * eps {
                points.pop();
            }
        }
    }
}
