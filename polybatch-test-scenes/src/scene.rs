use polybatch::lyon::math::Transform;
use polybatch::{
    BaseTexture, BorderRadii, Color, FillStyle, Frame, GeometryConfig, GraphicsGeometry,
    LineStyle, PolygonBuilder, Shape, Texture,
};

use crate::expectations::GeometryExpectation;

// ── Grid layout constants ────────────────────────────────────────────────────

const TILE_SIZE: u32 = 80;
const COLUMNS: u32 = 5;
const ROWS: u32 = 2;

pub const CANVAS_WIDTH: u32 = TILE_SIZE * COLUMNS;
pub const CANVAS_HEIGHT: u32 = TILE_SIZE * ROWS;

/// Returns the origin (top-left corner) of tile number `n` (1-based).
fn tile_origin(tile_number: u32) -> (f32, f32) {
    let index = tile_number - 1;
    let column = index % COLUMNS;
    let row = index / COLUMNS;
    ((column * TILE_SIZE) as f32, (row * TILE_SIZE) as f32)
}

/// A geometry together with what should hold once its batches are built.
pub struct Scene {
    pub geometry: GraphicsGeometry,
    pub expectations: Vec<GeometryExpectation>,
}

/// Draws one shape of every kind, one per tile, and returns the expectations to validate.
///
/// Shared between the integration tests and the rebuild benchmark.
pub fn build_main_scene(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let mut expectations: Vec<GeometryExpectation> = Vec::new();

    expectations.extend(tile_01_rect_solid(geometry));
    expectations.extend(tile_02_rounded_rect_solid(geometry));
    expectations.extend(tile_03_polygon_triangle(geometry));
    expectations.extend(tile_04_polygon_bezier(geometry));
    expectations.extend(tile_05_polygon_with_hole(geometry));
    expectations.extend(tile_06_translated_rect(geometry));
    expectations.extend(tile_07_ellipse(geometry));
    expectations.extend(tile_08_stroked_circle(geometry));
    expectations.extend(tile_09_atlas_rect(geometry));
    expectations.extend(tile_10_native_outline(geometry));

    // Native lines can only be drawn through compiled draw calls.
    expectations.push(GeometryExpectation::batchable(false, "main_scene_not_batchable"));
    expectations
}

// ── Tiles ────────────────────────────────────────────────────────────────────

fn tile_01_rect_solid(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(1);
    geometry.draw_shape(
        Shape::rect(ox + 10.0, oy + 10.0, 60.0, 60.0),
        FillStyle::solid(Color::rgb(220, 50, 50)),
        LineStyle::default(),
        None,
    );

    vec![
        GeometryExpectation::inside(ox + 40.0, oy + 40.0, "t01_interior"),
        GeometryExpectation::outside(ox + 5.0, oy + 5.0, "t01_outside"),
    ]
}

fn tile_02_rounded_rect_solid(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(2);
    geometry.draw_shape(
        Shape::rounded_rect(ox + 10.0, oy + 10.0, 60.0, 60.0, BorderRadii::new(15.0)),
        FillStyle::solid(Color::rgb(50, 180, 50)),
        LineStyle::default(),
        None,
    );

    vec![
        GeometryExpectation::inside(ox + 40.0, oy + 40.0, "t02_interior"),
        // Inside the bounding box but outside the corner arc.
        GeometryExpectation::outside(ox + 11.0, oy + 11.0, "t02_corner_is_outside"),
    ]
}

fn tile_03_polygon_triangle(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(3);
    let triangle = PolygonBuilder::new()
        .begin((ox + 40.0, oy + 10.0))
        .line_to((ox + 70.0, oy + 70.0))
        .line_to((ox + 10.0, oy + 70.0))
        .close();
    geometry.draw_shape(
        triangle,
        FillStyle::solid(Color::rgb(50, 50, 220)),
        LineStyle::default(),
        None,
    );

    vec![
        GeometryExpectation::inside(ox + 40.0, oy + 50.0, "t03_interior"),
        GeometryExpectation::outside(ox + 15.0, oy + 15.0, "t03_outside"),
    ]
}

fn tile_04_polygon_bezier(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(4);
    let lens = PolygonBuilder::new()
        .begin((ox + 10.0, oy + 40.0))
        .cubic_bezier_to(
            (ox + 25.0, oy + 5.0),
            (ox + 55.0, oy + 5.0),
            (ox + 70.0, oy + 40.0),
        )
        .cubic_bezier_to(
            (ox + 55.0, oy + 75.0),
            (ox + 25.0, oy + 75.0),
            (ox + 10.0, oy + 40.0),
        )
        .close();
    geometry.draw_shape(
        lens,
        FillStyle::solid(Color::rgb(220, 200, 50)),
        LineStyle::solid(2.0, Color::BLACK),
        None,
    );

    vec![
        GeometryExpectation::inside(ox + 40.0, oy + 40.0, "t04_interior"),
        GeometryExpectation::outside(ox + 12.0, oy + 12.0, "t04_outside"),
    ]
}

fn tile_05_polygon_with_hole(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(5);
    geometry.draw_shape(
        Shape::polygon([
            (ox + 10.0, oy + 10.0),
            (ox + 70.0, oy + 10.0),
            (ox + 70.0, oy + 70.0),
            (ox + 10.0, oy + 70.0),
        ]),
        FillStyle::solid(Color::rgb(120, 60, 160)),
        LineStyle::default(),
        None,
    );
    geometry.draw_hole(Shape::circle(ox + 40.0, oy + 40.0, 15.0), None);

    vec![
        GeometryExpectation::inside(ox + 15.0, oy + 15.0, "t05_ring"),
        GeometryExpectation::outside(ox + 40.0, oy + 40.0, "t05_hole"),
    ]
}

fn tile_06_translated_rect(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(6);
    geometry.draw_shape(
        Shape::rect(0.0, 0.0, 20.0, 20.0),
        FillStyle::solid(Color::rgb(0, 160, 160)),
        LineStyle::default(),
        Some(Transform::translation(ox + 30.0, oy + 30.0)),
    );

    vec![
        GeometryExpectation::inside(ox + 40.0, oy + 40.0, "t06_translated_interior"),
        GeometryExpectation::outside(ox + 10.0, oy + 10.0, "t06_untranslated_origin"),
    ]
}

fn tile_07_ellipse(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(7);
    geometry.draw_shape(
        Shape::ellipse(ox + 40.0, oy + 40.0, 30.0, 10.0),
        FillStyle::solid(Color::rgb(240, 120, 0)).with_alpha(0.5),
        LineStyle::default(),
        None,
    );

    vec![
        GeometryExpectation::inside(ox + 65.0, oy + 40.0, "t07_wide_axis"),
        GeometryExpectation::outside(ox + 40.0, oy + 20.0, "t07_above_narrow_axis"),
    ]
}

fn tile_08_stroked_circle(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(8);
    geometry.draw_shape(
        Shape::circle(ox + 40.0, oy + 40.0, 25.0),
        FillStyle::default(),
        LineStyle::solid(4.0, Color::rgb(30, 30, 30)),
        None,
    );

    // Strokes never take part in hit testing.
    vec![GeometryExpectation::outside(ox + 40.0, oy + 40.0, "t08_unfilled_center")]
}

fn tile_09_atlas_rect(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(9);
    let atlas = BaseTexture::new(64, 64);
    let fill = match Texture::with_frame(atlas, Frame::new(32.0, 32.0, 32.0, 32.0)) {
        Ok(texture) => FillStyle::textured(texture),
        Err(_) => FillStyle::solid(Color::WHITE),
    };
    geometry.draw_shape(
        Shape::rect(ox + 10.0, oy + 10.0, 60.0, 60.0),
        fill,
        LineStyle::default(),
        None,
    );

    vec![GeometryExpectation::inside(ox + 40.0, oy + 40.0, "t09_textured_interior")]
}

fn tile_10_native_outline(geometry: &mut GraphicsGeometry) -> Vec<GeometryExpectation> {
    let (ox, oy) = tile_origin(10);
    geometry.draw_shape(
        Shape::rect(ox + 10.0, oy + 10.0, 60.0, 60.0),
        FillStyle::default(),
        LineStyle::native(Color::rgb(200, 0, 200)),
        None,
    );

    vec![GeometryExpectation::outside(ox + 40.0, oy + 40.0, "t10_outline_only")]
}

// ── Focused scenes ───────────────────────────────────────────────────────────

/// One opaque white rectangle: the smallest geometry that batches directly.
pub fn single_rect() -> Scene {
    let mut geometry = GraphicsGeometry::new();
    geometry.draw_shape(
        Shape::rect(0.0, 0.0, 100.0, 50.0),
        FillStyle::solid(Color::WHITE),
        LineStyle::default(),
        None,
    );

    Scene {
        geometry,
        expectations: vec![
            GeometryExpectation::batch_parts(1, "single_part"),
            GeometryExpectation::batchable(true, "batchable"),
            GeometryExpectation::vertex_count(4, "four_corners"),
            GeometryExpectation::draw_calls(0, "no_compiled_calls"),
            GeometryExpectation::wide_indices(false, "u16_indices"),
            GeometryExpectation::inside(50.0, 25.0, "interior"),
            GeometryExpectation::outside(150.0, 25.0, "right_of_rect"),
        ],
    }
}

/// `count` rectangles side by side, each with its own base texture.
///
/// Direct batching is disabled so the draw-call compiler always runs.
pub fn unique_texture_rects(count: usize) -> (Scene, Vec<Texture>) {
    let config = GeometryConfig::default().with_batchable_size(0);
    let mut geometry = GraphicsGeometry::with_config(config);
    let textures: Vec<Texture> = (0..count)
        .map(|_| Texture::from_base(BaseTexture::new(8, 8)))
        .collect();

    for (i, texture) in textures.iter().enumerate() {
        geometry.draw_shape(
            Shape::rect(i as f32 * 20.0, 0.0, 10.0, 10.0),
            FillStyle::textured(texture.clone()),
            LineStyle::default(),
            None,
        );
    }

    let max_textures = geometry.config().max_textures;
    let scene = Scene {
        geometry,
        expectations: vec![
            GeometryExpectation::batchable(false, "compiled"),
            GeometryExpectation::batch_parts(count, "one_part_per_texture"),
            GeometryExpectation::draw_calls(count.div_ceil(max_textures), "texture_budget"),
            GeometryExpectation::vertex_count(count * 4, "four_corners_each"),
        ],
    };
    (scene, textures)
}

/// A filled square with a circular hole through its middle.
pub fn polygon_with_hole() -> Scene {
    let mut geometry = GraphicsGeometry::new();
    geometry.draw_shape(
        Shape::polygon([(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]),
        FillStyle::solid(Color::rgb(10, 120, 200)),
        LineStyle::default(),
        None,
    );
    geometry.draw_hole(Shape::circle(50.0, 50.0, 20.0), None);

    Scene {
        geometry,
        expectations: vec![
            GeometryExpectation::batch_parts(1, "hole_shares_the_fill_part"),
            GeometryExpectation::inside(10.0, 10.0, "ring"),
            GeometryExpectation::outside(50.0, 50.0, "hole_center"),
            GeometryExpectation::inside(25.0, 50.0, "left_of_hole"),
        ],
    }
}

/// A filled square outlined with native lines, followed by another filled square.
pub fn mixed_native_lines() -> Scene {
    let mut geometry = GraphicsGeometry::new();
    geometry
        .draw_shape(
            Shape::rect(0.0, 0.0, 10.0, 10.0),
            FillStyle::solid(Color::WHITE),
            LineStyle::native(Color::WHITE),
            None,
        )
        .draw_shape(
            Shape::rect(20.0, 0.0, 10.0, 10.0),
            FillStyle::solid(Color::WHITE),
            LineStyle::default(),
            None,
        );

    Scene {
        geometry,
        expectations: vec![
            GeometryExpectation::batchable(false, "native_lines_block_batching"),
            GeometryExpectation::batch_parts(3, "fill_lines_fill"),
            GeometryExpectation::draw_calls(3, "one_call_per_primitive_run"),
        ],
    }
}

/// `count` same-style rectangles on a grid, merged into a single batch part.
pub fn many_rects(count: usize) -> Scene {
    let mut geometry = GraphicsGeometry::new();
    for i in 0..count {
        let x = (i % 128) as f32 * 4.0;
        let y = (i / 128) as f32 * 4.0;
        geometry.draw_shape(
            Shape::rect(x, y, 3.0, 3.0),
            FillStyle::solid(Color::rgb(90, 90, 90)),
            LineStyle::default(),
            None,
        );
    }

    let vertices = count * 4;
    let batchable = vertices <= geometry.config().batchable_size;
    Scene {
        geometry,
        expectations: vec![
            GeometryExpectation::batch_parts(usize::from(count > 0), "merged_into_one_part"),
            GeometryExpectation::vertex_count(vertices, "four_corners_each"),
            GeometryExpectation::batchable(batchable, "threshold"),
            GeometryExpectation::draw_calls(usize::from(!batchable), "single_call"),
            GeometryExpectation::wide_indices(vertices > 0xffff, "index_width"),
        ],
    }
}
