pub mod expectations;
pub mod scene;

pub use expectations::{check_geometry, Check, GeometryExpectation};
pub use scene::{
    build_main_scene, many_rects, mixed_native_lines, polygon_with_hole, single_rect,
    unique_texture_rects, Scene, CANVAS_HEIGHT, CANVAS_WIDTH,
};
