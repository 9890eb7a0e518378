//! Texture coordinates for freshly tessellated vertices.
//!
//! Positions are mapped through the style's matrix, if any, and divided by the frame size,
//! so one frame spans the `[0, 1]` range and repeats beyond it. Frames cut from a larger
//! atlas are then moved into the atlas's coordinate space. That adjustment assumes the
//! frame is neither rotated nor trimmed.

use crate::texture::Texture;
use lyon::math::{Point, Transform};

const WRAP_EPSILON: f32 = 1e-6;

/// Appends one UV pair per position to `uvs`.
pub(super) fn add_uvs(
    positions: &[Point],
    texture: &Texture,
    matrix: Option<&Transform>,
    uvs: &mut Vec<[f32; 2]>,
) {
    let start = uvs.len();
    let frame = texture.frame();

    uvs.extend(positions.iter().map(|&position| {
        let p = match matrix {
            Some(matrix) => matrix.transform_point(position),
            None => position,
        };
        [p.x / frame.width, p.y / frame.height]
    }));

    let base = texture.base();
    if frame.width < base.width() as f32 || frame.height < base.height() as f32 {
        adjust_uvs(&mut uvs[start..], texture);
    }
}

/// Moves frame-relative UVs into the atlas.
///
/// The whole range is shifted back by the lowest wrap cell it touches, offset to the
/// frame's position and scaled by the frame's share of the base texture.
fn adjust_uvs(uvs: &mut [[f32; 2]], texture: &Texture) {
    let frame = texture.frame();
    let base = texture.base();
    let scale_x = frame.width / base.width() as f32;
    let scale_y = frame.height / base.height() as f32;

    let Some(first) = uvs.first() else {
        return;
    };
    let mut min_x = (first[0] + WRAP_EPSILON).floor();
    let mut min_y = (first[1] + WRAP_EPSILON).floor();
    for uv in uvs.iter().skip(1) {
        min_x = min_x.min((uv[0] + WRAP_EPSILON).floor());
        min_y = min_y.min((uv[1] + WRAP_EPSILON).floor());
    }

    let offset_x = frame.x / frame.width - min_x;
    let offset_y = frame.y / frame.height - min_y;
    for uv in uvs.iter_mut() {
        uv[0] = (uv[0] + offset_x) * scale_x;
        uv[1] = (uv[1] + offset_y) * scale_y;
    }
}
