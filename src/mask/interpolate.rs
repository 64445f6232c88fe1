use crate::mask::model::{Point, StrokeData, TipShape};
use std::f32::consts::FRAC_1_SQRT_2;

const MIN_SEGMENT_LENGTH: f32 = 1e-3;

/// Corners of the axis-aligned square tip whose half-diagonal is `radius`,
/// clockwise from the top-left.
pub fn square_corners(center: Point, radius: f32) -> [Point; 4] {
    let half = radius * FRAC_1_SQRT_2;
    [
        Point::new(center.x - half, center.y - half),
        Point::new(center.x + half, center.y - half),
        Point::new(center.x + half, center.y + half),
        Point::new(center.x - half, center.y + half),
    ]
}

/// Quadrilateral bridging two consecutive tip applications.
///
/// Round tips get the trapezoid tangent to both circles. Square tips start
/// from the same trapezoid and snap each vertex to the nearest corner of its
/// own square, the first two vertices to the previous square and the last
/// two to the current one. Returns `None` when the samples coincide.
pub fn interpolation_quad(
    previous: StrokeData,
    current: StrokeData,
    shape: TipShape,
) -> Option<[Point; 4]> {
    let dx = current.point.x - previous.point.x;
    let dy = current.point.y - previous.point.y;
    let length = (dx * dx + dy * dy).sqrt();
    if !length.is_finite() || length < MIN_SEGMENT_LENGTH {
        return None;
    }
    let (px, py) = (-dy / length, dx / length);

    let offset = |p: Point, scale: f32| Point::new(p.x + px * scale, p.y + py * scale);
    let quad = [
        offset(previous.point, previous.radius),
        offset(previous.point, -previous.radius),
        offset(current.point, -current.radius),
        offset(current.point, current.radius),
    ];

    match shape {
        TipShape::Round => Some(quad),
        TipShape::Square => {
            let previous_corners = square_corners(previous.point, previous.radius);
            let current_corners = square_corners(current.point, current.radius);
            Some([
                nearest_corner(quad[0], &previous_corners),
                nearest_corner(quad[1], &previous_corners),
                nearest_corner(quad[2], &current_corners),
                nearest_corner(quad[3], &current_corners),
            ])
        }
    }
}

/// Ties keep the earliest corner.
fn nearest_corner(vertex: Point, corners: &[Point; 4]) -> Point {
    let mut best = corners[0];
    let mut best_distance = vertex.distance_sq(best);
    for &corner in &corners[1..] {
        let distance = vertex.distance_sq(corner);
        if distance < best_distance {
            best = corner;
            best_distance = distance;
        }
    }
    best
}
