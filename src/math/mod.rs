pub mod polygon_2d;

/// A `(longitude, latitude)` position in degrees, or `(x, y)` on a plane.
pub type Position2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Z component of the cross product of two planar vectors.
///
/// Positive when `b` turns counter-clockwise from `a`.
#[must_use]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Wraps an angle in degrees into `[-180, 180)`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let r = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if r >= 180.0 {
        r - 360.0
    } else {
        r
    }
}
