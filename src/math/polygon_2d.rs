use super::{cross, Position2};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. Accepts closed or
/// open position lists; a closing duplicate contributes nothing.
#[must_use]
pub fn signed_area(points: &[Position2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Area of a polygon: outer ring minus its holes.
#[must_use]
pub fn polygon_area(polygon: &[Vec<Position2>]) -> f64 {
    let mut rings = polygon.iter();
    let Some(outer) = rings.next() else {
        return 0.0;
    };
    let holes: f64 = rings.map(|h| signed_area(h).abs()).sum();
    signed_area(outer).abs() - holes
}

/// Returns the vertices of a closed ring without the closing duplicate.
#[must_use]
pub fn open_vertices(ring: &[Position2]) -> &[Position2] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Index of the leftmost vertex, ties broken by the lowest latitude.
///
/// Comparisons are exact. Returns 0 for an empty slice.
#[must_use]
pub fn leftmost_lowest(points: &[Position2]) -> usize {
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x || (pt.x == b.x && pt.y < b.y) {
            best = i;
        }
    }
    best
}

/// Orientation of a ring from the signed turn at its leftmost-lowest vertex.
///
/// Returns `true` for counter-clockwise (positive) rings.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` for fewer than 3 distinct vertices and
/// `GeometryError::CollinearExtreme` when the extreme vertex and its two
/// neighbours are collinear.
pub fn ring_orientation(ring: &[Position2]) -> Result<bool> {
    let vertices = open_vertices(ring);
    let m = vertices.len();
    if m < 3 {
        return Err(GeometryError::Degenerate(format!("ring with {m} vertices")).into());
    }
    let i = leftmost_lowest(vertices);
    let p = vertices[i];
    let prev = vertices[(i + m - 1) % m];
    let next = vertices[(i + 1) % m];
    let turn = cross(&(p - prev), &(next - p));
    if turn > 0.0 {
        Ok(true)
    } else if turn < 0.0 {
        Ok(false)
    } else {
        Err(GeometryError::CollinearExtreme { x: p.x, y: p.y }.into())
    }
}

/// Rotates an open vertex list so it starts at the leftmost-lowest vertex.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Position2]) -> Vec<Position2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let best = leftmost_lowest(points);
    let mut rotated = Vec::with_capacity(points.len() + 1);
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Appends the first position when the list is not already closed.
#[must_use]
pub fn close_ring(mut points: Vec<Position2>) -> Vec<Position2> {
    if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
        if first != *last {
            points.push(first);
        }
    }
    points
}

/// Removes consecutive duplicate positions from an open vertex list,
/// including a duplicate between the last and first entries.
#[must_use]
pub fn dedup_vertices(points: &[Position2]) -> Vec<Position2> {
    let mut out: Vec<Position2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() != Some(p) {
            out.push(*p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Minimum and maximum longitude over every ring of a polygon.
#[must_use]
pub fn longitude_extent(polygon: &[Vec<Position2>]) -> (f64, f64) {
    polygon
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        })
}

/// Minimum and maximum latitude over every ring of a polygon.
#[must_use]
pub fn latitude_extent(polygon: &[Vec<Position2>]) -> (f64, f64) {
    polygon
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        })
}
