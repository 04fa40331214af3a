use tracing::debug;

use crate::error::Result;
use crate::geometry::{MultiPolygon, Polygon, Segment};
use crate::math::polygon_2d::{dedup_vertices, latitude_extent, longitude_extent, open_vertices, signed_area};
use crate::math::Position2;

use super::assemble::union_of_segments;

/// Longitude strips `(west, east, shift)`; clipped pieces are moved by
/// `shift` degrees back into `[-180, 180]`.
const STRIPS: [(f64, f64, f64); 3] = [
    (-540.0, -180.0, 360.0),
    (-180.0, 180.0, 0.0),
    (180.0, 540.0, -360.0),
];

/// Splits a polygon whose longitudes leave `[-180, 180]` into pieces that
/// each lie inside it.
///
/// Each overlapped strip is intersected with the polygon through the same
/// pooled-segment engine used for buffering, then shifted into range. A
/// polygon already in range is returned unchanged as the only piece.
///
/// # Errors
///
/// Propagates tracing and classification failures.
pub fn split_antimeridian(polygon: &Polygon) -> Result<MultiPolygon> {
    let (lo, hi) = longitude_extent(polygon);
    if lo >= -180.0 && hi <= 180.0 {
        return Ok(vec![polygon.clone()]);
    }
    let (south, north) = latitude_extent(polygon);

    let rings: Vec<Vec<Segment>> = polygon
        .iter()
        .enumerate()
        .map(|(i, ring)| ring_chain(ring, i == 0))
        .collect();

    let mut pieces = Vec::new();
    for (west, east, shift) in STRIPS {
        if hi <= west || lo >= east {
            continue;
        }
        let mut chains = rings.clone();
        chains.push(strip(west, east, south - 1.0, north + 1.0));
        for piece in union_of_segments(chains, 2, None)? {
            pieces.push(shifted(piece, shift));
        }
    }

    debug!(lo, hi, pieces = pieces.len(), "split across antimeridian");
    Ok(pieces)
}

/// Segment chain of a ring, oriented counter-clockwise for the outer ring
/// and clockwise for holes.
fn ring_chain(ring: &[Position2], outer: bool) -> Vec<Segment> {
    let mut pts = dedup_vertices(open_vertices(ring));
    if (signed_area(&pts) > 0.0) != outer {
        pts.reverse();
    }
    let n = pts.len();
    (0..n)
        .map(|i| Segment::new(pts[i], pts[(i + 1) % n]))
        .collect()
}

fn strip(west: f64, east: f64, south: f64, north: f64) -> Vec<Segment> {
    let corners = [
        Position2::new(west, south),
        Position2::new(east, south),
        Position2::new(east, north),
        Position2::new(west, north),
    ];
    (0..4)
        .map(|i| Segment::new(corners[i], corners[(i + 1) % 4]))
        .collect()
}

fn shifted(mut polygon: Polygon, shift: f64) -> Polygon {
    if shift != 0.0 {
        for p in polygon.iter_mut().flatten() {
            p.x += shift;
        }
    }
    polygon
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::polygon_area;

    fn closed(points: &[(f64, f64)]) -> Vec<Position2> {
        let mut ring: Vec<Position2> = points.iter().map(|&(x, y)| Position2::new(x, y)).collect();
        ring.push(ring[0]);
        ring
    }

    #[test]
    fn in_range_polygon_is_untouched() {
        let polygon = vec![closed(&[(10.0, 0.0), (11.0, 0.0), (11.0, 1.0), (10.0, 1.0)])];
        assert_eq!(split_antimeridian(&polygon).unwrap(), vec![polygon]);
    }

    #[test]
    fn straddling_square_splits_in_two() {
        let polygon = vec![closed(&[(179.0, 0.0), (181.0, 0.0), (181.0, 1.0), (179.0, 1.0)])];
        let pieces = split_antimeridian(&polygon).unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            let (lo, hi) = longitude_extent(piece);
            assert!(lo >= -180.0 && hi <= 180.0, "extent {lo}..{hi}");
            assert!((polygon_area(piece) - 1.0).abs() < 1e-9);
        }
        assert_eq!(longitude_extent(&pieces[0]), (179.0, 180.0));
        assert_eq!(longitude_extent(&pieces[1]), (-180.0, -179.0));
    }

    #[test]
    fn western_overflow_shifts_east() {
        let polygon = vec![closed(&[(-181.0, 0.0), (-179.0, 0.0), (-179.0, 1.0), (-181.0, 1.0)])];
        let pieces = split_antimeridian(&polygon).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(longitude_extent(&pieces[0]), (179.0, 180.0));
        assert_eq!(longitude_extent(&pieces[1]), (-180.0, -179.0));
    }

    #[test]
    fn hole_across_the_line_is_kept_in_both_pieces() {
        let polygon = vec![
            closed(&[(178.0, 0.0), (182.0, 0.0), (182.0, 4.0), (178.0, 4.0)]),
            closed(&[(179.5, 1.0), (179.5, 3.0), (180.5, 3.0), (180.5, 1.0)]),
        ];
        let pieces = split_antimeridian(&polygon).unwrap();
        assert_eq!(pieces.len(), 2);
        let total: f64 = pieces.iter().map(|p| polygon_area(p)).sum();
        assert!((total - 14.0).abs() < 1e-9);
        for piece in &pieces {
            assert!((polygon_area(piece) - 7.0).abs() < 1e-9);
        }
    }
}
