use crate::geodesy::Geodesy;
use crate::geometry::{Crossing, Segment};
use crate::math::polygon_2d::dedup_vertices;
use crate::math::{normalize_degrees, Position2};

/// Maximum miter distance from the original vertex as a multiple of the
/// offset. Beyond it a bevel is used instead.
pub const MITER_LIMIT: f64 = 4.0;

/// Relative margin added to the circumscribed arc radius so that chords
/// offset back inward clear the original vertex instead of meeting there.
const ARC_MARGIN: f64 = 1e-9;

/// How two consecutive offset edges meet at an original vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Corner {
    /// The offset edges pull apart and leave a gap to fill. `back` is the
    /// azimuth from the vertex to the previous vertex and `turn` the signed
    /// heading change in degrees (positive = clockwise).
    Gap { back: f64, turn: f64 },
    /// The offset edges overlap or continue straight; a plain connector is
    /// enough and any self-intersection is resolved by tracing.
    Overlap,
}

impl Corner {
    fn at<G: Geodesy + ?Sized>(
        prev: &Position2,
        vertex: &Position2,
        next: &Position2,
        distance: f64,
        geodesy: &G,
    ) -> Self {
        let back = geodesy.forward_azimuth(vertex, prev);
        let out = geodesy.forward_azimuth(vertex, next);
        let turn = normalize_degrees(out - back - 180.0);
        let opens = if distance > 0.0 { turn < 0.0 } else { turn > 0.0 };
        if opens || turn == -180.0 {
            Self::Gap { back, turn }
        } else {
            Self::Overlap
        }
    }
}

/// Builds the closed offset chain of one ring.
///
/// `ring` is an open vertex list, counter-clockwise for outer rings and
/// clockwise for holes; positive distances offset to the right of travel.
/// Gaps at convex corners are filled with a circumscribed arc, or with a
/// miter (bevel past [`MITER_LIMIT`]) when `steps <= 1`.
/// Consecutive segments share endpoints exactly and the last segment ends
/// where the first begins.
///
/// Returns `None` when fewer than 2 segments remain.
#[must_use]
pub fn offset_chain<G: Geodesy + ?Sized>(
    ring: &[Position2],
    distance: f64,
    steps: u32,
    geodesy: &G,
) -> Option<Vec<Segment>> {
    let m = ring.len();
    if m < 2 {
        return None;
    }

    let mut edges: Vec<Segment> = (0..m)
        .map(|i| {
            let mut s = Segment::new(ring[i], ring[(i + 1) % m]);
            s.buffer(distance, geodesy);
            s
        })
        .collect();

    // Fill positions between edge i's end and edge i+1's start.
    let mut fills: Vec<Vec<Position2>> = vec![Vec::new(); m];
    for i in 0..m {
        let j = (i + 1) % m;
        let vertex = ring[j];
        let corner = Corner::at(&ring[i], &vertex, &ring[(j + 1) % m], distance, geodesy);
        let Corner::Gap { back, turn } = corner else {
            continue;
        };
        if steps > 1 {
            fills[i] = arc(&vertex, back, turn, distance, steps, geodesy);
        } else if let Some(miter) = miter_point(&edges[i], &edges[j], &vertex, distance, geodesy) {
            edges[i] = Segment::new(edges[i].p1(), miter);
            edges[j] = Segment::new(miter, edges[j].p2());
        }
    }

    let mut path = Vec::with_capacity(m * 2);
    for (edge, fill) in edges.iter().zip(&fills) {
        path.push(edge.p1());
        path.push(edge.p2());
        path.extend_from_slice(fill);
    }
    let path = dedup_vertices(&path);
    let n = path.len();
    if n < 2 {
        return None;
    }
    Some(
        (0..n)
            .map(|i| Segment::new(path[i], path[(i + 1) % n]))
            .collect(),
    )
}

/// Arc positions around `vertex` between the two offset edge ends.
///
/// The positions are the vertices of the polygon circumscribing the arc of
/// radius `|distance|`, so every chord is tangent to the arc and offsetting
/// back by the same distance recovers the corner. The arc starts at the
/// azimuth the incoming edge's end was offset along and sweeps `|turn|`
/// degrees toward the outgoing edge's start in at least
/// `ceil(|turn| / 360 * steps)` steps of at most 90 degrees.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn arc<G: Geodesy + ?Sized>(
    vertex: &Position2,
    back: f64,
    turn: f64,
    distance: f64,
    steps: u32,
    geodesy: &G,
) -> Vec<Position2> {
    let (side, sweep) = if distance > 0.0 {
        (90.0, -turn.abs())
    } else {
        (-90.0, turn.abs())
    };
    let start = back - side;
    let n = (turn.abs() / 360.0 * f64::from(steps))
        .ceil()
        .max((turn.abs() / 90.0).ceil())
        .max(1.0) as usize;
    let step = sweep / n as f64;
    let reach = distance.abs() / (step / 2.0).to_radians().cos() * (1.0 + ARC_MARGIN);
    (0..n)
        .map(|k| {
            let azimuth = normalize_degrees(start + step * (k as f64 + 0.5));
            geodesy.destination(vertex, reach, azimuth)
        })
        .collect()
}

/// Extrapolated meeting point of two offset edges, if it lies within
/// [`MITER_LIMIT`] offsets of the vertex.
fn miter_point<G: Geodesy + ?Sized>(
    incoming: &Segment,
    outgoing: &Segment,
    vertex: &Position2,
    distance: f64,
    geodesy: &G,
) -> Option<Position2> {
    let Some(Crossing::Point((t, u))) = incoming.intersect(outgoing, true) else {
        return None;
    };
    if t < 1.0 || u > 0.0 {
        return None;
    }
    let miter = incoming.position(t);
    (geodesy.distance(vertex, &miter) <= MITER_LIMIT * distance.abs()).then_some(miter)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geodesy::Planar;
    use approx::assert_abs_diff_eq;

    fn unit_square() -> Vec<Position2> {
        vec![
            Position2::new(0.0, 0.0),
            Position2::new(1.0, 0.0),
            Position2::new(1.0, 1.0),
            Position2::new(0.0, 1.0),
        ]
    }

    fn assert_closed(chain: &[Segment]) {
        for (i, s) in chain.iter().enumerate() {
            assert_eq!(s.p2(), chain[(i + 1) % chain.len()].p1());
        }
    }

    #[test]
    fn mitered_square() {
        let chain = offset_chain(&unit_square(), 0.1, 1, &Planar).unwrap();
        assert_eq!(chain.len(), 4);
        assert_closed(&chain);
        let corner = chain[0].p1();
        assert_abs_diff_eq!(corner.x, -0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(corner.y, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn rounded_square_arc_is_circumscribed() {
        let chain = offset_chain(&unit_square(), 0.1, 8, &Planar).unwrap();
        // Each edge plus two arc positions per right-angle corner.
        assert_eq!(chain.len(), 16);
        assert_closed(&chain);
        let reach = 0.1 / 22.5_f64.to_radians().cos() * (1.0 + ARC_MARGIN);
        let vertex = Position2::new(1.0, 0.0);
        let arc_point = chain[1].p2();
        assert_abs_diff_eq!(Planar.distance(&vertex, &arc_point), reach, epsilon = 1e-12);
    }

    #[test]
    fn inward_offset_uses_plain_connectors() {
        let chain = offset_chain(&unit_square(), -0.1, 8, &Planar).unwrap();
        assert_eq!(chain.len(), 8);
        assert_closed(&chain);
        assert_abs_diff_eq!(chain[0].p1().y, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn sharp_spike_is_bevelled() {
        let ring = vec![
            Position2::new(0.0, 0.0),
            Position2::new(10.0, 0.0),
            Position2::new(0.0, 0.1),
        ];
        let chain = offset_chain(&ring, 1.0, 1, &Planar).unwrap();
        // Two mitered corners and one bevel at the spike.
        assert_eq!(chain.len(), 4);
        assert_closed(&chain);
        for s in &chain {
            let nearest = ring
                .iter()
                .map(|v| Planar.distance(v, &s.p1()))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest <= MITER_LIMIT);
        }
    }

    #[test]
    fn single_vertex_collapses() {
        assert!(offset_chain(&[Position2::new(0.0, 0.0)], 1.0, 8, &Planar).is_none());
    }
}
