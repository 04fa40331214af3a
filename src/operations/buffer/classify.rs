use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::geometry::Segment;
use crate::math::polygon_2d::{dedup_vertices, ring_orientation, rotate_to_canonical_start, signed_area};
use crate::math::{cross, Position2};

use super::intersect_list::{position_key, IntersectList};

type PositionKey = (u64, u64);

/// Orientation and nesting of one traced ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingRecord {
    /// `true` for counter-clockwise (positive) rings.
    pub ccw: bool,
    /// Index of the nearest enclosing ring.
    pub parent: Option<usize>,
    /// Indices of the leftmost-lowest and rightmost-highest vertices.
    pub extreme: (usize, usize),
}

/// Where one ring lies relative to another.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Containment {
    /// Inside, with the upward distance to the enclosing boundary.
    Inside(f64),
    Outside,
    /// Same vertices and edges.
    Coincident,
}

/// A traced ring as positions and segments, starting at its leftmost-lowest
/// vertex.
#[derive(Debug, Clone)]
pub struct OrderedRing {
    pub positions: Vec<Position2>,
    pub segments: Vec<Segment>,
    pub record: RingRecord,
    area: f64,
    /// Traced vertices before straight-vertex removal.
    boundary: Vec<Position2>,
    vertices: HashSet<PositionKey>,
    edges: HashSet<(PositionKey, PositionKey)>,
}

impl OrderedRing {
    /// Builds a ring from traced vertices, or `None` when fewer than 3
    /// remain after removing straight vertices and spikes.
    fn new(traced: &[Position2]) -> Result<Option<Self>> {
        let cleaned = remove_straight_vertices(traced);
        if cleaned.len() < 3 {
            return Ok(None);
        }
        let positions = rotate_to_canonical_start(&cleaned);
        let ccw = ring_orientation(&positions)?;
        let n = positions.len();
        let segments = (0..n)
            .map(|i| Segment::new(positions[i], positions[(i + 1) % n]))
            .collect();
        let mut max = 0;
        for (i, p) in positions.iter().enumerate() {
            let b = &positions[max];
            if p.x > b.x || (p.x == b.x && p.y > b.y) {
                max = i;
            }
        }

        let boundary = dedup_vertices(traced);
        let m = boundary.len();
        let vertices = boundary.iter().map(position_key).collect();
        let edges = (0..m)
            .map(|i| edge_key(&boundary[i], &boundary[(i + 1) % m]))
            .collect();

        Ok(Some(Self {
            area: signed_area(&positions).abs(),
            positions,
            segments,
            record: RingRecord {
                ccw,
                parent: None,
                extreme: (0, max),
            },
            boundary,
            vertices,
            edges,
        }))
    }

    fn min_x(&self) -> f64 {
        self.positions[self.record.extreme.0].x
    }

    fn max_x(&self) -> f64 {
        self.positions[self.record.extreme.1].x
    }

    fn sign(&self) -> i32 {
        if self.record.ccw {
            1
        } else {
            -1
        }
    }

    /// Casts an upward ray from `point` through this ring.
    ///
    /// Returns `None` when the point lies on the boundary, otherwise the
    /// parity result and the nearest crossing distance.
    fn cast_up(&self, point: &Position2) -> Option<(bool, f64)> {
        if point.x < self.min_x() || point.x > self.max_x() {
            return Some((false, f64::INFINITY));
        }
        let mut inside = false;
        let mut nearest = f64::INFINITY;
        for segment in &self.segments {
            match segment.upward_distance_of_point(point) {
                Some(d) if d == 0.0 => return None,
                Some(d) => {
                    inside = !inside;
                    nearest = nearest.min(d);
                }
                None => {}
            }
        }
        Some((inside, nearest))
    }

    /// Test points on `other` that are not on this ring's boundary: its
    /// vertices this ring does not pass through, and midpoints of its edges
    /// this ring does not share.
    ///
    /// Traced rings share intersect points exactly, so shared boundary is
    /// found by key rather than by a ray landing on it.
    fn test_points<'a>(&'a self, other: &'a OrderedRing) -> impl Iterator<Item = Position2> + 'a {
        let m = other.boundary.len();
        (0..m).filter_map(move |i| {
            let (u, v) = (&other.boundary[i], &other.boundary[(i + 1) % m]);
            if !self.vertices.contains(&position_key(u)) {
                Some(*u)
            } else if !self.edges.contains(&edge_key(u, v)) {
                Some(nalgebra::center(u, v))
            } else {
                None
            }
        })
    }

    /// Where `other` lies relative to this ring.
    ///
    /// Rings never cross, so the first test point off this ring's boundary
    /// decides.
    fn containment(&self, other: &OrderedRing) -> Containment {
        let mut tested = false;
        for point in self.test_points(other) {
            tested = true;
            match self.cast_up(&point) {
                None => {}
                Some((true, d)) => return Containment::Inside(d),
                Some((false, _)) => return Containment::Outside,
            }
        }
        if tested {
            Containment::Outside
        } else {
            Containment::Coincident
        }
    }
}

fn edge_key(u: &Position2, v: &Position2) -> (PositionKey, PositionKey) {
    let (a, b) = (position_key(u), position_key(v));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Whether ring `a` stacks directly over its coincident twin `r`.
///
/// Twins of one orientation stack in trace order. Of opposite twins the
/// clockwise one is outer so their windings cancel.
fn stacks_over(rings: &[OrderedRing], a: usize, r: usize) -> bool {
    match (rings[a].record.ccw, rings[r].record.ccw) {
        (x, y) if x == y => a < r,
        (ccw, _) => !ccw,
    }
}

/// Converts traced point-index rings into ordered rings with orientation and
/// nesting parent.
///
/// Consecutive duplicates, straight-through vertices and spikes are removed
/// first; rings left with fewer than 3 vertices are dropped. Parents are
/// found by sweeping rings in order of their leftmost vertex and casting an
/// upward ray from each against the rings still active. Coincident rings
/// nest inside one another.
///
/// # Errors
///
/// Propagates `GeometryError::CollinearExtreme` from orientation.
pub fn intersection_rings_to_ordered_segment_rings(
    list: &IntersectList,
    rings: &[Vec<usize>],
) -> Result<Vec<OrderedRing>> {
    let mut ordered = Vec::with_capacity(rings.len());
    for ring in rings {
        let positions: Vec<Position2> = ring.iter().map(|&p| list.points()[p].position).collect();
        if let Some(r) = OrderedRing::new(&positions)? {
            ordered.push(r);
        }
    }
    assign_parents(&mut ordered);

    debug!(
        traced = rings.len(),
        kept = ordered.len(),
        "classified rings"
    );
    Ok(ordered)
}

/// Sets each ring's parent to the smallest ring enclosing it, nearest
/// boundary first on ties. A stack of coincident rings forms a chain.
fn assign_parents(ordered: &mut [OrderedRing]) {
    let mut order: Vec<usize> = (0..ordered.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (ordered[a].positions[0], ordered[b].positions[0]);
        pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
    });

    let mut active: Vec<usize> = Vec::new();
    let mut next = 0;
    let mut parents = vec![None; ordered.len()];
    for &r in &order {
        let x = ordered[r].min_x();
        while next < order.len() && ordered[order[next]].min_x() <= x {
            active.push(order[next]);
            next += 1;
        }
        active.retain(|&a| ordered[a].max_x() >= x);

        parents[r] = active
            .iter()
            .filter(|&&a| a != r)
            .filter_map(|&a| match ordered[a].containment(&ordered[r]) {
                Containment::Inside(d) => Some((a, d)),
                Containment::Coincident if stacks_over(&*ordered, a, r) => Some((a, 0.0)),
                Containment::Coincident | Containment::Outside => None,
            })
            .min_by(|(a, da), (b, db)| {
                ordered[*a]
                    .area
                    .total_cmp(&ordered[*b].area)
                    .then(da.total_cmp(db))
                    .then(b.cmp(a))
            })
            .map(|(a, _)| a);
    }
    for (ring, parent) in ordered.iter_mut().zip(parents) {
        ring.record.parent = parent;
    }
}

/// Removes duplicates and vertices with a zero turn (straight continuations
/// and spikes) until none remain.
fn remove_straight_vertices(points: &[Position2]) -> Vec<Position2> {
    let mut pts = dedup_vertices(points);
    loop {
        let m = pts.len();
        if m < 3 {
            return pts;
        }
        let straight = (0..m).find(|&i| {
            let (prev, v, next) = (pts[(i + m - 1) % m], pts[i], pts[(i + 1) % m]);
            cross(&(v - prev), &(next - v)) == 0.0
        });
        match straight {
            Some(i) => {
                pts.remove(i);
                pts = dedup_vertices(&pts);
            }
            None => return pts,
        }
    }
}

/// Winding number just inside each ring: its own sign plus its ancestors'.
fn winding_depths(rings: &[OrderedRing]) -> Vec<i32> {
    let mut depth: Vec<Option<i32>> = vec![None; rings.len()];
    for start in 0..rings.len() {
        let mut chain = Vec::new();
        let mut cursor = Some(start);
        let mut base = 0;
        while let Some(r) = cursor {
            if let Some(d) = depth[r] {
                base = d;
                break;
            }
            if chain.len() > rings.len() {
                break;
            }
            chain.push(r);
            cursor = rings[r].record.parent;
        }
        for &r in chain.iter().rev() {
            base += rings[r].sign();
            depth[r] = Some(base);
        }
    }
    depth.into_iter().map(|d| d.unwrap_or(0)).collect()
}

/// Rings kept at winding threshold `k`, with their nearest kept ancestor.
///
/// A ring is kept when it separates winding `>= k` from `< k`. Dropped
/// rings pass their children up to their own parent.
#[must_use]
pub fn select_rings(rings: &[OrderedRing], k: i32) -> Vec<(usize, Option<usize>)> {
    let depths = winding_depths(rings);
    let keep: Vec<bool> = rings
        .iter()
        .zip(&depths)
        .map(|(ring, &inside)| {
            let outside = inside - ring.sign();
            (inside >= k) != (outside >= k)
        })
        .collect();

    let kept_parent = |mut cursor: Option<usize>| {
        while let Some(r) = cursor {
            if keep[r] {
                return Some(r);
            }
            cursor = rings[r].record.parent;
        }
        None
    };

    (0..rings.len())
        .filter(|&r| keep[r])
        .map(|r| (r, kept_parent(rings[r].record.parent)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Position2 {
        Position2::new(x, y)
    }

    fn ring(points: &[(f64, f64)]) -> OrderedRing {
        let pts: Vec<Position2> = points.iter().map(|&(x, y)| p(x, y)).collect();
        OrderedRing::new(&pts).unwrap().unwrap()
    }

    fn square(x0: f64, y0: f64, size: f64, ccw: bool) -> OrderedRing {
        let mut pts = vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
        ];
        if !ccw {
            pts.reverse();
        }
        ring(&pts)
    }

    fn nest(rings: &mut [OrderedRing], parents: &[Option<usize>]) {
        for (r, parent) in rings.iter_mut().zip(parents) {
            r.record.parent = *parent;
        }
    }

    #[test]
    fn straight_vertices_and_spikes_are_removed() {
        let pts = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(2.0, 3.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
        ];
        let out = remove_straight_vertices(&pts);
        assert_eq!(out, vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]);
    }

    #[test]
    fn record_has_orientation_and_extremes() {
        let r = ring(&[(1.0, 0.0), (3.0, 1.0), (2.0, 2.0), (0.0, 1.0)]);
        assert!(r.record.ccw);
        assert_eq!(r.positions[r.record.extreme.0], p(0.0, 1.0));
        assert_eq!(r.positions[r.record.extreme.1], p(3.0, 1.0));
    }

    #[test]
    fn containment_through_touching_vertex() {
        // Inner triangle shares the outer square's corner.
        let outer = square(0.0, 0.0, 4.0, true);
        let inner = ring(&[(0.0, 0.0), (2.0, 1.0), (1.0, 2.0)]);
        assert!(matches!(outer.containment(&inner), Containment::Inside(_)));
        assert_eq!(inner.containment(&outer), Containment::Outside);
    }

    #[test]
    fn disjoint_rings_do_not_enclose() {
        let a = square(0.0, 0.0, 1.0, true);
        let b = square(3.0, 0.0, 1.0, true);
        assert_eq!(a.containment(&b), Containment::Outside);
        assert_eq!(b.containment(&a), Containment::Outside);
    }

    #[test]
    fn sibling_above_is_not_parent() {
        let outer = square(0.0, 0.0, 10.0, true);
        let low = square(1.0, 1.0, 2.0, false);
        let high = square(1.0, 5.0, 2.0, false);
        assert_eq!(high.containment(&low), Containment::Outside);
        assert!(matches!(outer.containment(&low), Containment::Inside(_)));
    }

    #[test]
    fn collapsed_ring_is_skipped() {
        let flat = [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(1.0, 0.0)];
        assert!(OrderedRing::new(&flat).unwrap().is_none());
    }

    fn parents(rings: &mut [OrderedRing]) -> Vec<Option<usize>> {
        assign_parents(rings);
        rings.iter().map(|r| r.record.parent).collect()
    }

    #[test]
    fn identical_rings_stack_in_trace_order() {
        let mut rings = vec![square(0.0, 0.0, 1.0, true), square(0.0, 0.0, 1.0, true)];
        assert_eq!(rings[0].containment(&rings[1]), Containment::Coincident);
        assert_eq!(parents(&mut rings), vec![None, Some(0)]);
        assert_eq!(select_rings(&rings, 1), vec![(0, None)]);
    }

    #[test]
    fn identical_triple_forms_a_chain() {
        let mut rings = vec![
            square(0.0, 0.0, 1.0, true),
            square(0.0, 0.0, 1.0, true),
            square(0.0, 0.0, 1.0, true),
        ];
        assert_eq!(parents(&mut rings), vec![None, Some(0), Some(1)]);
        assert_eq!(select_rings(&rings, 1), vec![(0, None)]);
        assert_eq!(select_rings(&rings, 2), vec![(1, None)]);
    }

    #[test]
    fn opposite_twins_cancel() {
        let mut rings = vec![square(0.0, 0.0, 1.0, true), square(0.0, 0.0, 1.0, false)];
        assert_eq!(parents(&mut rings), vec![Some(1), None]);
        assert!(select_rings(&rings, 1).is_empty());
    }

    #[test]
    fn shared_diagonal_edges_do_not_invert_nesting() {
        // Both rings run A -> B -> C along the same slanted edges; the
        // inner one closes through the chord C -> D, the outer one passes
        // D on its straight left side.
        let outer = [
            (0.0, 0.0),
            (0.7, 0.1),
            (1.3, 0.9),
            (1.1, 2.3),
            (0.0, 2.0),
            (0.0, 1.0),
        ];
        let inner = [(0.0, 0.0), (0.7, 0.1), (1.3, 0.9), (0.0, 1.0)];

        let (o, i) = (ring(&outer), ring(&inner));
        assert_eq!(o.positions.len(), 5);
        assert!(matches!(o.containment(&i), Containment::Inside(_)));
        assert_eq!(i.containment(&o), Containment::Outside);

        let mut rings = vec![ring(&inner), ring(&outer)];
        assert_eq!(parents(&mut rings), vec![Some(1), None]);
        assert_eq!(select_rings(&rings, 1), vec![(1, None)]);
    }

    #[test]
    fn hole_survives_under_outer() {
        let mut rings = vec![square(0.0, 0.0, 10.0, true), square(2.0, 2.0, 2.0, false)];
        nest(&mut rings, &[None, Some(0)]);
        assert_eq!(select_rings(&rings, 1), vec![(0, None), (1, Some(0))]);
    }

    #[test]
    fn covered_annulus_leaves_only_innermost_hole() {
        // Windings 1 > 2 > 1 > 0: only the outer and the innermost hole
        // cross the covered threshold.
        let mut rings = vec![
            square(0.0, 0.0, 10.0, true),
            square(1.0, 1.0, 8.0, true),
            square(2.0, 2.0, 2.0, false),
            square(3.0, 3.0, 1.0, false),
        ];
        nest(&mut rings, &[None, Some(0), Some(1), Some(2)]);
        let kept = select_rings(&rings, 1);
        assert_eq!(kept, vec![(0, None), (3, Some(0))]);
    }

    #[test]
    fn negative_top_level_ring_is_dropped() {
        let rings = vec![square(0.0, 0.0, 1.0, false)];
        assert!(select_rings(&rings, 1).is_empty());
    }

    #[test]
    fn threshold_two_keeps_overlap_only() {
        let mut rings = vec![square(0.0, 0.0, 10.0, true), square(2.0, 2.0, 2.0, true)];
        nest(&mut rings, &[None, Some(0)]);
        assert_eq!(select_rings(&rings, 2), vec![(1, None)]);
    }

    #[test]
    fn depths_accumulate_along_ancestors() {
        let mut rings = vec![
            square(0.0, 0.0, 10.0, true),
            square(1.0, 1.0, 8.0, false),
            square(2.0, 2.0, 2.0, true),
        ];
        nest(&mut rings, &[None, Some(0), Some(1)]);
        assert_eq!(winding_depths(&rings), vec![1, 0, 1]);
    }
}
