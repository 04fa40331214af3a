use std::collections::HashMap;
use std::f64::consts::PI;

use tracing::{debug, trace, warn};

use crate::error::{OperationError, Result};
use crate::geometry::Segment;

use super::intersect_list::{IncidentEnd, IntersectList, IntersectPoint};

/// How the outgoing end is chosen at an intersect point.
///
/// Every arrival is paired with exactly one departure, so rings traced from
/// different starting ends never cross each other at a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Junction {
    /// A single departure exists.
    PassThrough,
    /// Two segments cross through each other's interiors; the arrival
    /// switches onto the other segment.
    Crossing,
    /// Any other configuration, resolved by angular matching of spokes.
    MultiWay,
}

impl Junction {
    pub(super) fn classify(point: &IntersectPoint) -> Self {
        let departures = point.ends.iter().filter(|e| e.param < 1.0).count();
        if departures == 1 {
            return Self::PassThrough;
        }
        if point.ends.len() == 2 && point.ends.iter().all(IncidentEnd::is_interior) {
            return Self::Crossing;
        }
        Self::MultiWay
    }

    /// Index into `point.ends` of the departure paired with the arrival on
    /// `arrival` (also an index into `point.ends`).
    pub(super) fn resolve(
        self,
        point: &IntersectPoint,
        arrival: usize,
        segments: &[Segment],
    ) -> Option<usize> {
        match self {
            Self::PassThrough => point.ends.iter().position(|e| e.param < 1.0),
            Self::Crossing => Some(1 - arrival),
            Self::MultiWay => match_spokes(point, segments)
                .into_iter()
                .find(|&(arrive, _)| arrive == arrival)
                .map(|(_, depart)| depart),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SpokeKind {
    Departure,
    Arrival,
}

#[derive(Debug, Clone, Copy)]
struct Spoke {
    angle: f64,
    kind: SpokeKind,
    end: usize,
}

/// Direction angle in `(-PI, PI]` with signed zeros folded together.
fn angle_of(x: f64, y: f64) -> f64 {
    let a = y.atan2(x) + 0.0;
    if a == -PI {
        PI
    } else {
        a
    }
}

/// Pairs every arrival with the first unclaimed departure counter-clockwise
/// from the direction it came from, which is the rightmost available turn.
///
/// Spokes are sorted by angle; arrivals open and departures close a
/// parenthesis, so nested pairs never cross. Returns `(arrival, departure)`
/// end indices.
fn match_spokes(point: &IntersectPoint, segments: &[Segment]) -> Vec<(usize, usize)> {
    let mut spokes = Vec::with_capacity(point.ends.len() * 2);
    for (i, end) in point.ends.iter().enumerate() {
        let d = segments[end.segment].delta();
        if end.param < 1.0 {
            spokes.push(Spoke {
                angle: angle_of(d.x, d.y),
                kind: SpokeKind::Departure,
                end: i,
            });
        }
        if end.param > 0.0 {
            spokes.push(Spoke {
                angle: angle_of(-d.x, -d.y),
                kind: SpokeKind::Arrival,
                end: i,
            });
        }
    }
    spokes.sort_by(|a, b| {
        a.angle
            .total_cmp(&b.angle)
            .then(a.kind.cmp(&b.kind))
            .then(a.end.cmp(&b.end))
    });

    // Start right after the lowest prefix depth so the stack never underflows.
    let mut depth = 0i64;
    let mut lowest = (0i64, 0usize);
    for (i, s) in spokes.iter().enumerate() {
        depth += match s.kind {
            SpokeKind::Arrival => 1,
            SpokeKind::Departure => -1,
        };
        if depth < lowest.0 {
            lowest = (depth, i + 1);
        }
    }

    let n = spokes.len();
    let mut open: Vec<usize> = Vec::new();
    let mut pairs = Vec::with_capacity(n / 2);
    for k in 0..n {
        let s = spokes[(lowest.1 + k) % n];
        match s.kind {
            SpokeKind::Arrival => open.push(s.end),
            SpokeKind::Departure => {
                if let Some(arrive) = open.pop() {
                    pairs.push((arrive, s.end));
                }
            }
        }
    }
    pairs
}

impl IntersectList {
    /// Default junction-step budget for [`IntersectList::trace_intersection_rings`].
    #[must_use]
    pub fn default_trace_budget(&self) -> usize {
        16 * self.incident_end_count() + 64
    }

    /// Extracts every closed ring of the arrangement.
    ///
    /// Each unvisited departure starts a walk that follows its segment to the
    /// next intersect point and leaves through the paired departure there.
    /// A walk that returns to a point it already holds splices that sub-loop
    /// off as its own ring. Rings are lists of point indices without the
    /// closing repeat; rings of two or fewer points are dropped.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Failed` when more than `budget` junction steps
    /// are taken.
    pub fn trace_intersection_rings(&mut self, budget: usize) -> Result<Vec<Vec<usize>>> {
        let mut rings: Vec<Vec<usize>> = Vec::new();
        let mut steps = 0usize;
        let mut abandoned = 0usize;

        for start_point in 0..self.points.len() {
            for start_end in 0..self.points[start_point].ends.len() {
                if self.points[start_point].ends[start_end].visited {
                    continue;
                }
                if !self.walk(start_point, start_end, budget, &mut steps, &mut rings)? {
                    abandoned += 1;
                }
            }
        }

        debug!(rings = rings.len(), steps, abandoned, "traced intersection rings");
        Ok(rings)
    }

    /// Walks one traversal; returns `false` when it had to be abandoned.
    fn walk(
        &mut self,
        start_point: usize,
        start_end: usize,
        budget: usize,
        steps: &mut usize,
        rings: &mut Vec<Vec<usize>>,
    ) -> Result<bool> {
        self.points[start_point].ends[start_end].visited = true;
        let start = self.points[start_point].ends[start_end];

        let mut path = vec![start_point];
        let mut seen: HashMap<usize, usize> = HashMap::from([(start_point, 0)]);
        let (mut segment, mut param) = (start.segment, start.param);

        loop {
            *steps += 1;
            if *steps > budget {
                return Err(OperationError::Failed(format!(
                    "ring tracing exceeded {budget} junction steps"
                ))
                .into());
            }

            let Some((_, q)) = self.next_along(segment, param) else {
                warn!(segment, param, "no point ahead on segment, abandoning ring");
                return Ok(false);
            };
            let point = &self.points[q];
            let Some(arrival) = point.end_of(segment) else {
                warn!(segment, point = q, "arrival end missing, abandoning ring");
                return Ok(false);
            };
            let junction = Junction::classify(point);
            let Some(depart) = junction.resolve(point, arrival, &self.segments) else {
                warn!(point = q, ?junction, "unbalanced junction, abandoning ring");
                return Ok(false);
            };
            trace!(point = q, ?junction, arrival, depart, "junction");

            if q == start_point && depart == start_end {
                push_ring(rings, path);
                return Ok(true);
            }
            let next = point.ends[depart];
            if next.visited {
                warn!(point = q, segment = next.segment, "departure already used, abandoning ring");
                return Ok(false);
            }
            self.points[q].ends[depart].visited = true;

            if let Some(&at) = seen.get(&q) {
                let mut sub: Vec<usize> = vec![q];
                sub.extend(path.drain(at + 1..));
                for p in &sub[1..] {
                    seen.remove(p);
                }
                trace!(point = q, len = sub.len(), "spliced sub-loop");
                push_ring(rings, sub);
            } else {
                seen.insert(q, path.len());
                path.push(q);
            }
            segment = next.segment;
            param = next.param;
        }
    }
}

fn push_ring(rings: &mut Vec<Vec<usize>>, ring: Vec<usize>) {
    if ring.len() > 2 {
        rings.push(ring);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use crate::math::Position2;

    fn chain(points: &[(f64, f64)]) -> Vec<Segment> {
        let n = points.len();
        (0..n)
            .map(|i| {
                let (x1, y1) = points[i];
                let (x2, y2) = points[(i + 1) % n];
                Segment::new(Position2::new(x1, y1), Position2::new(x2, y2))
            })
            .collect()
    }

    fn traced(chains: &[&[(f64, f64)]]) -> (IntersectList, Vec<Vec<usize>>) {
        let mut segments = Vec::new();
        let mut starts = Vec::new();
        for c in chains {
            starts.push(segments.len());
            segments.extend(chain(c));
        }
        let mut list = IntersectList::build(segments, &starts);
        let budget = list.default_trace_budget();
        let rings = list.trace_intersection_rings(budget).unwrap();
        (list, rings)
    }

    fn area(list: &IntersectList, ring: &[usize]) -> f64 {
        let pts: Vec<Position2> = ring.iter().map(|&p| list.points()[p].position).collect();
        signed_area(&pts)
    }

    fn end(segment: usize, param: f64) -> IncidentEnd {
        IncidentEnd {
            segment,
            param,
            visited: false,
        }
    }

    #[test]
    fn single_square_traces_itself() {
        let (list, rings) = traced(&[&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]]);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert!((area(&list, &rings[0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overlapping_squares_give_union_and_overlap() {
        let (list, rings) = traced(&[
            &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
            &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)],
        ]);
        assert_eq!(rings.len(), 2);
        let mut areas: Vec<f64> = rings.iter().map(|r| area(&list, r)).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] - 1.0).abs() < 1e-12);
        assert!((areas[1] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn bowtie_splits_into_opposite_rings() {
        let (list, rings) = traced(&[&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]]);
        assert_eq!(rings.len(), 2);
        let mut areas: Vec<f64> = rings.iter().map(|r| area(&list, r)).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] + 1.0).abs() < 1e-12);
        assert!((areas[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pinched_chain_splices_sub_loop() {
        let (list, rings) = traced(&[&[
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (1.0, 1.0),
            (0.0, 2.0),
        ]]);
        assert_eq!(rings.len(), 2);
        for ring in &rings {
            assert_eq!(ring.len(), 3);
            assert!((area(&list, ring) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn adjacent_squares_merge_across_shared_edge() {
        let (list, rings) = traced(&[
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            &[(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)],
        ]);
        // The shared edge runs both ways and collapses into a dropped
        // two-point ring; the outline covers both squares.
        assert_eq!(rings.len(), 1);
        assert!((area(&list, &rings[0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn every_departure_is_used() {
        let (list, _) = traced(&[
            &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
            &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)],
        ]);
        assert!(list.points().iter().flat_map(|p| &p.ends).all(|e| e.visited));
    }

    #[test]
    fn budget_exhaustion_is_an_error() {
        let mut list = IntersectList::build(
            chain(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            &[0],
        );
        assert!(list.trace_intersection_rings(2).is_err());
    }

    #[test]
    fn junction_classification() {
        let pass = IntersectPoint {
            position: Position2::origin(),
            ends: vec![end(0, 1.0), end(1, 0.0)],
        };
        assert_eq!(Junction::classify(&pass), Junction::PassThrough);
        assert_eq!(Junction::PassThrough.resolve(&pass, 0, &[]), Some(1));

        let cross = IntersectPoint {
            position: Position2::origin(),
            ends: vec![end(0, 0.5), end(1, 0.5)],
        };
        assert_eq!(Junction::classify(&cross), Junction::Crossing);
        assert_eq!(Junction::Crossing.resolve(&cross, 0, &[]), Some(1));
        assert_eq!(Junction::Crossing.resolve(&cross, 1, &[]), Some(0));

        let multi = IntersectPoint {
            position: Position2::origin(),
            ends: vec![end(0, 1.0), end(1, 0.0), end(2, 0.5)],
        };
        assert_eq!(Junction::classify(&multi), Junction::MultiWay);
    }

    #[test]
    fn multiway_takes_rightmost_turn() {
        // Arrive heading east on segment 0; leave north (1) or south (2);
        // segment 3 arrives from the north-east to balance the junction.
        let segments = vec![
            Segment::new(Position2::new(-1.0, 0.0), Position2::new(0.0, 0.0)),
            Segment::new(Position2::new(0.0, 0.0), Position2::new(0.0, 1.0)),
            Segment::new(Position2::new(0.0, 0.0), Position2::new(0.0, -1.0)),
            Segment::new(Position2::new(1.0, 1.0), Position2::new(0.0, 0.0)),
        ];
        let point = IntersectPoint {
            position: Position2::origin(),
            ends: vec![end(0, 1.0), end(1, 0.0), end(2, 0.0), end(3, 1.0)],
        };
        assert_eq!(Junction::MultiWay.resolve(&point, 0, &segments), Some(2));
        assert_eq!(Junction::MultiWay.resolve(&point, 3, &segments), Some(1));
    }
}
