use std::collections::HashMap;

use tracing::debug;

use crate::geometry::Segment;
use crate::math::Position2;

/// One segment passing through an [`IntersectPoint`].
///
/// `visited` marks the departure along the segment from this point as used.
/// Ends at `param == 1` have no departure and start out visited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentEnd {
    pub segment: usize,
    pub param: f64,
    pub visited: bool,
}

impl IncidentEnd {
    /// `true` when the point lies strictly inside the segment.
    #[must_use]
    pub fn is_interior(&self) -> bool {
        self.param > 0.0 && self.param < 1.0
    }
}

/// A node of the intersection graph.
#[derive(Debug, Clone)]
pub struct IntersectPoint {
    pub position: Position2,
    pub ends: Vec<IncidentEnd>,
}

impl IntersectPoint {
    /// Index into `ends` of the end belonging to `segment`.
    #[must_use]
    pub fn end_of(&self, segment: usize) -> Option<usize> {
        self.ends.iter().position(|e| e.segment == segment)
    }
}

/// Planar intersection graph over a pool of segments.
///
/// Segments and points are addressed by index. `by_segment[s]` lists
/// `(param, point)` pairs for every point on segment `s`, sorted by param
/// once the build completes. Points at bit-identical locations are merged.
#[derive(Debug)]
pub struct IntersectList {
    pub(super) segments: Vec<Segment>,
    pub(super) next_in_ring: Vec<Option<usize>>,
    pub(super) points: Vec<IntersectPoint>,
    pub(super) by_segment: Vec<Vec<(f64, usize)>>,
    by_position: HashMap<(u64, u64), usize>,
}

impl IntersectList {
    /// Builds the intersection graph with a left-to-right sweep.
    ///
    /// `ring_starts` holds the first segment index of every ring chain in
    /// the pool; a chain runs to the next start (or the end of the pool) and
    /// closes back on itself. Consecutive chain segments are joined directly
    /// at `(1.0, 0.0)` instead of through the general intersection test.
    #[must_use]
    pub fn build(segments: Vec<Segment>, ring_starts: &[usize]) -> Self {
        let n = segments.len();
        let mut list = Self {
            next_in_ring: chain_successors(n, ring_starts),
            segments,
            points: Vec::new(),
            by_segment: vec![Vec::new(); n],
            by_position: HashMap::new(),
        };

        for s in 0..n {
            if let Some(next) = list.next_in_ring[s] {
                let at = list.segments[s].p2();
                list.add_crossing(s, 1.0, next, 0.0, at);
            }
        }

        let mut order: Vec<usize> = (0..n)
            .filter(|&s| !list.segments[s].is_degenerate())
            .collect();
        order.sort_by(|&a, &b| {
            let (pa, pb) = (list.segments[a].leftmost(), list.segments[b].leftmost());
            pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
        });

        let mut active: Vec<usize> = Vec::new();
        let mut tested = 0usize;
        for s in order {
            let min_x = list.segments[s].min_x();
            active.retain(|&a| list.segments[a].max_x() >= min_x);
            for i in 0..active.len() {
                list.test_pair(active[i], s);
                tested += 1;
            }
            active.push(s);
        }

        for entries in &mut list.by_segment {
            entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        for point in &mut list.points {
            for end in &mut point.ends {
                end.visited = end.param == 1.0;
            }
        }

        debug!(
            segments = n,
            pair_tests = tested,
            points = list.points.len(),
            "built intersection list"
        );
        list
    }

    /// The segment pool.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every intersection point.
    #[must_use]
    pub fn points(&self) -> &[IntersectPoint] {
        &self.points
    }

    /// Total number of incident ends across all points.
    #[must_use]
    pub fn incident_end_count(&self) -> usize {
        self.points.iter().map(|p| p.ends.len()).sum()
    }

    /// The next point along `segment` strictly beyond `param`.
    #[must_use]
    pub fn next_along(&self, segment: usize, param: f64) -> Option<(f64, usize)> {
        self.by_segment[segment]
            .iter()
            .find(|(t, _)| *t > param)
            .copied()
    }

    fn is_ring_junction(&self, a: usize, ta: f64, b: usize, tb: f64) -> bool {
        (self.next_in_ring[a] == Some(b) && ta == 1.0 && tb == 0.0)
            || (self.next_in_ring[b] == Some(a) && tb == 1.0 && ta == 0.0)
    }

    fn test_pair(&mut self, a: usize, b: usize) {
        let Some(crossing) = self.segments[a].intersect(&self.segments[b], false) else {
            return;
        };
        for (ta, tb) in crossing.pairs() {
            if self.is_ring_junction(a, ta, b, tb) {
                continue;
            }
            let at = crossing_position(&self.segments[a], ta, &self.segments[b], tb);
            self.add_crossing(a, ta, b, tb, at);
        }
    }

    /// Records a crossing, extending an existing point when the location
    /// matches exactly or either end is already known on its segment.
    fn add_crossing(&mut self, a: usize, ta: f64, b: usize, tb: f64, at: Position2) {
        let existing = self
            .by_position
            .get(&position_key(&at))
            .copied()
            .or_else(|| self.find_on_segment(a, ta))
            .or_else(|| self.find_on_segment(b, tb));

        if let Some(point) = existing {
            self.attach(point, a, ta);
            self.attach(point, b, tb);
            return;
        }

        let point = self.points.len();
        self.points.push(IntersectPoint {
            position: at,
            ends: vec![
                IncidentEnd {
                    segment: a,
                    param: ta,
                    visited: false,
                },
                IncidentEnd {
                    segment: b,
                    param: tb,
                    visited: false,
                },
            ],
        });
        self.by_segment[a].push((ta, point));
        self.by_segment[b].push((tb, point));
        self.by_position.insert(position_key(&at), point);
    }

    fn find_on_segment(&self, segment: usize, param: f64) -> Option<usize> {
        self.by_segment[segment]
            .iter()
            .find(|(t, _)| *t == param)
            .map(|&(_, p)| p)
    }

    fn attach(&mut self, point: usize, segment: usize, param: f64) {
        if self.points[point].end_of(segment).is_some() {
            return;
        }
        self.points[point].ends.push(IncidentEnd {
            segment,
            param,
            visited: false,
        });
        self.by_segment[segment].push((param, point));
    }
}

/// Location of a crossing. Segment endpoints are used exactly; interior
/// crossings are snapped onto any axis-aligned segment involved.
fn crossing_position(a: &Segment, ta: f64, b: &Segment, tb: f64) -> Position2 {
    if ta == 0.0 || ta == 1.0 {
        return a.position(ta);
    }
    if tb == 0.0 || tb == 1.0 {
        return b.position(tb);
    }
    let mut at = a.position(ta);
    for s in [a, b] {
        if s.delta().x == 0.0 {
            at.x = s.p1().x;
        }
        if s.delta().y == 0.0 {
            at.y = s.p1().y;
        }
    }
    at
}

/// Exact hash key of a position; `-0.0` and `0.0` share a key.
pub(super) fn position_key(p: &Position2) -> (u64, u64) {
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// Chain successor of every segment, given the start index of each chain.
fn chain_successors(n: usize, ring_starts: &[usize]) -> Vec<Option<usize>> {
    let mut next = vec![None; n];
    for (i, &start) in ring_starts.iter().enumerate() {
        let end = ring_starts.get(i + 1).copied().unwrap_or(n).min(n);
        if end <= start + 1 {
            continue;
        }
        for s in start..end {
            next[s] = Some(if s + 1 < end { s + 1 } else { start });
        }
    }
    next
}
