use crate::geodesy::Geodesy;
use crate::math::{cross, normalize_degrees, Position2, Vector2};

/// Parameter pair `(own, other)` locating one crossing on two segments.
pub type ParamPair = (f64, f64);

/// Result of intersecting two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    /// The segments meet at a single location.
    Point(ParamPair),
    /// The segments are collinear and share a sub-segment; entry and exit are
    /// sorted by the parameter on the first segment.
    Overlap(ParamPair, ParamPair),
}

impl Crossing {
    /// Every parameter pair of the crossing, in ascending order on the first
    /// segment.
    #[must_use]
    pub fn pairs(&self) -> Vec<ParamPair> {
        match *self {
            Self::Point(a) => vec![a],
            Self::Overlap(a, b) => vec![a, b],
        }
    }
}

/// A directed edge between two positions.
///
/// The delta vector `p2 - p1` is cached at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    p1: Position2,
    p2: Position2,
    delta: Vector2,
}

impl Segment {
    /// Creates a segment from `p1` to `p2`.
    #[must_use]
    pub fn new(p1: Position2, p2: Position2) -> Self {
        Self {
            p1,
            p2,
            delta: p2 - p1,
        }
    }

    /// Start position.
    #[must_use]
    pub fn p1(&self) -> Position2 {
        self.p1
    }

    /// End position.
    #[must_use]
    pub fn p2(&self) -> Position2 {
        self.p2
    }

    /// Direction vector `p2 - p1`.
    #[must_use]
    pub fn delta(&self) -> Vector2 {
        self.delta
    }

    /// `true` when both endpoints coincide.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.p1 == self.p2
    }

    #[must_use]
    pub fn min_x(&self) -> f64 {
        self.p1.x.min(self.p2.x)
    }

    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.p1.x.max(self.p2.x)
    }

    /// The endpoint with the smallest x (ties: smallest y).
    #[must_use]
    pub fn leftmost(&self) -> Position2 {
        if self.p2.x < self.p1.x || (self.p2.x == self.p1.x && self.p2.y < self.p1.y) {
            self.p2
        } else {
            self.p1
        }
    }

    /// Linear interpolation between the endpoints.
    ///
    /// `0` and `1` return the endpoints exactly.
    #[must_use]
    pub fn position(&self, param: f64) -> Position2 {
        if param == 0.0 {
            self.p1
        } else if param == 1.0 {
            self.p2
        } else {
            self.p1 + self.delta * param
        }
    }

    /// Parameter of a point assumed to lie on the segment's supporting line.
    fn param_of(&self, point: &Position2) -> f64 {
        if *point == self.p1 {
            0.0
        } else if *point == self.p2 {
            1.0
        } else {
            (point - self.p1).dot(&self.delta) / self.delta.dot(&self.delta)
        }
    }

    /// Parametric intersection with `other`.
    ///
    /// Returns `None` when the segments do not meet within their extents.
    /// With `include_invalid`, crossings of the supporting lines outside
    /// `[0, 1]` are reported as well (non-parallel segments only).
    /// Collinear segments report their shared sub-segment as an
    /// [`Crossing::Overlap`], or a [`Crossing::Point`] when they only touch.
    #[must_use]
    pub fn intersect(&self, other: &Segment, include_invalid: bool) -> Option<Crossing> {
        if self.is_degenerate() || other.is_degenerate() {
            return None;
        }
        let denom = cross(&self.delta, &other.delta);
        if denom == 0.0 {
            return self.collinear_overlap(other);
        }

        if let Some(pair) = self.shared_endpoint(other) {
            return Some(Crossing::Point(pair));
        }

        let qp = other.p1 - self.p1;
        let t = cross(&qp, &other.delta) / denom;
        let u = cross(&qp, &self.delta) / denom;
        let inside = (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u);
        if inside || include_invalid {
            Some(Crossing::Point((t, u)))
        } else {
            None
        }
    }

    fn shared_endpoint(&self, other: &Segment) -> Option<ParamPair> {
        if self.p1 == other.p1 {
            Some((0.0, 0.0))
        } else if self.p1 == other.p2 {
            Some((0.0, 1.0))
        } else if self.p2 == other.p1 {
            Some((1.0, 0.0))
        } else if self.p2 == other.p2 {
            Some((1.0, 1.0))
        } else {
            None
        }
    }

    fn collinear_overlap(&self, other: &Segment) -> Option<Crossing> {
        if cross(&(other.p1 - self.p1), &self.delta) != 0.0 {
            return None;
        }

        let candidates = [
            (0.0, other.param_of(&self.p1)),
            (1.0, other.param_of(&self.p2)),
            (self.param_of(&other.p1), 0.0),
            (self.param_of(&other.p2), 1.0),
        ];
        let mut pairs: Vec<ParamPair> = candidates
            .into_iter()
            .filter(|(t, u)| (0.0..=1.0).contains(t) && (0.0..=1.0).contains(u))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        pairs.dedup_by(|a, b| a.0 == b.0);

        match pairs.as_slice() {
            [] => None,
            [only] => Some(Crossing::Point(*only)),
            [first, .., last] => Some(Crossing::Overlap(*first, *last)),
        }
    }

    /// Horizontal distance from `point` to this segment along a rightward ray.
    ///
    /// Returns `None` when the segment does not cross the ray. The segment's
    /// latitude span is half-open so a ray through a shared vertex counts
    /// once. `Some(0.0)` means `point` lies on the segment; parity counters
    /// must treat it as inconclusive.
    #[must_use]
    pub fn right_distance_of_point(&self, point: &Position2) -> Option<f64> {
        ray_distance((self.p1.x, self.p1.y), (self.p2.x, self.p2.y), (point.x, point.y))
    }

    /// Vertical distance from `point` to this segment along an upward ray.
    ///
    /// Same conventions as [`Segment::right_distance_of_point`] with the axes
    /// swapped.
    #[must_use]
    pub fn upward_distance_of_point(&self, point: &Position2) -> Option<f64> {
        ray_distance((self.p1.y, self.p1.x), (self.p2.y, self.p2.x), (point.y, point.x))
    }

    /// Translates the segment perpendicular to its direction by `|distance|`.
    ///
    /// Positive distances move it to the right of travel, negative to the
    /// left. The start is moved along the forward azimuth at `p1`, the end
    /// along the reverse azimuth at `p2`, so each end is offset
    /// perpendicular to the geodesic at that end.
    pub fn buffer<G: Geodesy + ?Sized>(&mut self, distance: f64, geodesy: &G) {
        if distance == 0.0 {
            return;
        }
        let side = if distance > 0.0 { 90.0 } else { -90.0 };
        let forward = geodesy.forward_azimuth(&self.p1, &self.p2);
        let reverse = geodesy.forward_azimuth(&self.p2, &self.p1);
        let r = distance.abs();
        let p1 = geodesy.destination(&self.p1, r, normalize_degrees(forward + side));
        let p2 = geodesy.destination(&self.p2, r, normalize_degrees(reverse - side));
        *self = Self::new(p1, p2);
    }
}

/// Distance along the positive `a` axis from `p` to the segment `s0..s1`,
/// with coordinates given as `(a, b)` pairs.
fn ray_distance(s0: (f64, f64), s1: (f64, f64), p: (f64, f64)) -> Option<f64> {
    if p == s0 || p == s1 {
        return Some(0.0);
    }
    if s0.1 == s1.1 {
        // Parallel to the ray.
        let inside = p.1 == s0.1 && p.0 > s0.0.min(s1.0) && p.0 < s0.0.max(s1.0);
        return inside.then_some(0.0);
    }
    if (s0.1 > p.1) == (s1.1 > p.1) {
        return None;
    }
    let a_at = s0.0 + (p.1 - s0.1) * (s1.0 - s0.0) / (s1.1 - s0.1);
    let d = a_at - p.0;
    (d >= 0.0).then_some(d)
}
