pub mod segment;

pub use segment::{Crossing, ParamPair, Segment};

use crate::math::Position2;

/// A closed sequence of positions (`first == last`).
pub type Ring = Vec<Position2>;

/// An outer ring followed by zero or more hole rings.
pub type Polygon = Vec<Ring>;

/// A list of polygons.
pub type MultiPolygon = Vec<Polygon>;

/// Geometry kinds accepted by the buffering entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Flattens the geometry into its polygons, in document order.
    ///
    /// Nested collections are walked with an explicit worklist.
    #[must_use]
    pub fn polygons(&self) -> Vec<&Polygon> {
        let mut out = Vec::new();
        let mut stack: Vec<&Geometry> = vec![self];
        while let Some(geometry) = stack.pop() {
            match geometry {
                Self::Polygon(p) => out.push(p),
                Self::MultiPolygon(mp) => out.extend(mp.iter()),
                // Reversed so members pop in their original order.
                Self::Collection(members) => stack.extend(members.iter().rev()),
            }
        }
        out
    }
}
