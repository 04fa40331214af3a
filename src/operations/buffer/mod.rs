mod antimeridian;
mod assemble;
mod classify;
mod intersect_list;
mod offset_chain;
mod trace;

pub use antimeridian::split_antimeridian;
pub use assemble::union_of_segments;
pub use classify::{OrderedRing, RingRecord};
pub use intersect_list::{IncidentEnd, IntersectList, IntersectPoint};
pub use offset_chain::{offset_chain, MITER_LIMIT};

use rayon::prelude::*;
use tracing::debug;

use crate::error::{GeometryError, OperationError, Result};
use crate::geodesy::{Geodesy, Spherical};
use crate::geometry::{Geometry, MultiPolygon, Polygon, Ring, Segment};
use crate::math::polygon_2d::{dedup_vertices, open_vertices, ring_orientation};

/// Parameters of a buffering call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferOptions {
    /// Signed offset in the geodesy's length unit (meters for
    /// [`Spherical`]). Positive grows, negative shrinks, zero copies.
    pub distance: f64,
    /// Corner arc density; `steps <= 1` gives mitered corners.
    pub steps: u32,
    /// Split results that leave `[-180, 180]` longitude.
    pub split_antimeridian: bool,
    /// Junction-step budget for ring tracing; `None` derives it from the
    /// graph size.
    pub trace_budget: Option<usize>,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            distance: 0.0,
            steps: 8,
            split_antimeridian: true,
            trace_budget: None,
        }
    }
}

impl BufferOptions {
    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub fn with_split_antimeridian(mut self, split: bool) -> Self {
        self.split_antimeridian = split;
        self
    }

    #[must_use]
    pub fn with_trace_budget(mut self, budget: usize) -> Self {
        self.trace_budget = Some(budget);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.distance.is_finite() {
            return Err(OperationError::InvalidInput(format!(
                "buffer distance must be finite, got {}",
                self.distance
            ))
            .into());
        }
        Ok(())
    }
}

/// Buffers a set of polygons by a signed geodesic distance.
///
/// Outward buffers of all polygons are resolved together so that growing
/// polygons merge; inward buffers are resolved per polygon. Results have
/// counter-clockwise outer rings and clockwise holes.
#[derive(Debug)]
pub struct GeodesicBuffer<G = Spherical> {
    polygons: MultiPolygon,
    options: BufferOptions,
    geodesy: G,
}

impl GeodesicBuffer<Spherical> {
    /// Creates a buffer operation on the default sphere.
    #[must_use]
    pub fn new(polygons: MultiPolygon, options: BufferOptions) -> Self {
        Self {
            polygons,
            options,
            geodesy: Spherical::default(),
        }
    }
}

impl<G: Geodesy> GeodesicBuffer<G> {
    /// Replaces the geodesic model.
    #[must_use]
    pub fn with_geodesy<H: Geodesy>(self, geodesy: H) -> GeodesicBuffer<H> {
        GeodesicBuffer {
            polygons: self.polygons,
            options: self.options,
            geodesy,
        }
    }

    /// Executes the buffer.
    ///
    /// # Errors
    ///
    /// - `OperationError::InvalidInput` for a non-finite distance
    /// - `GeometryError` for malformed rings (too short, not closed,
    ///   non-finite, undecidable orientation)
    /// - `OperationError::Failed` when ring tracing exceeds its budget
    pub fn execute(&self) -> Result<MultiPolygon> {
        run(&self.polygons, &self.options, &self.geodesy)
    }
}

/// Grows polygons by `|distance|`, merging results that touch or overlap.
///
/// Behaves like [`GeodesicBuffer::execute`] with default options: a zero
/// distance returns the input unchanged and results are split at the
/// antimeridian.
///
/// # Errors
///
/// See [`GeodesicBuffer::execute`].
pub fn expand<G: Geodesy + ?Sized>(
    polygons: &[Polygon],
    distance: f64,
    steps: u32,
    geodesy: &G,
) -> Result<MultiPolygon> {
    let options = BufferOptions::default()
        .with_distance(distance.abs())
        .with_steps(steps);
    run(polygons, &options, geodesy)
}

/// Shrinks each polygon by `|distance|`. Polygons eroded entirely
/// contribute nothing.
///
/// Zero distance and antimeridian handling match [`expand`].
///
/// # Errors
///
/// See [`GeodesicBuffer::execute`].
pub fn shrink<G: Geodesy + ?Sized>(
    polygons: &[Polygon],
    distance: f64,
    steps: u32,
    geodesy: &G,
) -> Result<MultiPolygon> {
    let options = BufferOptions::default()
        .with_distance(-distance.abs())
        .with_steps(steps);
    run(polygons, &options, geodesy)
}

/// Buffers every polygon of a geometry.
///
/// # Errors
///
/// See [`GeodesicBuffer::execute`].
pub fn buffer_geometry<G: Geodesy + ?Sized>(
    geometry: &Geometry,
    options: &BufferOptions,
    geodesy: &G,
) -> Result<MultiPolygon> {
    let polygons: MultiPolygon = geometry.polygons().into_iter().cloned().collect();
    run(&polygons, options, geodesy)
}

/// Buffers independent geometries in parallel, one result per geometry.
#[must_use]
pub fn buffer_each<G: Geodesy + Sync + ?Sized>(
    geometries: &[Geometry],
    options: &BufferOptions,
    geodesy: &G,
) -> Vec<Result<MultiPolygon>> {
    geometries
        .par_iter()
        .map(|g| buffer_geometry(g, options, geodesy))
        .collect()
}

fn run<G: Geodesy + ?Sized>(
    polygons: &[Polygon],
    options: &BufferOptions,
    geodesy: &G,
) -> Result<MultiPolygon> {
    options.validate()?;
    if options.distance == 0.0 {
        return Ok(polygons.to_vec());
    }

    let prepared = prepare(polygons)?;
    let steps = options.steps.max(1);
    let buffered = if options.distance > 0.0 {
        expand_prepared(&prepared, options.distance, steps, options.trace_budget, geodesy)?
    } else {
        shrink_prepared(&prepared, options.distance, steps, options.trace_budget, geodesy)?
    };

    if !options.split_antimeridian {
        return Ok(buffered);
    }
    let mut out = Vec::with_capacity(buffered.len());
    for polygon in &buffered {
        out.extend(split_antimeridian(polygon)?);
    }
    Ok(out)
}

/// All ring chains of all polygons in one pool.
fn expand_prepared<G: Geodesy + ?Sized>(
    polygons: &[Polygon],
    distance: f64,
    steps: u32,
    budget: Option<usize>,
    geodesy: &G,
) -> Result<MultiPolygon> {
    let chains: Vec<_> = polygons
        .iter()
        .flat_map(|polygon| polygon_chains(polygon, distance, steps, geodesy))
        .collect();
    let out = union_of_segments(chains, 1, budget)?;
    debug!(inputs = polygons.len(), outputs = out.len(), distance, "expanded");
    Ok(out)
}

/// One pool per polygon.
fn shrink_prepared<G: Geodesy + ?Sized>(
    polygons: &[Polygon],
    distance: f64,
    steps: u32,
    budget: Option<usize>,
    geodesy: &G,
) -> Result<MultiPolygon> {
    let mut out = Vec::new();
    for polygon in polygons {
        let chains = polygon_chains(polygon, distance, steps, geodesy);
        out.extend(union_of_segments(chains, 1, budget)?);
    }
    debug!(inputs = polygons.len(), outputs = out.len(), distance, "shrunk");
    Ok(out)
}

/// Offset chains of a polygon's rings; empty when the outer ring collapses.
fn polygon_chains<G: Geodesy + ?Sized>(
    polygon: &Polygon,
    distance: f64,
    steps: u32,
    geodesy: &G,
) -> Vec<Vec<Segment>> {
    let mut rings = polygon.iter();
    let Some(outer) = rings.next().and_then(|r| offset_chain(r, distance, steps, geodesy)) else {
        return Vec::new();
    };
    let mut chains = vec![outer];
    chains.extend(rings.filter_map(|r| offset_chain(r, distance, steps, geodesy)));
    chains
}

/// Validates rings and returns open, deduplicated vertex lists with the
/// outer ring counter-clockwise and holes clockwise.
fn prepare(polygons: &[Polygon]) -> Result<MultiPolygon> {
    polygons
        .iter()
        .map(|polygon| {
            polygon
                .iter()
                .enumerate()
                .map(|(i, ring)| prepare_ring(ring, i == 0))
                .collect::<Result<Polygon>>()
        })
        .collect()
}

fn prepare_ring(ring: &Ring, outer: bool) -> Result<Ring> {
    if ring.len() < 4 {
        return Err(GeometryError::RingTooShort { len: ring.len() }.into());
    }
    if ring.first() != ring.last() {
        return Err(GeometryError::RingNotClosed.into());
    }
    if let Some(p) = ring.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(GeometryError::NonFinite { x: p.x, y: p.y }.into());
    }
    let mut vertices = dedup_vertices(open_vertices(ring));
    if ring_orientation(&vertices)? != outer {
        vertices.reverse();
    }
    Ok(vertices)
}
