use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{MultiPolygon, Polygon, Segment};
use crate::math::polygon_2d::close_ring;

use super::classify::{intersection_rings_to_ordered_segment_rings, select_rings, OrderedRing};
use super::intersect_list::IntersectList;

/// Resolves pooled segment chains into polygons.
///
/// Every chain is a closed ring of segments. The chains are intersected,
/// traced into rings and classified; rings bounding the region of winding
/// number `>= threshold` are assembled into polygons (counter-clockwise
/// outer rings, clockwise holes). `threshold = 1` yields the union of the
/// chains' interiors, `threshold = 2` the overlap of two layers. Chains of
/// fewer than 2 segments are ignored.
///
/// # Errors
///
/// Returns `OperationError::Failed` when tracing exceeds `trace_budget`
/// (defaults to [`IntersectList::default_trace_budget`]).
pub fn union_of_segments(
    chains: Vec<Vec<Segment>>,
    threshold: i32,
    trace_budget: Option<usize>,
) -> Result<MultiPolygon> {
    let mut pool = Vec::new();
    let mut starts = Vec::new();
    for chain in chains {
        if chain.len() < 2 {
            continue;
        }
        starts.push(pool.len());
        pool.extend(chain);
    }
    if pool.is_empty() {
        return Ok(Vec::new());
    }

    let mut list = IntersectList::build(pool, &starts);
    let budget = trace_budget.unwrap_or_else(|| list.default_trace_budget());
    let rings = list.trace_intersection_rings(budget)?;
    let ordered = intersection_rings_to_ordered_segment_rings(&list, &rings)?;
    let polygons = assemble(&ordered, threshold);

    debug!(
        chains = starts.len(),
        rings = ordered.len(),
        polygons = polygons.len(),
        threshold,
        "resolved segment pool"
    );
    Ok(polygons)
}

/// Groups kept rings into polygons, outer rings in leftmost-vertex order.
fn assemble(rings: &[OrderedRing], threshold: i32) -> MultiPolygon {
    let kept = select_rings(rings, threshold);

    let mut outers: Vec<usize> = kept
        .iter()
        .filter(|(r, _)| rings[*r].record.ccw)
        .map(|(r, _)| *r)
        .collect();
    outers.sort_by(|&a, &b| {
        let (pa, pb) = (rings[a].positions[0], rings[b].positions[0]);
        pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
    });

    let mut polygons: Vec<Polygon> = outers
        .iter()
        .map(|&r| vec![close_ring(rings[r].positions.clone())])
        .collect();
    for &(r, parent) in &kept {
        if rings[r].record.ccw {
            continue;
        }
        match parent.and_then(|p| outers.iter().position(|&o| o == p)) {
            Some(slot) => polygons[slot].push(close_ring(rings[r].positions.clone())),
            None => warn!(ring = r, "hole without enclosing outer ring, dropped"),
        }
    }
    polygons
}
