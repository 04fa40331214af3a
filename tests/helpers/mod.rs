// Shared fixtures and invariant checks for the integration tests.
#![allow(dead_code)]

use geobuffer::{signed_area, MultiPolygon, Polygon, Position2, Ring};

/// Installs a test-writer subscriber once; `RUST_LOG` raises the level.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Closed ring from open `(x, y)` pairs.
pub fn closed(points: &[(f64, f64)]) -> Ring {
    let mut ring: Ring = points.iter().map(|&(x, y)| Position2::new(x, y)).collect();
    ring.push(ring[0]);
    ring
}

/// Counter-clockwise axis-aligned rectangle.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
    closed(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
}

/// Asserts closure, minimum length and orientation of every output ring.
pub fn assert_well_formed(polygons: &MultiPolygon) {
    for (i, polygon) in polygons.iter().enumerate() {
        assert!(!polygon.is_empty(), "polygon {i} has no rings");
        for (j, ring) in polygon.iter().enumerate() {
            assert!(ring.len() >= 4, "polygon {i} ring {j}: {} positions", ring.len());
            assert_eq!(ring.first(), ring.last(), "polygon {i} ring {j} is open");
            let area = signed_area(ring);
            if j == 0 {
                assert!(area > 0.0, "polygon {i} outer ring is clockwise");
            } else {
                assert!(area < 0.0, "polygon {i} hole {j} is counter-clockwise");
            }
        }
    }
}

/// Largest polygon by area.
pub fn largest(polygons: &MultiPolygon) -> Option<&Polygon> {
    polygons
        .iter()
        .max_by(|a, b| geobuffer::polygon_area(a).total_cmp(&geobuffer::polygon_area(b)))
}
