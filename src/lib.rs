pub mod error;
pub mod geodesy;
pub mod geometry;
pub mod math;
pub mod operations;

pub use error::{BufferError, GeometryError, OperationError, Result};
pub use geodesy::{Geodesy, Planar, Spherical, EARTH_RADIUS};
pub use geometry::{Geometry, MultiPolygon, Polygon, Ring, Segment};
pub use math::polygon_2d::{longitude_extent, polygon_area, ring_orientation, signed_area};
pub use math::Position2;
pub use operations::{
    buffer_each, buffer_geometry, expand, shrink, split_antimeridian, BufferOptions,
    GeodesicBuffer,
};
