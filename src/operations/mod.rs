pub mod buffer;

pub use buffer::{
    buffer_each, buffer_geometry, expand, shrink, split_antimeridian, BufferOptions,
    GeodesicBuffer,
};
