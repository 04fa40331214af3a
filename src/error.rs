use thiserror::Error;

/// Top-level error type for the buffering engine.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Malformed input geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("ring has {len} positions, at least 4 are required")]
    RingTooShort { len: usize },

    #[error("ring is not closed: first position differs from last")]
    RingNotClosed,

    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("orientation undecidable: collinear points at extreme vertex ({x}, {y})")]
    CollinearExtreme { x: f64, y: f64 },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised by the buffering operations themselves.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`BufferError`].
pub type Result<T> = std::result::Result<T, BufferError>;
