use thiserror::Error;

/// Top-level error type for the Murus envelope kernel.
#[derive(Debug, Error)]
pub enum MurusError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("polygon has fewer than 3 vertices")]
    TooFewVertices,

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Errors related to the surface store.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid model state: {0}")]
    InvalidState(String),
}

/// Errors related to envelope operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for results using [`MurusError`].
pub type Result<T> = std::result::Result<T, MurusError>;
