use thiserror::Error;

use crate::topology::Tag;

/// Top-level error type for the level editing core.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("no valid orientation joins {moving} onto {target}")]
    NoValidOrientation { moving: Tag, target: Tag },
}

/// Errors related to the segment graph.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("side {0} already has a connection")]
    SideConnected(Tag),

    #[error("side {0} has no connection")]
    SideNotConnected(Tag),

    #[error("the last remaining segment cannot be deleted")]
    LastSegment,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to editing operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("too many {entity}: the level holds at most {limit}")]
    CapacityExceeded { entity: &'static str, limit: usize },

    #[error("operation failed: {0}")]
    Failed(String),

    #[error("malformed clipboard payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors raised while loading or saving editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("configuration value {name} = {value} is out of range")]
    OutOfRange { name: &'static str, value: f64 },
}

/// Convenience type alias for results using [`LevelError`].
pub type Result<T> = std::result::Result<T, LevelError>;
