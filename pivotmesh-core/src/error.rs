//! Error types for pivotmesh

use thiserror::Error;

/// Main error type for pivotmesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("point cloud has no normals")]
    MissingNormals,

    #[error("invalid ball radius: {0}")]
    InvalidRadius(f64),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for pivotmesh operations
pub type Result<T> = std::result::Result<T, Error>;
