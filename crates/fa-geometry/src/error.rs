//! Geometry-specific error types.

use fa_core::FaError;
use thiserror::Error;

pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while building influence matrices or segment maps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Element direction has (numerically) zero length.
    #[error("Element {index} has a degenerate direction vector")]
    DegenerateDirection { index: usize },

    /// Raw matrix data does not describe 6 rows.
    #[error("Influence data has {len} entries, not a multiple of 6 rows")]
    RaggedMatrix { len: usize },

    /// Row count other than the six resultant components.
    #[error("Influence matrix must have 6 rows, got {rows}")]
    RowCount { rows: usize },

    #[error("Invalid layout: {what}")]
    InvalidLayout { what: &'static str },

    #[error(transparent)]
    Core(#[from] FaError),
}
