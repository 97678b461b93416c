//! Error types for allocation.
//!
//! Only caller bugs surface as `SolverError`. Physical infeasibility and
//! non-convergence are reported through [`crate::Allocation`] instead.

use fa_core::{Axis, FaError};
use fa_geometry::GeometryError;
use thiserror::Error;

/// Contract violations detected before any numeric work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid bounds: {what}")]
    InvalidBounds { what: String },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("All elements are retracted but the target demands {axis} = {value}")]
    NoActiveElements { axis: Axis, value: f64 },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Core error: {0}")]
    Core(#[from] FaError),
}

pub type SolverResult<T> = Result<T, SolverError>;
