//! Error types for the allocation control loop.

use fa_core::FaError;
use fa_solver::SolverError;
use thiserror::Error;

/// Result type for control loop operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring or running the allocator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Allocator state does not match the geometry it was built with.
    #[error("Allocator state error: {what}")]
    StateError { what: String },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Core(#[from] FaError),
}
