//! Error types for the command line front end.

use fa_control::ControlError;
use fa_core::FaError;
use fa_geometry::GeometryError;
use fa_solver::SolverError;
use std::path::PathBuf;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read case file: {path}")]
    CaseFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Case parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid case: {0}")]
    InvalidCase(String),

    #[error(transparent)]
    Core(#[from] FaError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}
