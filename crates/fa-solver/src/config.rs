//! Solver configuration.

use crate::error::{SolverError, SolverResult};
use crate::problem::AllocationProblem;
use crate::qp::QpConfig;
use fa_core::Axis;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Centre of the quadratic penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePoint {
    /// Target axial force split evenly over the active elements.
    #[default]
    EqualShare,
    /// The caller's previous forces at the active positions.
    Previous,
}

impl ReferencePoint {
    /// Penalty centre for the active sub-vector.
    pub fn center(self, problem: &AllocationProblem<'_>, active: &[usize]) -> DVector<f64> {
        match self {
            ReferencePoint::EqualShare => {
                let share = problem.target.get(Axis::Fz) / active.len() as f64;
                DVector::from_element(active.len(), share)
            }
            ReferencePoint::Previous => {
                DVector::from_iterator(active.len(), active.iter().map(|&i| problem.previous[i]))
            }
        }
    }
}

/// Allocation solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocConfig {
    /// Maximum active-set iterations before giving up.
    ///
    /// Adding each independent equality row costs one iteration, so a cap
    /// below the number of resultant and segment rows can never succeed.
    pub max_iterations: usize,
    /// Relative tolerance on the equality residual and bound violations
    pub tolerance: f64,
    /// Centre of the minimum-deviation objective
    pub reference: ReferencePoint,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-9,
            reference: ReferencePoint::EqualShare,
        }
    }
}

impl AllocConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidConfig {
                what: "max_iterations must be positive",
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "tolerance must be positive and finite",
            });
        }
        Ok(())
    }

    pub fn qp_config(&self) -> QpConfig {
        QpConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}
