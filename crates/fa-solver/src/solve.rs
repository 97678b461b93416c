//! High-level allocation interface.

use crate::bounds::resolve_pair;
use crate::config::AllocConfig;
use crate::error::{SolverError, SolverResult};
use crate::problem::AllocationProblem;
use crate::qp::{BoxEqQp, QpStatus, solve_qp};
use crate::system::EqualitySystem;
use crate::verify::verify;
use fa_core::{Axis, CONSTRAINED_AXES};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// How an allocation call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocStatus {
    /// Constrained optimum found and verified.
    Optimal,
    /// No active elements and nothing to reproduce.
    Trivial,
    /// Bounds and equalities admit no solution.
    Infeasible,
    /// Iteration cap hit before the active set settled.
    IterationLimit,
    /// Singular active set, or a candidate that failed verification.
    Numerical,
}

impl AllocStatus {
    pub fn is_success(self) -> bool {
        matches!(self, AllocStatus::Optimal | AllocStatus::Trivial)
    }
}

impl From<QpStatus> for AllocStatus {
    fn from(status: QpStatus) -> Self {
        match status {
            QpStatus::Optimal => AllocStatus::Optimal,
            QpStatus::Infeasible => AllocStatus::Infeasible,
            QpStatus::IterationLimit => AllocStatus::IterationLimit,
            QpStatus::Numerical => AllocStatus::Numerical,
        }
    }
}

impl fmt::Display for AllocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllocStatus::Optimal => "optimal",
            AllocStatus::Trivial => "trivial",
            AllocStatus::Infeasible => "infeasible",
            AllocStatus::IterationLimit => "iteration limit",
            AllocStatus::Numerical => "numerical failure",
        };
        f.write_str(s)
    }
}

/// Result of one allocation call.
///
/// On failure `forces` is an exact copy of the previous forces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    /// Force per element (length n)
    pub forces: Vec<f64>,
    pub status: AllocStatus,
    /// Diagnostic text
    pub message: String,
    /// Active-set iterations spent
    pub iterations: usize,
}

impl Allocation {
    pub fn success(&self) -> bool {
        self.status.is_success()
    }

    /// `(forces, ok, message)`.
    pub fn into_parts(self) -> (Vec<f64>, bool, String) {
        let ok = self.success();
        (self.forces, ok, self.message)
    }

    fn held(problem: &AllocationProblem<'_>, status: AllocStatus, message: String, iterations: usize) -> Self {
        warn!(%status, reason = message.as_str(), "allocation failed, holding previous forces");
        Self {
            forces: problem.previous.to_vec(),
            status,
            message,
            iterations,
        }
    }
}

/// Allocate forces for one control tick.
///
/// This function:
/// 1. Validates configuration, shapes and bounds (contract violations are `Err`)
/// 2. Builds the resultant and segment equality rows over the active elements
/// 3. Reduces them to independent rows, detecting contradictory equalities
/// 4. Solves the bounded least-distance QP around the configured reference point
/// 5. Verifies the candidate before reporting success
///
/// Infeasibility and non-convergence come back as `Ok` with a failing
/// status and the previous forces.
pub fn solve(
    problem: &AllocationProblem<'_>,
    config: Option<AllocConfig>,
) -> SolverResult<Allocation> {
    let cfg = config.unwrap_or_default();
    cfg.validate()?;
    problem.validate()?;

    let active = problem.active_indices();
    let (lower, upper) = resolve_pair(problem.lower, problem.upper, active.len())?;

    if active.is_empty() {
        return solve_without_active(problem, &cfg);
    }

    let system = EqualitySystem::assemble(problem, &active)?;
    debug!(
        elements = problem.n_elements(),
        active = active.len(),
        rows = system.n_rows(),
        "assembled allocation problem"
    );

    let reduced = match system.reduce(cfg.tolerance) {
        Ok(reduced) => reduced,
        Err(inconsistency) => {
            return Ok(Allocation::held(
                problem,
                AllocStatus::Infeasible,
                inconsistency.to_string(),
                0,
            ));
        }
    };

    let center = cfg.reference.center(problem, &active);
    let qp = BoxEqQp::new(center, reduced.matrix, reduced.rhs, lower, upper)?;
    let outcome = solve_qp(&qp, &cfg.qp_config());

    if outcome.status != QpStatus::Optimal {
        return Ok(Allocation::held(
            problem,
            outcome.status.into(),
            outcome.message,
            outcome.iterations,
        ));
    }

    let mut forces = problem.previous.to_vec();
    for (k, &i) in active.iter().enumerate() {
        forces[i] = outcome.x[k];
    }

    let check = verify(problem, &forces)?;
    if !check.is_satisfied(cfg.tolerance) {
        return Ok(Allocation::held(
            problem,
            AllocStatus::Numerical,
            format!(
                "solution failed verification: residual {:.3e}, segment spread {:.3e}, bound violation {:.3e}",
                check.resultant_residual, check.segment_spread, check.bound_violation
            ),
            outcome.iterations,
        ));
    }

    debug!(
        iterations = outcome.iterations,
        residual = check.resultant_residual,
        "allocation solved"
    );

    Ok(Allocation {
        forces,
        status: AllocStatus::Optimal,
        message: outcome.message,
        iterations: outcome.iterations,
    })
}

/// With every element retracted the resultant rows reduce to `0 = target`.
fn solve_without_active(
    problem: &AllocationProblem<'_>,
    cfg: &AllocConfig,
) -> SolverResult<Allocation> {
    if problem.target.constrained_is_zero(cfg.tolerance) {
        debug!("all elements retracted with zero target");
        return Ok(Allocation {
            forces: problem.previous.to_vec(),
            status: AllocStatus::Trivial,
            message: "all elements retracted and the enforced target is zero".to_string(),
            iterations: 0,
        });
    }

    let axis = CONSTRAINED_AXES
        .into_iter()
        .find(|a| problem.target.get(*a).abs() > cfg.tolerance)
        .unwrap_or(Axis::Fz);
    Err(SolverError::NoActiveElements {
        axis,
        value: problem.target.get(axis),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::config::ReferencePoint;
    use fa_core::Resultant;
    use fa_geometry::{ElementMount, InfluenceMatrix, Segmentation};

    fn square() -> InfluenceMatrix {
        InfluenceMatrix::from_mounts(&[
            ElementMount::axial(1.0, 1.0),
            ElementMount::axial(-1.0, 1.0),
            ElementMount::axial(-1.0, -1.0),
            ElementMount::axial(1.0, -1.0),
        ])
        .unwrap()
    }

    #[test]
    fn balanced_load_on_square() {
        let influence = square();
        let segments = Segmentation::unsegmented(4);
        let (lower, upper) = (Bounds::Scalar(0.0), Bounds::Scalar(1000.0));
        let problem = AllocationProblem {
            previous: &[0.0; 4],
            target: Resultant::axial(400.0, 0.0, 0.0),
            influence: &influence,
            segments: &segments,
            retracted: &[false; 4],
            lower: &lower,
            upper: &upper,
        };
        let alloc = solve(&problem, None).unwrap();
        assert_eq!(alloc.status, AllocStatus::Optimal);
        for f in &alloc.forces {
            assert!((f - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn moment_shifts_load_toward_positive_y() {
        let influence = square();
        let segments = Segmentation::unsegmented(4);
        let (lower, upper) = (Bounds::Scalar(0.0), Bounds::Scalar(1000.0));
        let problem = AllocationProblem {
            previous: &[0.0; 4],
            target: Resultant::axial(400.0, 40.0, 0.0),
            influence: &influence,
            segments: &segments,
            retracted: &[false; 4],
            lower: &lower,
            upper: &upper,
        };
        let alloc = solve(&problem, None).unwrap();
        assert!(alloc.success());
        // Mx = f0 + f1 - f2 - f3 = 40, symmetric split
        let expected = [110.0, 110.0, 90.0, 90.0];
        for (f, e) in alloc.forces.iter().zip(expected) {
            assert!((f - e).abs() < 1e-9, "{:?}", alloc.forces);
        }
    }

    #[test]
    fn invalid_config_is_an_error() {
        let influence = square();
        let segments = Segmentation::unsegmented(4);
        let bound = Bounds::Scalar(0.0);
        let problem = AllocationProblem {
            previous: &[0.0; 4],
            target: Resultant::zero(),
            influence: &influence,
            segments: &segments,
            retracted: &[false; 4],
            lower: &bound,
            upper: &bound,
        };
        let cfg = AllocConfig {
            tolerance: 0.0,
            reference: ReferencePoint::Previous,
            ..AllocConfig::default()
        };
        assert!(matches!(
            solve(&problem, Some(cfg)),
            Err(SolverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn into_parts_matches_fields() {
        let alloc = Allocation {
            forces: vec![1.0, 2.0],
            status: AllocStatus::Infeasible,
            message: "nope".to_string(),
            iterations: 3,
        };
        let (forces, ok, message) = alloc.into_parts();
        assert_eq!(forces, vec![1.0, 2.0]);
        assert!(!ok);
        assert_eq!(message, "nope");
    }
}
