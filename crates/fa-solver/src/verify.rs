//! Post-solve checks of an allocation against its problem.

use crate::bounds::resolve_pair;
use crate::error::SolverResult;
use crate::problem::AllocationProblem;
use fa_core::{CONSTRAINED_AXES, ensure_len};
use serde::Serialize;

/// How far a force vector is from satisfying a problem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    /// Largest |achieved − target| over Fz, Mx, My, active columns only
    pub resultant_residual: f64,
    /// Magnitude the residual is judged against
    pub resultant_scale: f64,
    /// Largest max−min force inside a coupled segment
    pub segment_spread: f64,
    /// Largest distance of an active force outside its bounds
    pub bound_violation: f64,
    /// Largest active |force|
    pub force_scale: f64,
}

impl Verification {
    pub fn is_satisfied(&self, tolerance: f64) -> bool {
        self.resultant_residual <= tolerance * (1.0 + self.resultant_scale)
            && self.segment_spread <= tolerance * (1.0 + self.force_scale)
            && self.bound_violation <= tolerance * (1.0 + self.force_scale)
    }
}

pub fn verify(problem: &AllocationProblem<'_>, forces: &[f64]) -> SolverResult<Verification> {
    problem.validate()?;
    ensure_len(forces, problem.n_elements(), "force vector")?;

    let active = problem.active_indices();
    let (lower, upper) = resolve_pair(problem.lower, problem.upper, active.len())?;

    let mut resultant_residual: f64 = 0.0;
    let mut resultant_scale: f64 = 0.0;
    for axis in CONSTRAINED_AXES {
        let target = problem.target.get(axis);
        let mut achieved = 0.0;
        let mut magnitude = target.abs();
        for &i in &active {
            let coeff = problem.influence.entry(axis, i);
            achieved += coeff * forces[i];
            magnitude += coeff.abs() * (1.0 + forces[i].abs());
        }
        resultant_residual = resultant_residual.max((achieved - target).abs());
        resultant_scale = resultant_scale.max(magnitude);
    }

    let mut segment_spread: f64 = 0.0;
    for group in problem.segments.coupled_groups(problem.retracted)? {
        let values = group.iter().map(|&i| forces[i]);
        let hi = values.clone().fold(f64::NEG_INFINITY, f64::max);
        let lo = values.fold(f64::INFINITY, f64::min);
        segment_spread = segment_spread.max(hi - lo);
    }

    let mut bound_violation: f64 = 0.0;
    let mut force_scale: f64 = 0.0;
    for (k, &i) in active.iter().enumerate() {
        let f = forces[i];
        bound_violation = bound_violation.max(lower[k] - f).max(f - upper[k]);
        force_scale = force_scale.max(f.abs());
    }

    Ok(Verification {
        resultant_residual,
        resultant_scale,
        segment_spread,
        bound_violation,
        force_scale,
    })
}
