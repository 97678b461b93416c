//! Parallel solving of independent allocation problems.

use crate::config::AllocConfig;
use crate::error::SolverResult;
use crate::problem::AllocationProblem;
use crate::solve::{Allocation, solve};
use rayon::prelude::*;

/// Solve every problem with the same configuration, in parallel.
///
/// Results are in input order and identical to calling [`solve`] on each
/// problem; the solver shares no state between calls.
pub fn solve_batch(
    problems: &[AllocationProblem<'_>],
    config: Option<AllocConfig>,
) -> Vec<SolverResult<Allocation>> {
    let cfg = config.unwrap_or_default();
    problems
        .par_iter()
        .map(|problem| solve(problem, Some(cfg)))
        .collect()
}
