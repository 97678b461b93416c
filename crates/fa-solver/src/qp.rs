//! Bounded, equality-constrained least-distance QP.
//!
//! Solves
//!
//! ```text
//! minimise   ½‖x − c‖²
//! subject to A x = b,   l ≤ x ≤ u
//! ```
//!
//! with a dual active-set method in the style of Goldfarb & Idnani. The
//! iteration starts at the unconstrained minimum `x = c`, adds every equality
//! row, then repeatedly adds the most violated bound. Each addition keeps the
//! KKT stationarity `x − c = N·λ` over the active normals `N`; a constraint
//! whose multiplier would turn negative is dropped on the way. A violated
//! bound that is linearly dependent on the active set with nothing left to
//! drop proves the problem infeasible.
//!
//! `A` is expected to have independent rows (see
//! [`crate::EqualitySystem::reduce`]).

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Step directions shorter than this are treated as zero.
const DEPENDENCE_TOL: f64 = 1e-10;

/// Dual components at or below this do not block a step.
const DUAL_TOL: f64 = 1e-12;

/// Bound violations are resolved this much tighter than `tolerance`, so the
/// final clip onto the box stays inside the equality tolerance.
const BOUND_TOL_SCALE: f64 = 1e-3;

/// QP solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QpConfig {
    /// Maximum active-set changes (additions and drops)
    pub max_iterations: usize,
    /// Relative feasibility tolerance
    pub tolerance: f64,
}

impl Default for QpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-9,
        }
    }
}

/// Termination state of [`solve_qp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus {
    Optimal,
    Infeasible,
    IterationLimit,
    Numerical,
}

/// QP iteration result.
#[derive(Debug, Clone, PartialEq)]
pub struct QpOutcome {
    /// Last iterate; the minimiser when `status == Optimal`
    pub x: DVector<f64>,
    pub status: QpStatus,
    /// Number of active-set changes performed
    pub iterations: usize,
    pub message: String,
}

/// Problem data. Build with [`BoxEqQp::new`] to get the shapes checked.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxEqQp {
    pub center: DVector<f64>,
    pub eq_matrix: DMatrix<f64>,
    pub eq_rhs: DVector<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Constraint {
    /// Row of `A`; `flipped` stores it as `-a·x >= -b` instead of `a·x >= b`.
    Equality { row: usize, flipped: bool },
    Lower(usize),
    Upper(usize),
}

impl Constraint {
    fn is_equality(self) -> bool {
        matches!(self, Constraint::Equality { .. })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equality { row, .. } => write!(f, "equality row {row}"),
            Constraint::Lower(k) => write!(f, "lower bound of variable {k}"),
            Constraint::Upper(k) => write!(f, "upper bound of variable {k}"),
        }
    }
}

impl BoxEqQp {
    pub fn new(
        center: DVector<f64>,
        eq_matrix: DMatrix<f64>,
        eq_rhs: DVector<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> SolverResult<Self> {
        let n = center.len();
        if eq_matrix.ncols() != n || eq_matrix.nrows() != eq_rhs.len() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "equality system is {}x{} with {} right-hand sides for {} variables",
                    eq_matrix.nrows(),
                    eq_matrix.ncols(),
                    eq_rhs.len(),
                    n
                ),
            });
        }
        if lower.len() != n || upper.len() != n {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "bounds have {}/{} entries for {} variables",
                    lower.len(),
                    upper.len(),
                    n
                ),
            });
        }
        let empty = |k: &usize| lower[*k].is_nan() || upper[*k].is_nan() || lower[*k] > upper[*k];
        if let Some(k) = (0..n).find(empty) {
            return Err(SolverError::ProblemSetup {
                what: format!("variable {k} has empty bound interval"),
            });
        }
        Ok(Self {
            center,
            eq_matrix,
            eq_rhs,
            lower,
            upper,
        })
    }

    pub fn dim(&self) -> usize {
        self.center.len()
    }

    fn normal(&self, c: Constraint) -> DVector<f64> {
        match c {
            Constraint::Equality { row, flipped } => {
                let a: DVector<f64> = self.eq_matrix.row(row).transpose();
                if flipped { -a } else { a }
            }
            Constraint::Lower(k) => {
                let mut e = DVector::zeros(self.dim());
                e[k] = 1.0;
                e
            }
            Constraint::Upper(k) => {
                let mut e = DVector::zeros(self.dim());
                e[k] = -1.0;
                e
            }
        }
    }

    /// `n·x − b` for the constraint in `>=` form; negative means violated.
    fn slack(&self, c: Constraint, x: &DVector<f64>) -> f64 {
        match c {
            Constraint::Equality { row, flipped } => {
                let s = self.eq_matrix.row(row).transpose().dot(x) - self.eq_rhs[row];
                if flipped { -s } else { s }
            }
            Constraint::Lower(k) => x[k] - self.lower[k],
            Constraint::Upper(k) => self.upper[k] - x[k],
        }
    }

    fn most_violated(&self, x: &DVector<f64>, active: &[Constraint], tol: f64) -> Option<Constraint> {
        let mut worst: Option<(Constraint, f64)> = None;
        for k in 0..self.dim() {
            for (c, bound) in [
                (Constraint::Lower(k), self.lower[k]),
                (Constraint::Upper(k), self.upper[k]),
            ] {
                if active.contains(&c) {
                    continue;
                }
                let s = self.slack(c, x);
                let threshold = tol * BOUND_TOL_SCALE * (1.0 + bound.abs());
                if s < -threshold && worst.is_none_or(|(_, w)| s < w) {
                    worst = Some((c, s));
                }
            }
        }
        worst.map(|(c, _)| c)
    }

    /// Primal direction `z` (component of `np` orthogonal to the active
    /// normals) and dual direction `r` (coordinates of `np` in them).
    fn step_directions(
        &self,
        active: &[Constraint],
        np: &DVector<f64>,
    ) -> Option<(DVector<f64>, DVector<f64>)> {
        if active.is_empty() {
            return Some((np.clone(), DVector::zeros(0)));
        }
        let columns: Vec<DVector<f64>> = active.iter().map(|c| self.normal(*c)).collect();
        let qr = DMatrix::from_columns(&columns).qr();
        let q = qr.q();
        let r = qr.r();
        if r.diagonal().iter().any(|d| d.abs() <= DEPENDENCE_TOL) {
            return None;
        }
        let coords = q.transpose() * np;
        let z = np - &q * &coords;
        let dual = r.solve_upper_triangular(&coords)?;
        Some((z, dual))
    }
}

impl QpOutcome {
    fn optimal(qp: &BoxEqQp, mut x: DVector<f64>, active: &[Constraint], iterations: usize) -> Self {
        let mut bounds_active = 0;
        for c in active {
            match *c {
                Constraint::Lower(k) => {
                    x[k] = qp.lower[k];
                    bounds_active += 1;
                }
                Constraint::Upper(k) => {
                    x[k] = qp.upper[k];
                    bounds_active += 1;
                }
                Constraint::Equality { .. } => {}
            }
        }
        for k in 0..qp.dim() {
            x[k] = x[k].clamp(qp.lower[k], qp.upper[k]);
        }
        Self {
            x,
            status: QpStatus::Optimal,
            iterations,
            message: format!(
                "optimal after {iterations} iterations with {bounds_active} active bounds"
            ),
        }
    }

    fn failed(x: DVector<f64>, status: QpStatus, iterations: usize, message: String) -> Self {
        Self {
            x,
            status,
            iterations,
            message,
        }
    }
}

/// Solve the QP. Never panics on infeasible or ill-conditioned data; the
/// outcome status says what happened.
pub fn solve_qp(qp: &BoxEqQp, config: &QpConfig) -> QpOutcome {
    let mut x = qp.center.clone();
    let mut active: Vec<Constraint> = Vec::new();
    let mut multipliers: Vec<f64> = Vec::new();
    let mut iterations = 0;
    let mut next_equality = 0;

    loop {
        // Equalities first, in row order; then the most violated bound.
        let p = if next_equality < qp.eq_matrix.nrows() {
            let row = next_equality;
            next_equality += 1;
            let s = qp.slack(Constraint::Equality { row, flipped: false }, &x);
            Constraint::Equality { row, flipped: s > 0.0 }
        } else {
            match qp.most_violated(&x, &active, config.tolerance) {
                Some(c) => c,
                None => return QpOutcome::optimal(qp, x, &active, iterations),
            }
        };

        let np = qp.normal(p);
        let mut u_p = 0.0;

        loop {
            if iterations >= config.max_iterations {
                return QpOutcome::failed(
                    x,
                    QpStatus::IterationLimit,
                    iterations,
                    format!(
                        "iteration limit {} reached while adding {p}",
                        config.max_iterations
                    ),
                );
            }
            iterations += 1;

            let Some((z, r)) = qp.step_directions(&active, &np) else {
                return QpOutcome::failed(
                    x,
                    QpStatus::Numerical,
                    iterations,
                    format!("active set became singular while adding {p}"),
                );
            };

            // Dual step length: first inequality multiplier to reach zero.
            let mut t_dual = f64::INFINITY;
            let mut blocking = None;
            for (j, c) in active.iter().enumerate() {
                if c.is_equality() || r[j] <= DUAL_TOL {
                    continue;
                }
                let ratio = multipliers[j] / r[j];
                if ratio < t_dual {
                    t_dual = ratio;
                    blocking = Some(j);
                }
            }

            // Primal step length: until p becomes tight.
            let t_primal = if z.norm() <= DEPENDENCE_TOL {
                f64::INFINITY
            } else {
                (-qp.slack(p, &x) / z.dot(&np)).max(0.0)
            };

            let t = t_dual.min(t_primal);
            if t.is_infinite() {
                return QpOutcome::failed(
                    x,
                    QpStatus::Infeasible,
                    iterations,
                    format!(
                        "{p} cannot be satisfied together with the equality constraints \
                         and the active bounds"
                    ),
                );
            }

            for (u, rj) in multipliers.iter_mut().zip(r.iter()) {
                *u -= t * rj;
            }
            u_p += t;
            if t_primal.is_finite() {
                x.axpy(t, &z, 1.0);
            }

            if t_primal <= t_dual {
                active.push(p);
                multipliers.push(u_p);
                break;
            }
            if let Some(j) = blocking {
                active.remove(j);
                multipliers.remove(j);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qp(center: &[f64], rows: &[&[f64]], rhs: &[f64], lower: f64, upper: f64) -> BoxEqQp {
        let n = center.len();
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        BoxEqQp::new(
            DVector::from_column_slice(center),
            DMatrix::from_row_slice(rows.len(), n, &data),
            DVector::from_column_slice(rhs),
            vec![lower; n],
            vec![upper; n],
        )
        .unwrap()
    }

    fn assert_close(x: &DVector<f64>, expected: &[f64]) {
        for (a, b) in x.iter().zip(expected) {
            assert!((a - b).abs() < 1e-9, "{x} != {expected:?}");
        }
    }

    #[test]
    fn unconstrained_returns_center() {
        let out = solve_qp(&qp(&[1.0, -2.0], &[], &[], -10.0, 10.0), &QpConfig::default());
        assert_eq!(out.status, QpStatus::Optimal);
        assert_eq!(out.iterations, 0);
        assert_close(&out.x, &[1.0, -2.0]);
    }

    #[test]
    fn equality_projection() {
        let out = solve_qp(
            &qp(&[0.0, 0.0, 0.0], &[&[1.0, 1.0, 1.0]], &[3.0], -10.0, 10.0),
            &QpConfig::default(),
        );
        assert_eq!(out.status, QpStatus::Optimal);
        assert_close(&out.x, &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn bounds_clip_center() {
        let out = solve_qp(&qp(&[5.0, -5.0], &[], &[], 0.0, 1.0), &QpConfig::default());
        assert_eq!(out.status, QpStatus::Optimal);
        assert_eq!(out.x.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn equality_with_active_upper_bound() {
        // projection would give (8/3, -1/3, -1/3); x0 pinned at 1.5
        let out = solve_qp(
            &qp(&[3.0, 0.0, 0.0], &[&[1.0, 1.0, 1.0]], &[2.0], 0.0, 1.5),
            &QpConfig::default(),
        );
        assert_eq!(out.status, QpStatus::Optimal);
        assert_close(&out.x, &[1.5, 0.25, 0.25]);
    }

    #[test]
    fn lower_bound_pins_variable() {
        // projection onto the equality alone gives (-0.5, 3.5)
        let out = solve_qp(
            &qp(&[-5.0, -1.0], &[&[1.0, 1.0]], &[3.0], 0.0, 10.0),
            &QpConfig::default(),
        );
        assert_eq!(out.status, QpStatus::Optimal);
        assert_close(&out.x, &[0.0, 3.0]);
    }

    #[test]
    fn infeasible_sum_exceeds_box() {
        let out = solve_qp(
            &qp(&[0.0; 3], &[&[1.0, 1.0, 1.0]], &[10.0], 0.0, 1.0),
            &QpConfig::default(),
        );
        assert_eq!(out.status, QpStatus::Infeasible);
        assert!(out.message.contains("cannot be satisfied"));
    }

    #[test]
    fn iteration_limit_reported() {
        let config = QpConfig {
            max_iterations: 1,
            ..QpConfig::default()
        };
        let out = solve_qp(&qp(&[3.0, 0.0, 0.0], &[&[1.0, 1.0, 1.0]], &[2.0], 0.0, 1.5), &config);
        assert_eq!(out.status, QpStatus::IterationLimit);
        assert_eq!(out.iterations, 1);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = BoxEqQp::new(
            DVector::zeros(2),
            DMatrix::zeros(1, 3),
            DVector::zeros(1),
            vec![0.0; 2],
            vec![1.0; 2],
        );
        assert!(err.is_err());
    }
}
