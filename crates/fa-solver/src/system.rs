//! Equality constraint assembly.
//!
//! Rows act on the active sub-vector only: first the enforced resultant
//! components (Fz, Mx, My), then one `x[ref] - x[member] = 0` row per extra
//! member of every fully active segment.

use crate::error::SolverResult;
use crate::problem::AllocationProblem;
use fa_core::{Axis, CONSTRAINED_AXES};
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Rows whose remainder after projection falls below this fraction of their
/// own norm are linearly dependent on the rows above them.
const RANK_TOL: f64 = 1e-10;

/// Origin of an equality row, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Resultant(Axis),
    /// `force[reference] == force[member]`, full-vector element indices.
    Segment { reference: usize, member: usize },
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Resultant(axis) => write!(f, "resultant {axis}"),
            RowKind::Segment { reference, member } => {
                write!(f, "segment equality f[{reference}] = f[{member}]")
            }
        }
    }
}

/// `A x = b` over the active elements.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualitySystem {
    pub matrix: DMatrix<f64>,
    pub rhs: DVector<f64>,
    pub rows: Vec<RowKind>,
}

/// Independent, orthonormal rows spanning the same affine set.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSystem {
    pub matrix: DMatrix<f64>,
    pub rhs: DVector<f64>,
    /// Consistent rows dropped as redundant
    pub dropped: usize,
}

/// A dependent row whose right-hand side disagrees with the rows it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Inconsistency {
    pub row: RowKind,
    pub mismatch: f64,
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contradicts the preceding equality constraints (mismatch {:.3e})",
            self.row, self.mismatch
        )
    }
}

impl EqualitySystem {
    /// Build the stacked resultant + segment system for `active` elements.
    pub fn assemble(problem: &AllocationProblem<'_>, active: &[usize]) -> SolverResult<Self> {
        let mut position = vec![None; problem.n_elements()];
        for (col, &i) in active.iter().enumerate() {
            position[i] = Some(col);
        }

        let groups = problem.segments.coupled_groups(problem.retracted)?;
        let segment_rows: usize = groups.iter().map(|g| g.len() - 1).sum();
        let n_rows = CONSTRAINED_AXES.len() + segment_rows;

        let mut matrix = DMatrix::zeros(n_rows, active.len());
        let mut rhs = DVector::zeros(n_rows);
        let mut rows = Vec::with_capacity(n_rows);

        for (r, axis) in CONSTRAINED_AXES.iter().enumerate() {
            for (col, &i) in active.iter().enumerate() {
                matrix[(r, col)] = problem.influence.entry(*axis, i);
            }
            rhs[r] = problem.target.get(*axis);
            rows.push(RowKind::Resultant(*axis));
        }

        let mut r = CONSTRAINED_AXES.len();
        for group in &groups {
            let reference = group[0];
            for &member in &group[1..] {
                // coupled groups only contain active elements
                if let (Some(a), Some(b)) = (position[reference], position[member]) {
                    matrix[(r, a)] = 1.0;
                    matrix[(r, b)] = -1.0;
                }
                rows.push(RowKind::Segment { reference, member });
                r += 1;
            }
        }

        Ok(Self { matrix, rhs, rows })
    }

    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_vars(&self) -> usize {
        self.matrix.ncols()
    }

    /// Orthonormalise the rows (modified Gram-Schmidt, two passes), carrying
    /// the right-hand side through the same combinations.
    ///
    /// Redundant rows that agree with the rest are dropped; a redundant row
    /// whose right-hand side disagrees by more than `tolerance` (relative)
    /// makes the system inconsistent.
    pub fn reduce(&self, tolerance: f64) -> Result<ReducedSystem, Inconsistency> {
        let mut basis: Vec<(DVector<f64>, f64)> = Vec::with_capacity(self.n_rows());
        let mut dropped = 0;

        for i in 0..self.n_rows() {
            let a: DVector<f64> = self.matrix.row(i).transpose();
            let a_norm = a.norm();
            let mut v = a;
            let mut beta = self.rhs[i];
            let mut scale = 1.0 + beta.abs();

            for _pass in 0..2 {
                for (q, q_rhs) in &basis {
                    let d = q.dot(&v);
                    v.axpy(-d, q, 1.0);
                    beta -= d * q_rhs;
                    scale += (d * q_rhs).abs();
                }
            }

            let v_norm = v.norm();
            if v_norm <= RANK_TOL * a_norm {
                if beta.abs() > tolerance * scale {
                    return Err(Inconsistency {
                        row: self.rows[i],
                        mismatch: beta,
                    });
                }
                dropped += 1;
                continue;
            }
            basis.push((v / v_norm, beta / v_norm));
        }

        let mut matrix = DMatrix::zeros(basis.len(), self.n_vars());
        let mut rhs = DVector::zeros(basis.len());
        for (r, (q, q_rhs)) in basis.iter().enumerate() {
            matrix.set_row(r, &q.transpose());
            rhs[r] = *q_rhs;
        }

        Ok(ReducedSystem {
            matrix,
            rhs,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use fa_core::Resultant;
    use fa_geometry::{ElementMount, InfluenceMatrix, Segmentation};

    fn axial_square() -> InfluenceMatrix {
        InfluenceMatrix::from_mounts(&[
            ElementMount::axial(1.0, 1.0),
            ElementMount::axial(-1.0, 1.0),
            ElementMount::axial(-1.0, -1.0),
            ElementMount::axial(1.0, -1.0),
        ])
        .unwrap()
    }

    fn assemble(
        influence: &InfluenceMatrix,
        segments: &Segmentation,
        retracted: &[bool],
        target: Resultant,
    ) -> EqualitySystem {
        let previous = vec![0.0; retracted.len()];
        let bound = Bounds::Scalar(0.0);
        let problem = AllocationProblem {
            previous: &previous,
            target,
            influence,
            segments,
            retracted,
            lower: &bound,
            upper: &bound,
        };
        EqualitySystem::assemble(&problem, &problem.active_indices()).unwrap()
    }

    #[test]
    fn resultant_rows_restricted_to_active_columns() {
        let j = axial_square();
        let sys = assemble(
            &j,
            &Segmentation::unsegmented(4),
            &[false, true, false, false],
            Resultant::axial(100.0, 5.0, -5.0),
        );
        assert_eq!(sys.n_rows(), 3);
        assert_eq!(sys.n_vars(), 3);
        // Mx row = y of elements 0, 2, 3
        assert_eq!(sys.matrix.row(1).iter().copied().collect::<Vec<_>>(), vec![1.0, -1.0, -1.0]);
        assert_eq!(sys.rhs.as_slice(), &[100.0, 5.0, -5.0]);
    }

    #[test]
    fn segment_rows_reference_first_member() {
        let j = axial_square();
        let sys = assemble(
            &j,
            &Segmentation::new(vec![1, 2, 1, 1]),
            &[false; 4],
            Resultant::zero(),
        );
        assert_eq!(sys.n_rows(), 5);
        assert_eq!(
            sys.rows[3..],
            [
                RowKind::Segment { reference: 0, member: 2 },
                RowKind::Segment { reference: 0, member: 3 },
            ]
        );
        assert_eq!(sys.matrix.row(4).iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0, 0.0, -1.0]);
        assert_eq!(sys.rhs[4], 0.0);
    }

    #[test]
    fn retracted_member_removes_segment_rows() {
        let j = axial_square();
        let sys = assemble(
            &j,
            &Segmentation::new(vec![1, 1, 2, 2]),
            &[false, false, true, false],
            Resultant::zero(),
        );
        assert_eq!(sys.n_rows(), 4);
        // element 3 is now column 2
        assert_eq!(sys.matrix.row(3).iter().copied().collect::<Vec<_>>(), vec![1.0, -1.0, 0.0]);
    }

    #[test]
    fn reduce_drops_zero_rows_with_zero_rhs() {
        let mut rows = vec![vec![0.0; 4]; 6];
        rows[2] = vec![1.0; 4];
        let j = InfluenceMatrix::from_rows(&rows).unwrap();
        let sys = assemble(&j, &Segmentation::unsegmented(4), &[false; 4], Resultant::axial(100.0, 0.0, 0.0));
        let reduced = sys.reduce(1e-9).unwrap();
        assert_eq!(reduced.matrix.nrows(), 1);
        assert_eq!(reduced.dropped, 2);
        // row normalised: 0.5 * sum(x) = 50
        assert!((reduced.rhs[0] - 50.0).abs() < 1e-12);
    }

    #[test]
    fn reduce_detects_contradiction() {
        let mut rows = vec![vec![0.0; 2]; 6];
        rows[2] = vec![1.0, 1.0];
        let j = InfluenceMatrix::from_rows(&rows).unwrap();
        let sys = assemble(&j, &Segmentation::unsegmented(2), &[false; 2], Resultant::axial(10.0, 3.0, 0.0));
        let err = sys.reduce(1e-9).unwrap_err();
        assert_eq!(err.row, RowKind::Resultant(Axis::Mx));
        assert!(format!("{err}").contains("resultant Mx"));
    }

    #[test]
    fn reduce_keeps_consistent_redundant_segment() {
        // mirrored pair coupled in one segment
        let j = InfluenceMatrix::from_mounts(&[ElementMount::axial(1.0, 0.0), ElementMount::axial(-1.0, 0.0)])
            .unwrap();
        let sys = assemble(&j, &Segmentation::new(vec![1, 1]), &[false; 2], Resultant::axial(10.0, 0.0, 0.0));
        // rows: Fz=[1,1], Mx=[0,0], My=[-1,1], seg=[1,-1] -> seg is -My and both rhs are zero
        let reduced = sys.reduce(1e-9).unwrap();
        assert_eq!(reduced.matrix.nrows(), 2);
        assert_eq!(reduced.dropped, 2);
    }
}
