//! Problem definition for one allocation call.

use crate::bounds::Bounds;
use crate::error::{SolverError, SolverResult};
use fa_core::{Resultant, ensure_all_finite};
use fa_geometry::{InfluenceMatrix, Segmentation};

/// Inputs of a single allocation.
///
/// Everything is borrowed; the solver never mutates it. Retracted elements
/// are left out of the resultant rows entirely, so the caller must make sure
/// their physical contribution is zero or already folded into `target`.
#[derive(Debug, Clone, Copy)]
pub struct AllocationProblem<'a> {
    /// Previous force per element (length n)
    pub previous: &'a [f64],

    /// Demanded resultant; only Fz, Mx, My are enforced
    pub target: Resultant,

    /// 6×n influence matrix
    pub influence: &'a InfluenceMatrix,

    /// Segment label per element
    pub segments: &'a Segmentation,

    /// Retraction mask (true = excluded from optimization)
    pub retracted: &'a [bool],

    /// Lower force bound for the active elements
    pub lower: &'a Bounds,

    /// Upper force bound for the active elements
    pub upper: &'a Bounds,
}

impl<'a> AllocationProblem<'a> {
    pub fn n_elements(&self) -> usize {
        self.previous.len()
    }

    /// Indices of the elements that take part in the optimization.
    pub fn active_indices(&self) -> Vec<usize> {
        self.retracted
            .iter()
            .enumerate()
            .filter(|(_, r)| !**r)
            .map(|(i, _)| i)
            .collect()
    }

    /// Validate shapes and finiteness.
    pub fn validate(&self) -> SolverResult<()> {
        let n = self.n_elements();

        if self.influence.n_elements() != n {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "influence matrix has {} columns but {} elements",
                    self.influence.n_elements(),
                    n
                ),
            });
        }
        if self.segments.len() != n {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "segmentation has {} labels but {} elements",
                    self.segments.len(),
                    n
                ),
            });
        }
        if self.retracted.len() != n {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "retraction mask has {} entries but {} elements",
                    self.retracted.len(),
                    n
                ),
            });
        }

        ensure_all_finite(self.previous, "previous force")?;
        self.target.ensure_finite()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fa_geometry::ElementMount;

    struct Fixture {
        previous: Vec<f64>,
        influence: InfluenceMatrix,
        segments: Segmentation,
        retracted: Vec<bool>,
        bound: Bounds,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            Self {
                previous: vec![0.0; n],
                influence: InfluenceMatrix::from_mounts(&ElementMount::ring(n, 1.0)).unwrap(),
                segments: Segmentation::unsegmented(n),
                retracted: vec![false; n],
                bound: Bounds::Scalar(0.0),
            }
        }

        fn problem(&self) -> AllocationProblem<'_> {
            AllocationProblem {
                previous: &self.previous,
                target: Resultant::zero(),
                influence: &self.influence,
                segments: &self.segments,
                retracted: &self.retracted,
                lower: &self.bound,
                upper: &self.bound,
            }
        }
    }

    #[test]
    fn consistent_shapes_validate() {
        let fx = Fixture::new(4);
        assert!(fx.problem().validate().is_ok());
    }

    #[test]
    fn influence_column_mismatch() {
        let mut fx = Fixture::new(4);
        fx.influence = InfluenceMatrix::from_mounts(&ElementMount::ring(5, 1.0)).unwrap();
        let err = fx.problem().validate().unwrap_err();
        assert!(format!("{err}").contains("5 columns but 4 elements"));
    }

    #[test]
    fn segment_and_mask_mismatch() {
        let mut fx = Fixture::new(4);
        fx.segments = Segmentation::unsegmented(3);
        assert!(fx.problem().validate().is_err());

        let mut fx = Fixture::new(4);
        fx.retracted = vec![false; 5];
        assert!(fx.problem().validate().is_err());
    }

    #[test]
    fn non_finite_inputs_rejected() {
        let mut fx = Fixture::new(3);
        fx.previous[1] = f64::NAN;
        assert!(matches!(
            fx.problem().validate(),
            Err(SolverError::Core(_))
        ));

        let fx = Fixture::new(3);
        let mut problem = fx.problem();
        problem.target = Resultant::axial(f64::INFINITY, 0.0, 0.0);
        assert!(problem.validate().is_err());
    }

    #[test]
    fn active_indices_skip_retracted() {
        let mut fx = Fixture::new(4);
        fx.retracted = vec![true, false, true, false];
        assert_eq!(fx.problem().active_indices(), vec![1, 3]);
    }
}
