//! Stateful allocation loop.
//!
//! The allocator owns the geometry and the last good force vector. Every
//! control tick feeds the stored forces back in as the previous forces and
//! keeps them when the solver cannot satisfy the new target (last-good hold).

use crate::command::ThrustCommand;
use crate::error::{ControlError, ControlResult};
use fa_core::{Resultant, ensure_all_finite, ensure_len};
use fa_geometry::{InfluenceMatrix, Segmentation};
use fa_solver::{AllocConfig, AllocStatus, AllocationProblem, Bounds, solve};
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of one control tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub status: AllocStatus,
    /// True when the stored forces were kept unchanged
    pub held: bool,
    pub message: String,
    pub iterations: usize,
    /// Holds in a row, including this one
    pub consecutive_holds: usize,
}

/// Force allocator for a fixed element layout.
#[derive(Debug, Clone)]
pub struct Allocator {
    influence: InfluenceMatrix,
    segments: Segmentation,
    /// Scalar or full-length (n) bounds
    lower: Bounds,
    upper: Bounds,
    config: AllocConfig,
    forces: Vec<f64>,
    consecutive_holds: usize,
}

impl Allocator {
    /// Create an allocator.
    ///
    /// `lower` and `upper` are either scalars or one entry per element; they
    /// are narrowed to the active elements on each tick.
    ///
    /// # Errors
    ///
    /// Returns error if segment labels, bounds or the initial forces do not
    /// have one entry per influence column, or the initial forces are not finite.
    pub fn new(
        influence: InfluenceMatrix,
        segments: Segmentation,
        lower: Bounds,
        upper: Bounds,
        initial: Vec<f64>,
    ) -> ControlResult<Self> {
        let n = influence.n_elements();
        ensure_len(segments.labels(), n, "segment labels")?;
        ensure_len(&initial, n, "initial forces")?;
        ensure_all_finite(&initial, "initial force")?;
        for bounds in [&lower, &upper] {
            if let Bounds::PerElement(values) = bounds {
                ensure_len(values, n, "full-length bounds")?;
            }
        }
        Ok(Self {
            influence,
            segments,
            lower,
            upper,
            config: AllocConfig::default(),
            forces: initial,
            consecutive_holds: 0,
        })
    }

    /// Replace the solver configuration.
    pub fn with_config(mut self, config: AllocConfig) -> ControlResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn n_elements(&self) -> usize {
        self.influence.n_elements()
    }

    /// Last good force vector.
    pub fn forces(&self) -> &[f64] {
        &self.forces
    }

    pub fn influence(&self) -> &InfluenceMatrix {
        &self.influence
    }

    pub fn consecutive_holds(&self) -> usize {
        self.consecutive_holds
    }

    /// Run one allocation for `target` with the given retraction mask.
    ///
    /// Solver failures (infeasible, non-converged) keep the stored forces and
    /// are reported in the [`TickReport`]. Contract violations are returned
    /// as errors and leave the allocator untouched.
    pub fn tick(&mut self, target: Resultant, retracted: &[bool]) -> ControlResult<TickReport> {
        if retracted.len() != self.n_elements() {
            return Err(ControlError::StateError {
                what: format!(
                    "retraction mask has {} entries for {} elements",
                    retracted.len(),
                    self.n_elements()
                ),
            });
        }

        let lower = self.lower.restrict_to_active(retracted)?;
        let upper = self.upper.restrict_to_active(retracted)?;
        let problem = AllocationProblem {
            previous: &self.forces,
            target,
            influence: &self.influence,
            segments: &self.segments,
            retracted,
            lower: &lower,
            upper: &upper,
        };
        let alloc = solve(&problem, Some(self.config))?;

        let held = !alloc.success();
        if held {
            self.consecutive_holds += 1;
            warn!(
                status = %alloc.status,
                consecutive_holds = self.consecutive_holds,
                "holding last good forces"
            );
        } else {
            self.consecutive_holds = 0;
            self.forces = alloc.forces;
            debug!(iterations = alloc.iterations, "forces updated");
        }

        Ok(TickReport {
            status: alloc.status,
            held,
            message: alloc.message,
            iterations: alloc.iterations,
            consecutive_holds: self.consecutive_holds,
        })
    }

    /// Operator-facing tick: thrust at a point of application.
    pub fn command(&mut self, cmd: &ThrustCommand, retracted: &[bool]) -> ControlResult<TickReport> {
        let target = cmd.target()?;
        self.tick(target, retracted)
    }
}
