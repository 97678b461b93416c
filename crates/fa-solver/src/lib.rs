//! Redundant-actuator force allocation.
//!
//! Given a target resultant `[Fx, Fy, Fz, Mx, My, Mz]` and n force-producing
//! elements with a known 6×n influence matrix, computes per-element forces
//! that reproduce the enforced components (Fz, Mx, My) exactly, respect
//! per-element bounds, drive every fully active segment at one common force,
//! and stay as close as possible to a reference assignment.
//!
//! The solver is a pure function of its inputs. On infeasibility or
//! non-convergence it hands back the previous forces with a diagnostic so the
//! caller can hold its last good allocation.

pub mod batch;
pub mod bounds;
pub mod config;
pub mod error;
pub mod problem;
pub mod qp;
pub mod solve;
pub mod system;
pub mod verify;

pub use batch::solve_batch;
pub use bounds::Bounds;
pub use config::{AllocConfig, ReferencePoint};
pub use error::{SolverError, SolverResult};
pub use problem::AllocationProblem;
pub use qp::{BoxEqQp, QpConfig, QpOutcome, QpStatus, solve_qp};
pub use solve::{AllocStatus, Allocation, solve};
pub use system::{EqualitySystem, Inconsistency, ReducedSystem, RowKind};
pub use verify::{Verification, verify};
