//! Element geometry for force allocation.
//!
//! Turns the mounting layout of force-producing elements into the 6×n
//! influence matrix consumed by the solver, and groups elements into
//! segments that must share an identical output.

pub mod error;
pub mod influence;
pub mod mount;
pub mod segments;

pub use error::{GeometryError, GeometryResult};
pub use influence::InfluenceMatrix;
pub use mount::{AngleUnit, ElementMount};
pub use segments::Segmentation;
