//! Control-loop side of force allocation.
//!
//! Wraps the pure allocation solver in the pieces a running machine needs:
//!
//! - [`ThrustCommand`]: operator thrust and point of application mapped to a
//!   target resultant
//! - [`CylinderLimits`]: hydraulic pressure window converted to force bounds
//! - [`Allocator`]: per-tick solving with last-good hold

pub mod allocator;
pub mod command;
pub mod error;
pub mod limits;

pub use allocator::{Allocator, TickReport};
pub use command::ThrustCommand;
pub use error::{ControlError, ControlResult};
pub use limits::CylinderLimits;
