//! fa-core: stable foundation for forcealloc.
//!
//! Contains:
//! - numeric (Real + finiteness and length checks)
//! - units (uom SI types + constructors for forces, moments and pressures)
//! - resultant (6-component force/moment vector and its axis ordering)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod resultant;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{FaError, FaResult};
pub use numeric::*;
pub use resultant::{Axis, CONSTRAINED_AXES, Resultant};
pub use units::*;
