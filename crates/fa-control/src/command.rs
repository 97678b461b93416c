//! Operator thrust command.
//!
//! The manual input is an axial thrust and the point on the mounting plane
//! where it should act. Applying an axial force `F` at `(x, y)` produces the
//! moments `Mx = F·y` and `My = −F·x`; the in-plane force and yaw moment are
//! zero.

use crate::error::{ControlError, ControlResult};
use fa_core::{Force, Length, Resultant, as_meters, as_newtons, m, n};
use serde::{Deserialize, Serialize};

/// Axial thrust and its point of application.
///
/// Quantities serialize in SI base units (newtons, meters).
///
/// # Example
///
/// ```
/// use fa_control::ThrustCommand;
///
/// let cmd = ThrustCommand::new(1000.0, 0.3, 0.2);
/// let target = cmd.target().unwrap();
/// assert_eq!(target.components(), &[0.0, 0.0, 1000.0, 200.0, -300.0, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrustCommand {
    /// Axial thrust
    pub thrust: Force,
    /// Point of application, x
    pub x: Length,
    /// Point of application, y
    pub y: Length,
}

impl ThrustCommand {
    /// Command from plain SI values (N, m, m).
    pub fn new(thrust: f64, x: f64, y: f64) -> Self {
        Self {
            thrust: n(thrust),
            x: m(x),
            y: m(y),
        }
    }

    /// Thrust through the origin.
    pub fn centered(thrust: f64) -> Self {
        Self::new(thrust, 0.0, 0.0)
    }

    /// Target resultant `[0, 0, F, F·y, −F·x, 0]`.
    ///
    /// # Errors
    ///
    /// Returns error if any component is not finite.
    pub fn target(&self) -> ControlResult<Resultant> {
        let f = as_newtons(self.thrust);
        let (x, y) = (as_meters(self.x), as_meters(self.y));
        if !(f.is_finite() && x.is_finite() && y.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "thrust command must be finite",
            });
        }
        Ok(Resultant::axial(f, f * y, -f * x))
    }
}
