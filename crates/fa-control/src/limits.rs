//! Force bounds derived from hydraulic cylinder limits.

use crate::error::{ControlError, ControlResult};
use fa_core::{Area, Force, Pressure, as_newtons, piston_force};
use fa_solver::Bounds;
use serde::{Deserialize, Serialize};
use uom::si::area::square_meter;
use uom::si::pressure::pascal;

/// Pressure window of a hydraulic cylinder and its piston area.
///
/// Every element shares the same cylinder, so the derived bounds are scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderLimits {
    /// Lowest working pressure
    pub min_pressure: Pressure,
    /// Highest working pressure
    pub max_pressure: Pressure,
    /// Effective piston area
    pub piston_area: Area,
}

impl CylinderLimits {
    /// Create cylinder limits.
    ///
    /// # Errors
    ///
    /// Returns error if the area is not positive, a pressure is not finite,
    /// or `min_pressure > max_pressure`.
    pub fn new(min_pressure: Pressure, max_pressure: Pressure, piston_area: Area) -> ControlResult<Self> {
        let limits = Self {
            min_pressure,
            max_pressure,
            piston_area,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> ControlResult<()> {
        let area = self.piston_area.get::<square_meter>();
        if !(area.is_finite() && area > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "piston area must be positive and finite",
            });
        }
        let (lo, hi) = (
            self.min_pressure.get::<pascal>(),
            self.max_pressure.get::<pascal>(),
        );
        if !(lo.is_finite() && hi.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "cylinder pressures must be finite",
            });
        }
        if lo > hi {
            return Err(ControlError::InvalidArg {
                what: "min_pressure must not exceed max_pressure",
            });
        }
        Ok(())
    }

    /// `(p_min · A, p_max · A)`.
    pub fn force_range(&self) -> (Force, Force) {
        (
            piston_force(self.min_pressure, self.piston_area),
            piston_force(self.max_pressure, self.piston_area),
        )
    }

    /// Lower and upper solver bounds in newtons.
    pub fn bounds(&self) -> ControlResult<(Bounds, Bounds)> {
        self.validate()?;
        let (lo, hi) = self.force_range();
        Ok((
            Bounds::Scalar(as_newtons(lo)),
            Bounds::Scalar(as_newtons(hi)),
        ))
    }
}
