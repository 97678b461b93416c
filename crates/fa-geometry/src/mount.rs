//! Mounting description of a single force-producing element.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Directions shorter than this are treated as degenerate.
const MIN_DIRECTION_NORM: f64 = 1e-12;

/// Unit of a polar mounting angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    pub fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle.to_radians(),
        }
    }
}

/// Point of application and line of action of one element.
///
/// A unit force along `direction` applied at `position` contributes
/// `[u; p × u]` to the resultant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementMount {
    /// Point of application (m).
    pub position: [f64; 3],
    /// Line of action; normalised when the influence column is built.
    pub direction: [f64; 3],
}

impl ElementMount {
    pub fn new(position: [f64; 3], direction: [f64; 3]) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// Element pushing along +z at `(x, y)` in the base plane.
    pub fn axial(x: f64, y: f64) -> Self {
        Self::new([x, y, 0.0], [0.0, 0.0, 1.0])
    }

    /// Axial element placed by radius and angle, as in a spreadsheet layout.
    pub fn polar(radius: f64, theta: f64, unit: AngleUnit) -> Self {
        let theta = unit.to_radians(theta);
        Self::axial(radius * theta.cos(), radius * theta.sin())
    }

    /// `count` axial elements evenly spaced on a circle, numbered clockwise
    /// starting from the top (+y).
    pub fn ring(count: usize, radius: f64) -> Vec<Self> {
        (0..count)
            .map(|i| {
                let theta = FRAC_PI_2 - TAU * i as f64 / count as f64;
                Self::polar(radius, theta, AngleUnit::Radians)
            })
            .collect()
    }

    /// Influence column `[u; p × u]`, or `None` for a zero-length direction.
    pub fn influence_column(&self) -> Option<[f64; 6]> {
        let dir = Vector3::from(self.direction);
        let norm = dir.norm();
        if !norm.is_finite() || norm <= MIN_DIRECTION_NORM {
            return None;
        }
        let u = dir / norm;
        let moment = Vector3::from(self.position).cross(&u);
        Some([u.x, u.y, u.z, moment.x, moment.y, moment.z])
    }
}
