//! Six-component resultant (wrench) vector.

use crate::units::{Force, Torque, as_newton_meters, as_newtons};
use crate::{FaError, FaResult, ensure_finite};
use core::fmt;

/// Component of a resultant, in the fixed order `[Fx, Fy, Fz, Mx, My, Mz]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Fx,
    Fy,
    Fz,
    Mx,
    My,
    Mz,
}

impl Axis {
    pub const ALL: [Axis; 6] = [Axis::Fx, Axis::Fy, Axis::Fz, Axis::Mx, Axis::My, Axis::Mz];

    /// Row index of this component in a 6×n influence matrix.
    pub const fn index(self) -> usize {
        match self {
            Axis::Fx => 0,
            Axis::Fy => 1,
            Axis::Fz => 2,
            Axis::Mx => 3,
            Axis::My => 4,
            Axis::Mz => 5,
        }
    }

    pub fn from_index(index: usize) -> FaResult<Self> {
        Self::ALL.get(index).copied().ok_or(FaError::IndexOob {
            what: "resultant axis",
            index,
            len: 6,
        })
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Fx => "Fx",
            Axis::Fy => "Fy",
            Axis::Fz => "Fz",
            Axis::Mx => "Mx",
            Axis::My => "My",
            Axis::Mz => "Mz",
        };
        f.write_str(name)
    }
}

/// Components enforced as equality constraints: axial force and the two
/// tilting moments. Fx, Fy and Mz are left free.
pub const CONSTRAINED_AXES: [Axis; 3] = [Axis::Fz, Axis::Mx, Axis::My];

/// Combined force/moment vector `[Fx, Fy, Fz, Mx, My, Mz]` in N and N·m.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Resultant {
    components: [f64; 6],
}

impl Resultant {
    pub fn new(components: [f64; 6]) -> Self {
        Self { components }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Axial force with tilting moments, the usual shape of a lift target.
    pub fn axial(fz: f64, mx: f64, my: f64) -> Self {
        Self::new([0.0, 0.0, fz, mx, my, 0.0])
    }

    /// Build from typed force and moment triples.
    pub fn from_parts(force: [Force; 3], moment: [Torque; 3]) -> Self {
        Self::new([
            as_newtons(force[0]),
            as_newtons(force[1]),
            as_newtons(force[2]),
            as_newton_meters(moment[0]),
            as_newton_meters(moment[1]),
            as_newton_meters(moment[2]),
        ])
    }

    pub fn get(&self, axis: Axis) -> f64 {
        self.components[axis.index()]
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        self.components[axis.index()] = value;
    }

    pub fn components(&self) -> &[f64; 6] {
        &self.components
    }

    /// Values of the enforced components, in `CONSTRAINED_AXES` order.
    pub fn constrained(&self) -> [f64; 3] {
        CONSTRAINED_AXES.map(|axis| self.get(axis))
    }

    /// True when every enforced component is within `tol` of zero.
    pub fn constrained_is_zero(&self, tol: f64) -> bool {
        self.constrained().iter().all(|v| v.abs() <= tol)
    }

    pub fn ensure_finite(&self) -> FaResult<()> {
        for v in self.components {
            ensure_finite(v, "target resultant")?;
        }
        Ok(())
    }
}

impl From<[f64; 6]> for Resultant {
    fn from(components: [f64; 6]) -> Self {
        Self::new(components)
    }
}

impl fmt::Display for Resultant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Axis::ALL
            .iter()
            .map(|axis| format!("{}={:.3}", axis, self.get(*axis)))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{n, nm};

    #[test]
    fn axis_index_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_index(axis.index()).unwrap(), axis);
        }
        assert!(Axis::from_index(6).is_err());
    }

    #[test]
    fn constrained_picks_fz_mx_my() {
        let r = Resultant::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(r.constrained(), [3.0, 4.0, 5.0]);
    }

    #[test]
    fn from_parts_uses_si_values() {
        let r = Resultant::from_parts([n(0.0), n(0.0), n(1000.0)], [nm(200.0), nm(-300.0), nm(0.0)]);
        assert_eq!(r, Resultant::axial(1000.0, 200.0, -300.0));
    }

    #[test]
    fn zero_check_ignores_free_axes() {
        let r = Resultant::new([5.0, -5.0, 0.0, 0.0, 0.0, 7.0]);
        assert!(r.constrained_is_zero(1e-12));
        assert!(!Resultant::axial(1e-6, 0.0, 0.0).constrained_is_zero(1e-9));
    }

    #[test]
    fn non_finite_component_rejected() {
        let r = Resultant::axial(f64::NAN, 0.0, 0.0);
        assert!(r.ensure_finite().is_err());
    }
}
