//! Per-element force bounds.

use crate::error::{SolverError, SolverResult};
use fa_core::ensure_len;
use serde::{Deserialize, Serialize};

/// Lower or upper force limit, either shared by every active element or
/// given per active element.
///
/// Infinite values mean "unbounded"; NaN is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bounds {
    Scalar(f64),
    PerElement(Vec<f64>),
}

impl Bounds {
    /// Concrete per-active-element values. A sequence must already have
    /// exactly `active` entries.
    pub fn resolve(&self, active: usize, what: &'static str) -> SolverResult<Vec<f64>> {
        let values = match self {
            Bounds::Scalar(v) => vec![*v; active],
            Bounds::PerElement(values) => {
                ensure_len(values, active, what)?;
                values.clone()
            }
        };
        if let Some(i) = values.iter().position(|v| v.is_nan()) {
            return Err(SolverError::InvalidBounds {
                what: format!("{what} {i} is NaN"),
            });
        }
        Ok(values)
    }

    /// Select the entries of a full-length (n) sequence that belong to
    /// active elements. Scalars pass through unchanged.
    pub fn restrict_to_active(&self, retracted: &[bool]) -> SolverResult<Bounds> {
        match self {
            Bounds::Scalar(v) => Ok(Bounds::Scalar(*v)),
            Bounds::PerElement(values) => {
                ensure_len(values, retracted.len(), "full-length bounds")?;
                Ok(Bounds::PerElement(
                    values
                        .iter()
                        .zip(retracted)
                        .filter(|(_, r)| !**r)
                        .map(|(v, _)| *v)
                        .collect(),
                ))
            }
        }
    }
}

impl From<f64> for Bounds {
    fn from(v: f64) -> Self {
        Bounds::Scalar(v)
    }
}

impl From<Vec<f64>> for Bounds {
    fn from(values: Vec<f64>) -> Self {
        Bounds::PerElement(values)
    }
}

/// Resolve a lower/upper pair and check that each interval is non-empty.
pub fn resolve_pair(
    lower: &Bounds,
    upper: &Bounds,
    active: usize,
) -> SolverResult<(Vec<f64>, Vec<f64>)> {
    let lo = lower.resolve(active, "lower bound")?;
    let hi = upper.resolve(active, "upper bound")?;
    for (i, (l, u)) in lo.iter().zip(&hi).enumerate() {
        if l > u || *l == f64::INFINITY || *u == f64::NEG_INFINITY {
            return Err(SolverError::InvalidBounds {
                what: format!("active element {i} has empty interval [{l}, {u}]"),
            });
        }
    }
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fa_core::FaError;

    #[test]
    fn scalar_broadcasts_to_active_count() {
        assert_eq!(Bounds::Scalar(5.0).resolve(3, "lower bound").unwrap(), vec![5.0; 3]);
        assert!(Bounds::Scalar(5.0).resolve(0, "lower bound").unwrap().is_empty());
    }

    #[test]
    fn sequence_must_match_active_count() {
        let b = Bounds::PerElement(vec![0.0, 1.0, 2.0]);
        assert!(b.resolve(3, "upper bound").is_ok());
        let err = b.resolve(4, "upper bound").unwrap_err();
        assert_eq!(
            err,
            SolverError::Core(FaError::LengthMismatch {
                what: "upper bound",
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn nan_rejected() {
        assert!(matches!(
            Bounds::Scalar(f64::NAN).resolve(2, "lower bound"),
            Err(SolverError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn crossed_pair_rejected() {
        let err = resolve_pair(&Bounds::Scalar(10.0), &Bounds::Scalar(1.0), 2).unwrap_err();
        assert!(matches!(err, SolverError::InvalidBounds { .. }));
        assert!(resolve_pair(&Bounds::Scalar(f64::INFINITY), &Bounds::Scalar(f64::INFINITY), 1).is_err());
    }

    #[test]
    fn infinite_bounds_allowed() {
        let (lo, hi) =
            resolve_pair(&Bounds::Scalar(f64::NEG_INFINITY), &Bounds::Scalar(f64::INFINITY), 2)
                .unwrap();
        assert_eq!(lo, vec![f64::NEG_INFINITY; 2]);
        assert_eq!(hi, vec![f64::INFINITY; 2]);
    }

    #[test]
    fn restrict_picks_active_entries() {
        let full = Bounds::PerElement(vec![1.0, 2.0, 3.0, 4.0]);
        let restricted = full.restrict_to_active(&[false, true, false, true]).unwrap();
        assert_eq!(restricted, Bounds::PerElement(vec![1.0, 3.0]));
        assert!(full.restrict_to_active(&[false; 3]).is_err());
    }

    #[test]
    fn untagged_yaml_shapes() {
        let scalar: Bounds = serde_json::from_str("1000.0").unwrap();
        assert_eq!(scalar, Bounds::Scalar(1000.0));
        let seq: Bounds = serde_json::from_str("[0.0, 10.0]").unwrap();
        assert_eq!(seq, Bounds::PerElement(vec![0.0, 10.0]));
    }
}
