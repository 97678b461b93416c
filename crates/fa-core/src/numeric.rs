use crate::FaError;

/// Floating point type used throughout system
pub type Real = f64;

/// Reject NaN and infinities.
pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, FaError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FaError::NonFinite { what, value: v })
    }
}

/// Check every entry of a slice, reporting the first non-finite value.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), FaError> {
    for &v in values {
        ensure_finite(v, what)?;
    }
    Ok(())
}

/// Check that a slice has the length the caller expects.
pub fn ensure_len<T>(values: &[T], expected: usize, what: &'static str) -> Result<(), FaError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(FaError::LengthMismatch {
            what,
            expected,
            actual: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_all_finite_reports_infinity() {
        let err = ensure_all_finite(&[1.0, Real::INFINITY], "forces").unwrap_err();
        assert_eq!(
            err,
            FaError::NonFinite {
                what: "forces",
                value: Real::INFINITY
            }
        );
    }

    #[test]
    fn ensure_len_mismatch() {
        assert!(ensure_len(&[1, 2, 3], 3, "labels").is_ok());
        let err = ensure_len(&[1, 2], 3, "labels").unwrap_err();
        assert!(format!("{err}").contains("expected 3, got 2"));
    }
}
