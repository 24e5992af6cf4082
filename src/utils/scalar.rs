//! Scalar extraction from array-like or scalar values.

use faer::{Col, Mat};
use thiserror::Error;

/// A value could not be reduced to a single float.
#[derive(Debug, Error)]
#[error("cannot cast {kind} to a float")]
pub struct ScalarError {
    kind: &'static str,
}

/// Something that may hold a float, either directly or as the first element of
/// an array-like shape.
pub trait ScalarSource {
    /// First element of the flattened value, if the value has a shape.
    fn first_element(&self) -> Option<f64>;

    /// Direct numeric cast, if the value is a scalar.
    fn cast(&self) -> Option<f64>;

    /// Short description used in errors.
    fn kind(&self) -> &'static str;
}

/// Reduce `value` to a plain `f64`.
///
/// Shape-based extraction is tried first; scalars fall back to a direct cast.
/// An empty array-like is an error.
pub fn safe_float<T: ScalarSource + ?Sized>(value: &T) -> Result<f64, ScalarError> {
    value
        .first_element()
        .or_else(|| value.cast())
        .ok_or(ScalarError { kind: value.kind() })
}

macro_rules! scalar_number {
    ($($t:ty),*) => {
        $(
            impl ScalarSource for $t {
                fn first_element(&self) -> Option<f64> {
                    None
                }

                fn cast(&self) -> Option<f64> {
                    Some(*self as f64)
                }

                fn kind(&self) -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

scalar_number!(f64, f32, i32, i64, u32, u64, usize);

impl ScalarSource for [f64] {
    fn first_element(&self) -> Option<f64> {
        self.first().copied()
    }

    fn cast(&self) -> Option<f64> {
        None
    }

    fn kind(&self) -> &'static str {
        "empty slice"
    }
}

impl ScalarSource for Vec<f64> {
    fn first_element(&self) -> Option<f64> {
        self.as_slice().first_element()
    }

    fn cast(&self) -> Option<f64> {
        None
    }

    fn kind(&self) -> &'static str {
        "empty vector"
    }
}

impl ScalarSource for Col<f64> {
    fn first_element(&self) -> Option<f64> {
        (self.nrows() > 0).then(|| self[0])
    }

    fn cast(&self) -> Option<f64> {
        None
    }

    fn kind(&self) -> &'static str {
        "empty column"
    }
}

impl ScalarSource for Mat<f64> {
    fn first_element(&self) -> Option<f64> {
        (self.nrows() > 0 && self.ncols() > 0).then(|| self[(0, 0)])
    }

    fn cast(&self) -> Option<f64> {
        None
    }

    fn kind(&self) -> &'static str {
        "empty matrix"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_cast_directly() {
        assert_eq!(safe_float(&2.5_f64).unwrap(), 2.5);
        assert_eq!(safe_float(&3_i64).unwrap(), 3.0);
        assert_eq!(safe_float(&7_usize).unwrap(), 7.0);
    }

    #[test]
    fn test_array_like_takes_first_element() {
        assert_eq!(safe_float(&vec![4.0, 9.0]).unwrap(), 4.0);
        assert_eq!(safe_float(&[1.5, 2.5][..]).unwrap(), 1.5);
        assert_eq!(safe_float(&Col::from_fn(3, |i| i as f64 + 0.5)).unwrap(), 0.5);
        assert_eq!(safe_float(&Mat::from_fn(1, 1, |_, _| 8.25)).unwrap(), 8.25);
    }

    #[test]
    fn test_empty_array_like_is_an_error() {
        let empty: Vec<f64> = Vec::new();
        let err = safe_float(&empty).unwrap_err();
        assert!(err.to_string().contains("empty vector"));
        assert!(safe_float(&Mat::<f64>::zeros(0, 0)).is_err());
    }
}
