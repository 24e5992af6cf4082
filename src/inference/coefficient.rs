//! Coefficient inference calculations.

use crate::solvers::RegressionError;
use crate::utils::{invert, select_columns, with_intercept};
use faer::{Col, Mat};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Tolerance used when inverting cross-product matrices for standard errors.
const INVERSE_TOLERANCE: f64 = 1e-12;

/// One row of a coefficient table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientRow {
    /// Point estimate.
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// t or z statistic.
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

impl CoefficientRow {
    /// Conventional significance stars: `***` p < 0.01, `**` p < 0.05, `*` p < 0.1.
    pub fn stars(&self) -> &'static str {
        significance_stars(self.p_value)
    }
}

/// Significance stars for a p-value (empty when not significant at 10%).
pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.01 {
        "***"
    } else if p_value < 0.05 {
        "**"
    } else if p_value < 0.1 {
        "*"
    } else {
        ""
    }
}

/// Computes inference statistics for regression coefficients.
pub struct CoefficientInference;

impl CoefficientInference {
    /// Compute standard errors for OLS coefficients without intercept.
    ///
    /// SE(β_j) = sqrt(σ² * (X'X)^(-1)_{jj})
    pub fn standard_errors(
        x: &Mat<f64>,
        mse: f64,
        aliased: &[bool],
    ) -> Result<Col<f64>, RegressionError> {
        let active: Vec<usize> = (0..x.ncols()).filter(|&j| !aliased[j]).collect();
        if active.is_empty() {
            return Err(RegressionError::AllFeaturesConstant);
        }

        let x_active = select_columns(x, &active);
        let xtx_inv = invert(&(x_active.transpose() * &x_active), INVERSE_TOLERANCE)?;

        let mut se = Col::from_fn(x.ncols(), |_| f64::NAN);
        for (k, &j) in active.iter().enumerate() {
            se[j] = variance_to_se(mse * xtx_inv[(k, k)]);
        }

        Ok(se)
    }

    /// Compute standard errors for both intercept and coefficients using the
    /// augmented design matrix `[1 | X_active]`, where aliased columns are dropped.
    ///
    /// Returns (coefficient_SE, intercept_SE). Aliased coefficients get NaN.
    pub fn standard_errors_with_intercept(
        x: &Mat<f64>,
        mse: f64,
        aliased: &[bool],
    ) -> Result<(Col<f64>, f64), RegressionError> {
        let active: Vec<usize> = (0..x.ncols()).filter(|&j| !aliased[j]).collect();

        let x_aug = with_intercept(&select_columns(x, &active));
        let xtx_aug_inv = invert(&(x_aug.transpose() * &x_aug), INVERSE_TOLERANCE)?;

        let se_intercept = variance_to_se(mse * xtx_aug_inv[(0, 0)]);

        let mut se_coef = Col::from_fn(x.ncols(), |_| f64::NAN);
        for (k, &j) in active.iter().enumerate() {
            se_coef[j] = variance_to_se(mse * xtx_aug_inv[(k + 1, k + 1)]);
        }

        Ok((se_coef, se_intercept))
    }

    /// Standard errors from the diagonal of a covariance matrix.
    pub fn standard_errors_from_covariance(covariance: &Mat<f64>) -> Col<f64> {
        Col::from_fn(covariance.nrows(), |j| variance_to_se(covariance[(j, j)]))
    }

    /// Compute t-statistics for coefficients.
    ///
    /// t_j = β_j / SE(β_j)
    pub fn t_statistics(coefficients: &Col<f64>, std_errors: &Col<f64>) -> Col<f64> {
        Col::from_fn(coefficients.nrows(), |j| {
            if std_errors[j].is_nan() || std_errors[j] == 0.0 {
                f64::NAN
            } else {
                coefficients[j] / std_errors[j]
            }
        })
    }

    /// Compute p-values from t-statistics.
    ///
    /// p_j = 2 * P(|T| > |t_j|) where T ~ t(df)
    pub fn p_values(t_statistics: &Col<f64>, df: f64) -> Col<f64> {
        let n = t_statistics.nrows();
        let t_dist = match StudentsT::new(0.0, 1.0, df) {
            Ok(d) if df > 0.0 => d,
            _ => return Col::from_fn(n, |_| f64::NAN),
        };

        Col::from_fn(n, |j| {
            let t = t_statistics[j];
            if t.is_nan() {
                f64::NAN
            } else {
                2.0 * t_dist.sf(t.abs())
            }
        })
    }

    /// Two-sided p-values from z-statistics under the standard normal.
    pub fn normal_p_values(z_statistics: &Col<f64>) -> Col<f64> {
        let n = z_statistics.nrows();
        let normal = match Normal::new(0.0, 1.0) {
            Ok(d) => d,
            Err(_) => return Col::from_fn(n, |_| f64::NAN),
        };

        Col::from_fn(n, |j| {
            let z = z_statistics[j];
            if z.is_nan() {
                f64::NAN
            } else {
                2.0 * normal.sf(z.abs())
            }
        })
    }

    /// Compute confidence intervals for coefficients.
    ///
    /// CI_j = β_j ± t_{α/2, df} * SE(β_j)
    pub fn confidence_intervals(
        coefficients: &Col<f64>,
        std_errors: &Col<f64>,
        df: f64,
        confidence_level: f64,
    ) -> (Col<f64>, Col<f64>) {
        let alpha = 1.0 - confidence_level;
        let t_crit = match StudentsT::new(0.0, 1.0, df) {
            Ok(d) if df > 0.0 => d.inverse_cdf(1.0 - alpha / 2.0),
            _ => f64::NAN,
        };
        Self::intervals_with_critical(coefficients, std_errors, t_crit)
    }

    /// Confidence intervals using the standard normal critical value.
    pub fn normal_confidence_intervals(
        coefficients: &Col<f64>,
        std_errors: &Col<f64>,
        confidence_level: f64,
    ) -> (Col<f64>, Col<f64>) {
        let alpha = 1.0 - confidence_level;
        let z_crit = Normal::new(0.0, 1.0).map_or(f64::NAN, |d| d.inverse_cdf(1.0 - alpha / 2.0));
        Self::intervals_with_critical(coefficients, std_errors, z_crit)
    }

    fn intervals_with_critical(
        coefficients: &Col<f64>,
        std_errors: &Col<f64>,
        critical: f64,
    ) -> (Col<f64>, Col<f64>) {
        let n = coefficients.nrows();
        let lower = Col::from_fn(n, |j| coefficients[j] - critical * std_errors[j]);
        let upper = Col::from_fn(n, |j| coefficients[j] + critical * std_errors[j]);
        (lower, upper)
    }
}

fn variance_to_se(var: f64) -> f64 {
    if var >= 0.0 {
        var.sqrt()
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_statistics() {
        let coefficients = Col::from_fn(3, |i| (i + 1) as f64);
        let std_errors = Col::from_fn(3, |_| 0.5);

        let t_stats = CoefficientInference::t_statistics(&coefficients, &std_errors);

        assert!((t_stats[0] - 2.0).abs() < 1e-10);
        assert!((t_stats[1] - 4.0).abs() < 1e-10);
        assert!((t_stats[2] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_p_values_bounds() {
        let t_stats = Col::from_fn(3, |i| (i + 1) as f64);
        let p_vals = CoefficientInference::p_values(&t_stats, 10.0);

        for p in p_vals.iter() {
            assert!(*p >= 0.0 && *p <= 1.0);
        }
        assert!(p_vals[0] > p_vals[2]);
    }

    #[test]
    fn test_normal_p_values() {
        let z = Col::from_fn(2, |i| if i == 0 { 1.959964 } else { 0.0 });
        let p = CoefficientInference::normal_p_values(&z);
        assert!((p[0] - 0.05).abs() < 1e-5);
        assert!((p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_confidence_intervals() {
        let beta = Col::from_fn(1, |_| 1.0);
        let se = Col::from_fn(1, |_| 0.5);
        let (lower, upper) = CoefficientInference::normal_confidence_intervals(&beta, &se, 0.95);
        assert!((lower[0] - (1.0 - 1.959964 * 0.5)).abs() < 1e-5);
        assert!((upper[0] - (1.0 + 1.959964 * 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_standard_errors_skip_aliased_columns() {
        // Column 1 duplicates column 0 and is marked aliased
        let x = Mat::from_fn(10, 3, |i, j| match j {
            0 | 1 => i as f64,
            _ => ((i * 7) % 5) as f64,
        });
        let aliased = vec![false, true, false];

        let (se, se_int) =
            CoefficientInference::standard_errors_with_intercept(&x, 1.0, &aliased).unwrap();
        assert!(se[0].is_finite() && se[0] > 0.0);
        assert!(se[1].is_nan());
        assert!(se[2].is_finite());
        assert!(se_int.is_finite());

        let se_plain = CoefficientInference::standard_errors(&x, 1.0, &aliased).unwrap();
        assert!(se_plain[1].is_nan());
        assert!(se_plain[0] > 0.0);
    }

    #[test]
    fn test_significance_stars() {
        assert_eq!(significance_stars(0.001), "***");
        assert_eq!(significance_stars(0.03), "**");
        assert_eq!(significance_stars(0.07), "*");
        assert_eq!(significance_stars(0.5), "");
        assert_eq!(significance_stars(f64::NAN), "");
    }
}
