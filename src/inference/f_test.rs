//! Joint significance tests for subsets of regression coefficients.

use crate::core::RegressionOptions;
use crate::solvers::{FittedOls, FittedRegressor, OlsRegressor, RegressionError, Regressor};
use crate::utils::{select_columns, total_sum_of_squares};
use faer::{Col, Mat};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

/// Result of a joint F-test that a set of coefficients is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointFTest {
    /// F statistic.
    pub statistic: f64,
    /// Upper-tail p-value of F(df_num, df_denom).
    pub p_value: f64,
    /// Numerator degrees of freedom (number of restrictions).
    pub df_num: usize,
    /// Denominator degrees of freedom (residual df of the full model).
    pub df_denom: usize,
}

impl JointFTest {
    /// Build the test from the residual sums of squares of nested models.
    ///
    /// `F = ((RSS_r - RSS_u) / q) / (RSS_u / df_denom)`. Degenerate inputs
    /// (no restrictions, no residual df, zero residual variance) give NaN.
    pub fn from_nested(rss_restricted: f64, rss_full: f64, df_num: usize, df_denom: usize) -> Self {
        let statistic = if df_num > 0 && df_denom > 0 && rss_full > 0.0 {
            let numerator = (rss_restricted - rss_full).max(0.0) / df_num as f64;
            numerator / (rss_full / df_denom as f64)
        } else {
            f64::NAN
        };

        Self {
            statistic,
            p_value: f_upper_tail(statistic, df_num as f64, df_denom as f64),
            df_num,
            df_denom,
        }
    }

    /// Test `H0: β_j = 0 for all j in tested` in the fitted model `full` of `y` on `x`.
    ///
    /// The restricted model is refit without the tested columns (keeping the
    /// intercept if the full model has one). This is the classical Wald test
    /// with the homoskedastic covariance.
    pub fn for_columns(
        x: &Mat<f64>,
        y: &Col<f64>,
        full: &FittedOls,
        tested: &[usize],
        options: &RegressionOptions,
    ) -> Result<Self, RegressionError> {
        let full_result = full.result();
        let kept: Vec<usize> = (0..x.ncols()).filter(|j| !tested.contains(j)).collect();

        let (rss_restricted, rank_restricted) = if kept.is_empty() {
            let rss = if full_result.intercept.is_some() {
                total_sum_of_squares(y)
            } else {
                y.iter().map(|&v| v * v).sum()
            };
            (rss, 0)
        } else {
            let restricted = OlsRegressor::new(RegressionOptions {
                compute_inference: false,
                ..options.clone()
            })
            .fit(&select_columns(x, &kept), y)?;
            (restricted.result().rss(), restricted.result().rank)
        };

        let df_num = full_result.rank.saturating_sub(rank_restricted);
        Ok(Self::from_nested(
            rss_restricted,
            full_result.rss(),
            df_num,
            full_result.residual_df(),
        ))
    }
}

/// Upper-tail probability of an F distribution; NaN for invalid input.
pub fn f_upper_tail(statistic: f64, df_num: f64, df_denom: f64) -> f64 {
    if !statistic.is_finite() || df_num <= 0.0 || df_denom <= 0.0 {
        return f64::NAN;
    }
    FisherSnedecor::new(df_num, df_denom).map_or(f64::NAN, |d| d.sf(statistic))
}

/// Upper-tail probability of a chi-square distribution; NaN for invalid input.
pub fn chi_squared_upper_tail(statistic: f64, df: f64) -> f64 {
    if !statistic.is_finite() || df <= 0.0 {
        return f64::NAN;
    }
    ChiSquared::new(df).map_or(f64::NAN, |d| d.sf(statistic.max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nested() {
        // RSS drops from 20 to 10 with 2 restrictions and 20 residual df
        let test = JointFTest::from_nested(20.0, 10.0, 2, 20);
        assert!((test.statistic - 10.0).abs() < 1e-12);
        assert!(test.p_value > 0.0 && test.p_value < 0.01);
    }

    #[test]
    fn test_degenerate_inputs_are_nan() {
        assert!(JointFTest::from_nested(20.0, 10.0, 0, 20).statistic.is_nan());
        assert!(JointFTest::from_nested(20.0, 0.0, 1, 20).p_value.is_nan());
    }

    #[test]
    fn test_all_columns_matches_overall_f() {
        let x = Mat::from_fn(40, 2, |i, j| {
            if j == 0 {
                i as f64
            } else {
                ((i * 13) % 7) as f64
            }
        });
        let y = Col::from_fn(40, |i| 1.0 + 0.2 * i as f64 + ((i * 5) % 3) as f64);
        let options = RegressionOptions::default();
        let fitted = OlsRegressor::new(options.clone()).fit(&x, &y).unwrap();

        let test = JointFTest::for_columns(&x, &y, &fitted, &[0, 1], &options).unwrap();
        assert!((test.statistic - fitted.result().f_statistic).abs() < 1e-8);
        assert_eq!(test.df_num, 2);
        assert_eq!(test.df_denom, 37);
    }

    #[test]
    fn test_single_column_matches_t_squared() {
        let x = Mat::from_fn(30, 2, |i, j| {
            if j == 0 {
                (i as f64).sin()
            } else {
                (i as f64 * 0.3).cos()
            }
        });
        let y = Col::from_fn(30, |i| 0.5 * x[(i, 0)] + 0.1 * x[(i, 1)] + ((i % 4) as f64) * 0.1);
        let options = RegressionOptions::default();
        let fitted = OlsRegressor::new(options.clone()).fit(&x, &y).unwrap();

        let test = JointFTest::for_columns(&x, &y, &fitted, &[1], &options).unwrap();
        let t = fitted.result().t_statistics.as_ref().unwrap()[1];
        assert!((test.statistic - t * t).abs() < 1e-6);
        let p = fitted.result().p_values.as_ref().unwrap()[1];
        assert!((test.p_value - p).abs() < 1e-6);
    }

    #[test]
    fn test_chi_squared_upper_tail() {
        assert!((chi_squared_upper_tail(3.841459, 1.0) - 0.05).abs() < 1e-5);
        assert!(chi_squared_upper_tail(1.0, 0.0).is_nan());
        assert!((chi_squared_upper_tail(0.0, 2.0) - 1.0).abs() < 1e-12);
    }
}
