//! Two-stage least squares (2SLS) estimator.
//!
//! The structural equation is
//!
//! ```text
//! y = [1 | W | D] β + ε
//! ```
//!
//! with exogenous regressors `W`, endogenous regressors `D` and excluded
//! instruments `Z`. The full instrument matrix is `[1 | W | Z]`.

use crate::core::{CovarianceType, IvResult, RegressionOptions, RegressionOptionsBuilder};
use crate::inference::CoefficientInference;
use crate::solvers::traits::{FittedIv, IvEstimator, RegressionError};
use crate::utils::{hstack, invert, total_sum_of_squares, weighted_outer_sum, with_intercept};
use faer::{Col, Mat};

/// Data of an instrumental-variable model, validated for shape.
#[derive(Debug, Clone)]
pub struct IvDesign {
    y: Col<f64>,
    exog: Mat<f64>,
    endog: Mat<f64>,
    instruments: Mat<f64>,
}

impl IvDesign {
    /// Create a design from the outcome, exogenous regressors (without the
    /// intercept), endogenous regressors and excluded instruments.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if any block has a different row count than `y`
    /// - `UnderIdentified` if there are fewer instruments than endogenous regressors
    pub fn new(
        y: Col<f64>,
        exog: Mat<f64>,
        endog: Mat<f64>,
        instruments: Mat<f64>,
    ) -> Result<Self, RegressionError> {
        let n = y.nrows();
        for block in [&exog, &endog, &instruments] {
            if block.nrows() != n {
                return Err(RegressionError::DimensionMismatch {
                    x_rows: block.nrows(),
                    y_len: n,
                });
            }
        }

        if endog.ncols() == 0 || instruments.ncols() < endog.ncols() {
            return Err(RegressionError::UnderIdentified {
                instruments: instruments.ncols(),
                endogenous: endog.ncols(),
            });
        }

        Ok(Self {
            y,
            exog,
            endog,
            instruments,
        })
    }

    pub fn y(&self) -> &Col<f64> {
        &self.y
    }

    pub fn exog(&self) -> &Mat<f64> {
        &self.exog
    }

    pub fn endog(&self) -> &Mat<f64> {
        &self.endog
    }

    pub fn instruments(&self) -> &Mat<f64> {
        &self.instruments
    }

    pub fn n_observations(&self) -> usize {
        self.y.nrows()
    }

    pub fn n_exogenous(&self) -> usize {
        self.exog.ncols()
    }

    pub fn n_endogenous(&self) -> usize {
        self.endog.ncols()
    }

    pub fn n_instruments(&self) -> usize {
        self.instruments.ncols()
    }

    /// Regressor matrix `[1 | W | D]` (intercept optional).
    pub(crate) fn regressors(&self, intercept: bool) -> Result<Mat<f64>, RegressionError> {
        let x = hstack(&[&self.exog, &self.endog])?;
        Ok(if intercept { with_intercept(&x) } else { x })
    }

    /// Instrument matrix `[1 | W | Z]` (intercept optional).
    pub(crate) fn instrument_matrix(&self, intercept: bool) -> Result<Mat<f64>, RegressionError> {
        let z = hstack(&[&self.exog, &self.instruments])?;
        Ok(if intercept { with_intercept(&z) } else { z })
    }

    /// Both model matrices after checking there are enough observations.
    pub(crate) fn matrices(&self, intercept: bool) -> Result<(Mat<f64>, Mat<f64>), RegressionError> {
        let x = self.regressors(intercept)?;
        let z = self.instrument_matrix(intercept)?;

        let needed = z.ncols() + 1;
        if self.n_observations() < needed {
            return Err(RegressionError::InsufficientObservations {
                needed,
                got: self.n_observations(),
            });
        }

        Ok((x, z))
    }
}

/// Two-stage least squares estimator.
///
/// # Example
///
/// ```rust,ignore
/// use iv_validity::solvers::{IvDesign, IvEstimator, FittedIv, TwoStageLeastSquares};
///
/// let design = IvDesign::new(y, controls, endog, instruments)?;
/// let fitted = TwoStageLeastSquares::builder().build().fit(&design)?;
/// println!("effect = {}", fitted.endogenous_params()[0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TwoStageLeastSquares {
    options: RegressionOptions,
}

impl TwoStageLeastSquares {
    /// Create a new 2SLS estimator with the given options.
    pub fn new(options: RegressionOptions) -> Self {
        Self { options }
    }

    /// Create a builder for configuring the estimator.
    pub fn builder() -> TwoStageLeastSquaresBuilder {
        TwoStageLeastSquaresBuilder::default()
    }
}

impl IvEstimator for TwoStageLeastSquares {
    type Fitted = FittedTwoStage;

    fn fit(&self, design: &IvDesign) -> Result<Self::Fitted, RegressionError> {
        self.options.validate()?;

        let (x, z) = design.matrices(self.options.with_intercept)?;
        let y = design.y();
        let tol = self.options.rank_tolerance;

        // First stage: X̂ = Z (Z'Z)⁻¹ Z'X
        let ztz_inv = invert(&(z.transpose() * &z), tol)?;
        let first_stage = &ztz_inv * &(z.transpose() * &x);
        let x_hat = &z * &first_stage;

        // Second stage: β = (X̂'X̂)⁻¹ X̂'y
        let bread = invert(&(x_hat.transpose() * &x_hat), tol)?;
        let params = &bread * &(x_hat.transpose() * y);

        let fitted_values = &x * &params;
        let residuals = Col::from_fn(y.nrows(), |i| y[i] - fitted_values[i]);

        let n = y.nrows() as f64;
        let covariance = match self.options.covariance {
            CovarianceType::Robust => {
                let meat = weighted_outer_sum(&x_hat, &residuals);
                &(&bread * &meat) * &bread
            }
            CovarianceType::Unadjusted => {
                let sigma2 = residuals.iter().map(|&e| e * e).sum::<f64>() / n;
                Mat::from_fn(bread.nrows(), bread.ncols(), |i, j| sigma2 * bread[(i, j)])
            }
        };

        let result = assemble_result(
            design,
            &self.options,
            params,
            covariance,
            fitted_values,
            residuals,
        );

        Ok(FittedTwoStage {
            options: self.options.clone(),
            result,
        })
    }
}

/// Fill an `IvResult` from parameter estimates and their covariance.
///
/// Inference is asymptotic: z statistics, normal p-values and intervals.
pub(crate) fn assemble_result(
    design: &IvDesign,
    options: &RegressionOptions,
    params: Col<f64>,
    covariance: Mat<f64>,
    fitted_values: Col<f64>,
    residuals: Col<f64>,
) -> IvResult {
    let y = design.y();
    let n = y.nrows();
    let k = params.nrows();

    let std_errors = CoefficientInference::standard_errors_from_covariance(&covariance);
    let z_statistics = CoefficientInference::t_statistics(&params, &std_errors);
    let p_values = CoefficientInference::normal_p_values(&z_statistics);
    let (conf_interval_lower, conf_interval_upper) = CoefficientInference::normal_confidence_intervals(
        &params,
        &std_errors,
        options.confidence_level,
    );

    // R² can be negative for IV fits; it is not clamped
    let rss: f64 = residuals.iter().map(|&e| e * e).sum();
    let tss = if options.with_intercept {
        total_sum_of_squares(y)
    } else {
        y.iter().map(|&v| v * v).sum()
    };
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };

    let df_total = n.saturating_sub(usize::from(options.with_intercept)) as f64;
    let df_resid = n.saturating_sub(k) as f64;
    let adj_r_squared = if df_resid > 0.0 {
        1.0 - (1.0 - r_squared) * df_total / df_resid
    } else {
        f64::NAN
    };

    IvResult {
        params,
        covariance,
        std_errors,
        z_statistics,
        p_values,
        conf_interval_lower,
        conf_interval_upper,
        residuals,
        fitted_values,
        r_squared,
        adj_r_squared,
        n_observations: n,
        has_intercept: options.with_intercept,
        n_exogenous: design.n_exogenous(),
        n_endogenous: design.n_endogenous(),
        n_instruments: design.n_instruments(),
        covariance_type: options.covariance,
        confidence_level: options.confidence_level,
    }
}

/// A fitted 2SLS model.
#[derive(Debug, Clone)]
pub struct FittedTwoStage {
    options: RegressionOptions,
    result: IvResult,
}

impl FittedTwoStage {
    /// Get the options used to fit this model.
    pub fn options(&self) -> &RegressionOptions {
        &self.options
    }
}

impl FittedIv for FittedTwoStage {
    fn result(&self) -> &IvResult {
        &self.result
    }
}

/// Builder for `TwoStageLeastSquares`.
#[derive(Debug, Clone, Default)]
pub struct TwoStageLeastSquaresBuilder {
    builder: RegressionOptionsBuilder,
}

impl TwoStageLeastSquaresBuilder {
    /// Set whether to include an intercept term.
    pub fn with_intercept(mut self, include: bool) -> Self {
        self.builder = self.builder.with_intercept(include);
        self
    }

    /// Set the covariance estimator.
    pub fn covariance(mut self, covariance: CovarianceType) -> Self {
        self.builder = self.builder.covariance(covariance);
        self
    }

    /// Set the confidence level for confidence intervals.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.builder = self.builder.confidence_level(level);
        self
    }

    /// Set the tolerance used when inverting cross-product matrices.
    pub fn rank_tolerance(mut self, tol: f64) -> Self {
        self.builder = self.builder.rank_tolerance(tol);
        self
    }

    /// Build the estimator.
    pub fn build(self) -> TwoStageLeastSquares {
        TwoStageLeastSquares::new(self.builder.build_unchecked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(i: usize, salt: usize) -> f64 {
        let mut h = (i as u64)
            .wrapping_mul(6364136223846793005)
            .wrapping_add((salt as u64 + 1).wrapping_mul(1442695040888963407));
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51afd7ed558ccd);
        h ^= h >> 33;
        (h >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }

    #[test]
    fn test_design_rejects_under_identification() {
        let y = Col::zeros(10);
        let result = IvDesign::new(y, Mat::zeros(10, 0), Mat::zeros(10, 2), Mat::zeros(10, 1));
        assert!(matches!(
            result,
            Err(RegressionError::UnderIdentified {
                instruments: 1,
                endogenous: 2
            })
        ));
    }

    #[test]
    fn test_design_rejects_ragged_blocks() {
        let y = Col::zeros(10);
        let result = IvDesign::new(y, Mat::zeros(9, 1), Mat::zeros(10, 1), Mat::zeros(10, 1));
        assert!(matches!(result, Err(RegressionError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_just_identified_matches_wald_ratio() {
        // Without controls, β = cov(z, y) / cov(z, d)
        let n = 200;
        let z = Mat::from_fn(n, 1, |i, _| noise(i, 1));
        let d = Mat::from_fn(n, 1, |i, _| 0.8 * z[(i, 0)] + noise(i, 2));
        let y = Col::from_fn(n, |i| 1.0 + 2.0 * d[(i, 0)] + noise(i, 3));

        let design = IvDesign::new(y.clone(), Mat::zeros(n, 0), d.clone(), z.clone()).unwrap();
        let fitted = TwoStageLeastSquares::default().fit(&design).unwrap();

        let mean = |f: &dyn Fn(usize) -> f64| (0..n).map(f).sum::<f64>() / n as f64;
        let (zm, dm, ym) = (mean(&|i| z[(i, 0)]), mean(&|i| d[(i, 0)]), mean(&|i| y[i]));
        let cov_zy: f64 = (0..n).map(|i| (z[(i, 0)] - zm) * (y[i] - ym)).sum();
        let cov_zd: f64 = (0..n).map(|i| (z[(i, 0)] - zm) * (d[(i, 0)] - dm)).sum();

        assert!((fitted.endogenous_params()[0] - cov_zy / cov_zd).abs() < 1e-8);
        assert_eq!(fitted.result().n_parameters(), 2);
    }

    #[test]
    fn test_unadjusted_covariance_is_scaled_bread() {
        let n = 100;
        let z = Mat::from_fn(n, 2, |i, j| noise(i, j + 10));
        let d = Mat::from_fn(n, 1, |i, _| z[(i, 0)] - z[(i, 1)] + noise(i, 20));
        let y = Col::from_fn(n, |i| 0.5 * d[(i, 0)] + noise(i, 30));
        let design = IvDesign::new(y, Mat::zeros(n, 0), d, z).unwrap();

        let robust = TwoStageLeastSquares::builder().build().fit(&design).unwrap();
        let plain = TwoStageLeastSquares::builder()
            .covariance(CovarianceType::Unadjusted)
            .build()
            .fit(&design)
            .unwrap();

        // Point estimates do not depend on the covariance estimator
        assert!((robust.params()[1] - plain.params()[1]).abs() < 1e-12);
        assert_eq!(plain.result().covariance_type, CovarianceType::Unadjusted);
        assert!(plain.result().std_errors[1] > 0.0);
        assert!(robust.result().std_errors[1] > 0.0);
    }

    #[test]
    fn test_insufficient_observations() {
        let design = IvDesign::new(
            Col::zeros(3),
            Mat::zeros(3, 1),
            Mat::zeros(3, 1),
            Mat::zeros(3, 1),
        )
        .unwrap();
        let result = TwoStageLeastSquares::default().fit(&design);
        assert!(matches!(
            result,
            Err(RegressionError::InsufficientObservations { needed: 4, got: 3 })
        ));
    }
}
