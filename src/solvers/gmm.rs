//! Two-step efficient IV-GMM estimator with the Hansen J statistic.

use crate::core::{CovarianceType, IvResult, RegressionOptions, RegressionOptionsBuilder};
use crate::inference::chi_squared_upper_tail;
use crate::solvers::iv::{assemble_result, IvDesign};
use crate::solvers::traits::{FittedIv, IvEstimator, RegressionError};
use crate::utils::{col_as_mat, invert, safe_float, weighted_outer_sum};
use faer::{Col, Mat};

/// Hansen's J test of overidentifying restrictions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HansenJ {
    /// `J = n ḡ' S⁻¹ ḡ` at the final GMM estimate.
    pub statistic: f64,
    /// Upper-tail chi-square p-value (NaN when exactly identified).
    pub p_value: f64,
    /// Degrees of freedom: excluded instruments minus endogenous regressors.
    pub df: usize,
}

/// Two-step efficient GMM.
///
/// Step one uses `W = (Z'Z/n)⁻¹`, which reproduces 2SLS. Step two re-weights
/// with the inverse of the moment covariance `S` evaluated at the step-one
/// residuals. With `CovarianceType::Robust`, `S = (1/n) Σ e_i² z_i z_i'`; with
/// `Unadjusted`, `S = σ² Z'Z/n`, which makes the estimator equal to 2SLS and
/// the J statistic equal to Sargan's.
#[derive(Debug, Clone, Default)]
pub struct IvGmm {
    options: RegressionOptions,
}

impl IvGmm {
    /// Create a new GMM estimator with the given options.
    pub fn new(options: RegressionOptions) -> Self {
        Self { options }
    }

    /// Create a builder for configuring the estimator.
    pub fn builder() -> IvGmmBuilder {
        IvGmmBuilder::default()
    }

    /// `β = (X'Z W Z'X)⁻¹ X'Z W Z'y`
    fn weighted_step(
        &self,
        x: &Mat<f64>,
        z: &Mat<f64>,
        y: &Col<f64>,
        weight: &Mat<f64>,
    ) -> Result<Col<f64>, RegressionError> {
        let zx = z.transpose() * x;
        let zy = z.transpose() * y;
        let xzw = zx.transpose() * weight;
        let lhs = invert(&(&xzw * &zx), self.options.rank_tolerance)?;
        Ok(&lhs * &(&xzw * &zy))
    }

    /// Moment covariance `S` at residuals `e`.
    fn moment_covariance(&self, z: &Mat<f64>, residuals: &Col<f64>) -> Mat<f64> {
        let n = z.nrows() as f64;
        match self.options.covariance {
            CovarianceType::Robust => {
                let s = weighted_outer_sum(z, residuals);
                Mat::from_fn(s.nrows(), s.ncols(), |i, j| s[(i, j)] / n)
            }
            CovarianceType::Unadjusted => {
                let sigma2 = residuals.iter().map(|&e| e * e).sum::<f64>() / n;
                let ztz = z.transpose() * z;
                Mat::from_fn(ztz.nrows(), ztz.ncols(), |i, j| sigma2 * ztz[(i, j)] / n)
            }
        }
    }
}

impl IvEstimator for IvGmm {
    type Fitted = FittedGmm;

    fn fit(&self, design: &IvDesign) -> Result<Self::Fitted, RegressionError> {
        self.options.validate()?;

        let (x, z) = design.matrices(self.options.with_intercept)?;
        let y = design.y();
        let n = y.nrows() as f64;
        let tol = self.options.rank_tolerance;

        let ztz = z.transpose() * &z;
        let initial_weight = invert(
            &Mat::from_fn(ztz.nrows(), ztz.ncols(), |i, j| ztz[(i, j)] / n),
            tol,
        )?;
        let initial = self.weighted_step(&x, &z, y, &initial_weight)?;
        let initial_residuals = residuals_at(&x, y, &initial);

        let weight = invert(&self.moment_covariance(&z, &initial_residuals), tol)?;
        let params = self.weighted_step(&x, &z, y, &weight)?;
        let fitted_values = &x * &params;
        let residuals = Col::from_fn(y.nrows(), |i| y[i] - fitted_values[i]);

        // Final moment covariance is re-estimated at the efficient residuals
        let s = self.moment_covariance(&z, &residuals);
        let s_inv = invert(&s, tol)?;

        let g_bar = col_as_mat(&Col::from_fn(z.ncols(), |j| {
            (0..y.nrows()).map(|i| z[(i, j)] * residuals[i]).sum::<f64>() / n
        }));
        let quad = &(g_bar.transpose() * &s_inv) * &g_bar;
        let statistic =
            n * safe_float(&quad).map_err(|e| RegressionError::NumericalError(e.to_string()))?;

        let df = design.n_instruments() - design.n_endogenous();
        let j_stat = HansenJ {
            statistic,
            p_value: chi_squared_upper_tail(statistic, df as f64),
            df,
        };

        // Sandwich (G'WG)⁻¹ G'WSWG (G'WG)⁻¹ / n with G = Z'X / n
        let zx = z.transpose() * &x;
        let g = Mat::from_fn(zx.nrows(), zx.ncols(), |i, j| zx[(i, j)] / n);
        let gtw = g.transpose() * &weight;
        let bread = invert(&(&gtw * &g), tol)?;
        let meat = &(&(&gtw * &s) * &weight) * &g;
        let sandwich = &(&bread * &meat) * &bread;
        let covariance =
            Mat::from_fn(sandwich.nrows(), sandwich.ncols(), |i, j| sandwich[(i, j)] / n);

        let result = assemble_result(
            design,
            &self.options,
            params,
            covariance,
            fitted_values,
            residuals,
        );

        Ok(FittedGmm {
            options: self.options.clone(),
            result,
            j_stat,
        })
    }
}

fn residuals_at(x: &Mat<f64>, y: &Col<f64>, params: &Col<f64>) -> Col<f64> {
    let fitted = x * params;
    Col::from_fn(y.nrows(), |i| y[i] - fitted[i])
}

/// A fitted two-step GMM model.
#[derive(Debug, Clone)]
pub struct FittedGmm {
    options: RegressionOptions,
    result: IvResult,
    j_stat: HansenJ,
}

impl FittedGmm {
    /// Get the options used to fit this model.
    pub fn options(&self) -> &RegressionOptions {
        &self.options
    }

    /// Hansen's J test of the overidentifying restrictions.
    pub fn j_stat(&self) -> HansenJ {
        self.j_stat
    }
}

impl FittedIv for FittedGmm {
    fn result(&self) -> &IvResult {
        &self.result
    }
}

/// Builder for `IvGmm`.
#[derive(Debug, Clone, Default)]
pub struct IvGmmBuilder {
    builder: RegressionOptionsBuilder,
}

impl IvGmmBuilder {
    /// Set whether to include an intercept term.
    pub fn with_intercept(mut self, include: bool) -> Self {
        self.builder = self.builder.with_intercept(include);
        self
    }

    /// Set the moment covariance estimator.
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
    pub fn build(self) -> IvGmm {
        IvGmm::new(self.builder.build_unchecked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::TwoStageLeastSquares;

    fn noise(i: usize, salt: usize) -> f64 {
        let mut h = (i as u64)
            .wrapping_mul(6364136223846793005)
            .wrapping_add((salt as u64 + 1).wrapping_mul(1442695040888963407));
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51afd7ed558ccd);
        h ^= h >> 33;
        (h >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }

    fn design(n_instruments: usize) -> IvDesign {
        let n = 150;
        let z = Mat::from_fn(n, n_instruments, |i, j| noise(i, j + 1));
        let w = Mat::from_fn(n, 1, |i, _| noise(i, 40));
        let d = Mat::from_fn(n, 1, |i, _| {
            (0..n_instruments).map(|j| z[(i, j)]).sum::<f64>() + 0.3 * w[(i, 0)] + noise(i, 50)
        });
        let y = Col::from_fn(n, |i| 1.0 + 1.5 * d[(i, 0)] - 0.5 * w[(i, 0)] + noise(i, 60));
        IvDesign::new(y, w, d, z).unwrap()
    }

    #[test]
    fn test_exactly_identified_equals_2sls_with_zero_j() {
        let design = design(1);
        let gmm = IvGmm::default().fit(&design).unwrap();
        let tsls = TwoStageLeastSquares::default().fit(&design).unwrap();

        for j in 0..gmm.params().nrows() {
            assert!((gmm.params()[j] - tsls.params()[j]).abs() < 1e-8);
        }
        let j_stat = gmm.j_stat();
        assert_eq!(j_stat.df, 0);
        assert!(j_stat.statistic.abs() < 1e-8);
        assert!(j_stat.p_value.is_nan());
    }

    #[test]
    fn test_overidentified_j_has_valid_p_value() {
        let gmm = IvGmm::default().fit(&design(3)).unwrap();
        let j_stat = gmm.j_stat();
        assert_eq!(j_stat.df, 2);
        assert!(j_stat.statistic >= 0.0);
        assert!(j_stat.p_value > 0.0 && j_stat.p_value <= 1.0);
        assert!((gmm.endogenous_params()[0] - 1.5).abs() < 0.5);
    }

    #[test]
    fn test_unadjusted_weighting_reproduces_2sls() {
        let design = design(2);
        let gmm = IvGmm::builder()
            .covariance(CovarianceType::Unadjusted)
            .build()
            .fit(&design)
            .unwrap();
        let tsls = TwoStageLeastSquares::default().fit(&design).unwrap();
        assert!((gmm.endogenous_params()[0] - tsls.endogenous_params()[0]).abs() < 1e-8);
    }
}
