//! Regression result structures.

use super::options::CovarianceType;
use faer::{Col, Mat};

/// Complete result from an OLS fit.
///
/// Contains coefficients, fit statistics, and optionally inference statistics
/// (standard errors, t-statistics, p-values, confidence intervals).
#[derive(Debug, Clone)]
pub struct RegressionResult {
    // ========== Core Results ==========
    /// Estimated coefficients (excluding intercept).
    /// Aliased (collinear) coefficients are set to NaN.
    pub coefficients: Col<f64>,

    /// Intercept term (if model was fit with intercept).
    pub intercept: Option<f64>,

    /// Residuals (y - fitted_values).
    pub residuals: Col<f64>,

    /// Fitted values (predictions on training data).
    pub fitted_values: Col<f64>,

    // ========== Rank Information ==========
    /// Numerical rank of the design matrix.
    pub rank: usize,

    /// Number of parameters (including intercept if present).
    pub n_parameters: usize,

    /// Number of observations.
    pub n_observations: usize,

    /// Indicates which coefficients are aliased (perfectly collinear).
    pub aliased: Vec<bool>,

    /// Tolerance used for rank determination.
    pub rank_tolerance: f64,

    // ========== Fit Statistics ==========
    /// Coefficient of determination (R²).
    pub r_squared: f64,

    /// Adjusted R².
    pub adj_r_squared: f64,

    /// Root mean squared error.
    pub rmse: f64,

    /// Mean squared error.
    pub mse: f64,

    /// F-statistic for overall model significance.
    pub f_statistic: f64,

    /// P-value for F-statistic.
    pub f_pvalue: f64,

    // ========== Inference Statistics (Optional) ==========
    /// Standard errors of coefficients.
    pub std_errors: Option<Col<f64>>,

    /// Standard error of intercept.
    pub intercept_std_error: Option<f64>,

    /// t-statistics for coefficients.
    pub t_statistics: Option<Col<f64>>,

    /// t-statistic for intercept.
    pub intercept_t_statistic: Option<f64>,

    /// P-values for coefficient significance tests.
    pub p_values: Option<Col<f64>>,

    /// P-value for intercept.
    pub intercept_p_value: Option<f64>,

    /// Lower bounds of confidence intervals.
    pub conf_interval_lower: Option<Col<f64>>,

    /// Upper bounds of confidence intervals.
    pub conf_interval_upper: Option<Col<f64>>,

    /// Confidence level used for intervals.
    pub confidence_level: f64,
}

impl RegressionResult {
    /// Create a new empty result (used internally by solvers).
    pub(crate) fn empty(n_features: usize, n_observations: usize) -> Self {
        Self {
            coefficients: Col::zeros(n_features),
            intercept: None,
            residuals: Col::zeros(n_observations),
            fitted_values: Col::zeros(n_observations),
            rank: 0,
            n_parameters: 0,
            n_observations,
            aliased: vec![false; n_features],
            rank_tolerance: 1e-10,
            r_squared: 0.0,
            adj_r_squared: 0.0,
            rmse: 0.0,
            mse: 0.0,
            f_statistic: 0.0,
            f_pvalue: 1.0,
            std_errors: None,
            intercept_std_error: None,
            t_statistics: None,
            intercept_t_statistic: None,
            p_values: None,
            intercept_p_value: None,
            conf_interval_lower: None,
            conf_interval_upper: None,
            confidence_level: 0.95,
        }
    }

    /// Residual degrees of freedom (n - p).
    pub fn residual_df(&self) -> usize {
        self.n_observations.saturating_sub(self.n_parameters)
    }

    /// Check if any coefficients are aliased.
    pub fn has_aliased(&self) -> bool {
        self.aliased.iter().any(|&a| a)
    }

    /// Get coefficient value, returning None for aliased coefficients.
    pub fn get_coefficient(&self, index: usize) -> Option<f64> {
        if index < self.coefficients.nrows() && !self.aliased[index] {
            Some(self.coefficients[index])
        } else {
            None
        }
    }

    /// Residual sum of squares (RSS).
    pub fn rss(&self) -> f64 {
        self.residuals.iter().map(|&r| r.powi(2)).sum()
    }
}

/// Result of an instrumental-variable fit (2SLS or GMM).
///
/// Parameters are ordered as the design `[1 | exogenous | endogenous]`; the
/// intercept is always the first entry when present.
#[derive(Debug, Clone)]
pub struct IvResult {
    /// Parameter estimates.
    pub params: Col<f64>,

    /// Parameter covariance matrix.
    pub covariance: Mat<f64>,

    /// Standard errors (square roots of the covariance diagonal).
    pub std_errors: Col<f64>,

    /// z-statistics (`params / std_errors`).
    pub z_statistics: Col<f64>,

    /// Two-sided p-values from the standard normal.
    pub p_values: Col<f64>,

    /// Lower confidence bounds.
    pub conf_interval_lower: Col<f64>,

    /// Upper confidence bounds.
    pub conf_interval_upper: Col<f64>,

    /// Structural residuals `y - Xβ` (using the observed regressors).
    pub residuals: Col<f64>,

    /// Fitted values `Xβ`.
    pub fitted_values: Col<f64>,

    /// R² of the structural equation (centered when an intercept is present).
    pub r_squared: f64,

    /// Adjusted R².
    pub adj_r_squared: f64,

    /// Number of observations.
    pub n_observations: usize,

    /// Whether an intercept is included.
    pub has_intercept: bool,

    /// Number of exogenous regressors excluding the intercept.
    pub n_exogenous: usize,

    /// Number of endogenous regressors.
    pub n_endogenous: usize,

    /// Number of excluded instruments.
    pub n_instruments: usize,

    /// Covariance estimator used.
    pub covariance_type: CovarianceType,

    /// Confidence level used for intervals.
    pub confidence_level: f64,
}

impl IvResult {
    /// Total number of estimated parameters.
    pub fn n_parameters(&self) -> usize {
        self.params.nrows()
    }

    /// Degree of overidentification (excluded instruments minus endogenous).
    pub fn overidentification(&self) -> isize {
        self.n_instruments as isize - self.n_endogenous as isize
    }

    /// Index of the first endogenous parameter.
    pub fn endogenous_offset(&self) -> usize {
        usize::from(self.has_intercept) + self.n_exogenous
    }

    /// Residual sum of squares.
    pub fn rss(&self) -> f64 {
        self.residuals.iter().map(|&r| r.powi(2)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = RegressionResult::empty(3, 10);
        assert_eq!(result.coefficients.nrows(), 3);
        assert_eq!(result.n_observations, 10);
        assert_eq!(result.residual_df(), 10);
    }

    #[test]
    fn test_degrees_of_freedom() {
        let mut result = RegressionResult::empty(3, 100);
        result.n_parameters = 4; // 3 coefficients + 1 intercept
        result.intercept = Some(1.0);

        assert_eq!(result.residual_df(), 96);
    }

    #[test]
    fn test_aliased_detection() {
        let mut result = RegressionResult::empty(3, 10);
        assert!(!result.has_aliased());

        result.aliased[1] = true;
        assert!(result.has_aliased());
        assert_eq!(result.get_coefficient(1), None);
        assert_eq!(result.get_coefficient(0), Some(0.0));
        assert_eq!(result.get_coefficient(7), None);
    }

    #[test]
    fn test_rss() {
        let mut result = RegressionResult::empty(1, 3);
        result.residuals = Col::from_fn(3, |i| [0.1, -0.2, 0.0][i]);
        assert!((result.rss() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_iv_result_layout() {
        let iv = IvResult {
            params: Col::zeros(5),
            covariance: Mat::zeros(5, 5),
            std_errors: Col::zeros(5),
            z_statistics: Col::zeros(5),
            p_values: Col::zeros(5),
            conf_interval_lower: Col::zeros(5),
            conf_interval_upper: Col::zeros(5),
            residuals: Col::zeros(4),
            fitted_values: Col::zeros(4),
            r_squared: 0.0,
            adj_r_squared: 0.0,
            n_observations: 4,
            has_intercept: true,
            n_exogenous: 2,
            n_endogenous: 2,
            n_instruments: 3,
            covariance_type: CovarianceType::Robust,
            confidence_level: 0.95,
        };

        assert_eq!(iv.n_parameters(), 5);
        assert_eq!(iv.endogenous_offset(), 3);
        assert_eq!(iv.overidentification(), 1);
    }
}
