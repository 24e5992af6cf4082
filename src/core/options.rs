//! Estimator and diagnostics configuration.

use super::na_action::NaAction;
use thiserror::Error;

/// Covariance estimator for instrumental-variable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarianceType {
    /// Heteroskedasticity-robust sandwich (HC0, no small-sample correction).
    #[default]
    Robust,
    /// Homoskedastic covariance `σ² (X̂'X̂)⁻¹` with `σ² = e'e / n`.
    Unadjusted,
}

impl CovarianceType {
    /// Label used in model summaries.
    pub fn label(&self) -> &'static str {
        match self {
            CovarianceType::Robust => "Robust",
            CovarianceType::Unadjusted => "Unadjusted",
        }
    }
}

/// Configuration options for the regression estimators.
#[derive(Debug, Clone)]
pub struct RegressionOptions {
    /// Whether to include an intercept term (default: true).
    pub with_intercept: bool,
    /// Whether to compute standard errors and inference statistics (default: true).
    pub compute_inference: bool,
    /// Confidence level for confidence intervals (default: 0.95).
    pub confidence_level: f64,
    /// Rank tolerance for QR decomposition.
    pub rank_tolerance: f64,
    /// Covariance estimator for IV models (ignored by OLS).
    pub covariance: CovarianceType,
}

impl Default for RegressionOptions {
    fn default() -> Self {
        Self {
            with_intercept: true,
            compute_inference: true,
            confidence_level: 0.95,
            rank_tolerance: 1e-10,
            covariance: CovarianceType::Robust,
        }
    }
}

/// Errors that can occur when validating options.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("confidence_level must be in (0, 1), got {0}")]
    InvalidConfidenceLevel(f64),
    #[error("rank_tolerance must be positive, got {0}")]
    InvalidRankTolerance(f64),
}

fn check_confidence_level(level: f64) -> Result<(), OptionsError> {
    if level <= 0.0 || level >= 1.0 || level.is_nan() {
        return Err(OptionsError::InvalidConfidenceLevel(level));
    }
    Ok(())
}

fn check_rank_tolerance(tol: f64) -> Result<(), OptionsError> {
    if tol <= 0.0 || tol.is_nan() {
        return Err(OptionsError::InvalidRankTolerance(tol));
    }
    Ok(())
}

impl RegressionOptions {
    /// Create a new builder for regression options.
    pub fn builder() -> RegressionOptionsBuilder {
        RegressionOptionsBuilder::default()
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_confidence_level(self.confidence_level)?;
        check_rank_tolerance(self.rank_tolerance)
    }
}

/// Builder for `RegressionOptions`.
#[derive(Debug, Clone, Default)]
pub struct RegressionOptionsBuilder {
    options: RegressionOptions,
}

impl RegressionOptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to include an intercept term.
    pub fn with_intercept(mut self, include: bool) -> Self {
        self.options.with_intercept = include;
        self
    }

    /// Set whether to compute inference statistics.
    pub fn compute_inference(mut self, compute: bool) -> Self {
        self.options.compute_inference = compute;
        self
    }

    /// Set the confidence level for confidence intervals.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.options.confidence_level = level;
        self
    }

    /// Set the rank tolerance for QR decomposition.
    pub fn rank_tolerance(mut self, tol: f64) -> Self {
        self.options.rank_tolerance = tol;
        self
    }

    /// Set the covariance estimator used by IV models.
    pub fn covariance(mut self, covariance: CovarianceType) -> Self {
        self.options.covariance = covariance;
        self
    }

    /// Build and validate the options.
    pub fn build(self) -> Result<RegressionOptions, OptionsError> {
        self.options.validate()?;
        Ok(self.options)
    }

    /// Build the options without validation.
    pub fn build_unchecked(self) -> RegressionOptions {
        self.options
    }
}

/// Options controlling an IV validity run.
#[derive(Debug, Clone)]
pub struct DiagnosticsOptions {
    /// Print the per-test narrative to stdout (default: true).
    pub verbose: bool,
    /// What to do with rows that have missing values (default: `Omit`).
    pub na_action: NaAction,
    /// Covariance estimator for the 2SLS and GMM fits (default: `Robust`).
    pub covariance: CovarianceType,
    /// Confidence level for reported intervals (default: 0.95).
    pub confidence_level: f64,
    /// Rank tolerance for QR decomposition and matrix inversion.
    pub rank_tolerance: f64,
}

impl Default for DiagnosticsOptions {
    fn default() -> Self {
        Self {
            verbose: true,
            na_action: NaAction::Omit,
            covariance: CovarianceType::Robust,
            confidence_level: 0.95,
            rank_tolerance: 1e-10,
        }
    }
}

impl DiagnosticsOptions {
    /// Create a new builder for diagnostics options.
    pub fn builder() -> DiagnosticsOptionsBuilder {
        DiagnosticsOptionsBuilder::default()
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_confidence_level(self.confidence_level)?;
        check_rank_tolerance(self.rank_tolerance)
    }

    /// Options for the OLS fits used by the tests.
    pub fn ols_options(&self) -> RegressionOptions {
        RegressionOptions::builder()
            .with_intercept(true)
            .confidence_level(self.confidence_level)
            .rank_tolerance(self.rank_tolerance)
            .build_unchecked()
    }

    /// Options for the 2SLS and GMM fits.
    pub fn iv_options(&self) -> RegressionOptions {
        RegressionOptions::builder()
            .with_intercept(true)
            .confidence_level(self.confidence_level)
            .rank_tolerance(self.rank_tolerance)
            .covariance(self.covariance)
            .build_unchecked()
    }
}

/// Builder for `DiagnosticsOptions`.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsOptionsBuilder {
    options: DiagnosticsOptions,
}

impl DiagnosticsOptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the per-test narrative is printed.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    /// Set the missing-value policy.
    pub fn na_action(mut self, action: NaAction) -> Self {
        self.options.na_action = action;
        self
    }

    /// Set the covariance estimator for IV fits.
    pub fn covariance(mut self, covariance: CovarianceType) -> Self {
        self.options.covariance = covariance;
        self
    }

    /// Set the confidence level for reported intervals.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.options.confidence_level = level;
        self
    }

    /// Set the rank tolerance.
    pub fn rank_tolerance(mut self, tol: f64) -> Self {
        self.options.rank_tolerance = tol;
        self
    }

    /// Build and validate the options.
    pub fn build(self) -> Result<DiagnosticsOptions, OptionsError> {
        self.options.validate()?;
        Ok(self.options)
    }
}
