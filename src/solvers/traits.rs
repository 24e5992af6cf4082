//! Core traits for regression estimators.

use crate::core::{IvResult, RegressionResult};
use faer::{Col, Mat};
use thiserror::Error;

use super::iv::IvDesign;

/// Errors that can occur during regression fitting.
#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("dimension mismatch: X has {x_rows} rows but y has {y_len} elements")]
    DimensionMismatch { x_rows: usize, y_len: usize },

    #[error("insufficient observations: need at least {needed}, got {got}")]
    InsufficientObservations { needed: usize, got: usize },

    #[error("matrix is singular or nearly singular")]
    SingularMatrix,

    #[error("all features are constant")]
    AllFeaturesConstant,

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] crate::core::OptionsError),

    #[error("model is under-identified: {instruments} instruments for {endogenous} endogenous regressors")]
    UnderIdentified {
        instruments: usize,
        endogenous: usize,
    },

    #[error("numerical error: {0}")]
    NumericalError(String),
}

/// A regression estimator that can be fit to data.
///
/// Fitting returns a fitted model holding its results.
pub trait Regressor {
    /// The type of the fitted model.
    type Fitted: FittedRegressor;

    /// Fit the model to the data.
    ///
    /// # Arguments
    /// * `x` - Design matrix of shape (n_samples, n_features)
    /// * `y` - Target vector of length n_samples
    fn fit(&self, x: &Mat<f64>, y: &Col<f64>) -> Result<Self::Fitted, RegressionError>;
}

/// A fitted regression model.
pub trait FittedRegressor {
    /// Access the regression results (coefficients, statistics, etc.).
    fn result(&self) -> &RegressionResult;

    /// Get the coefficients (convenience method).
    fn coefficients(&self) -> &Col<f64> {
        &self.result().coefficients
    }

    /// Get the intercept (convenience method).
    fn intercept(&self) -> Option<f64> {
        self.result().intercept
    }

    /// Get R² (convenience method).
    fn r_squared(&self) -> f64 {
        self.result().r_squared
    }
}

/// An instrumental-variable estimator.
pub trait IvEstimator {
    /// The type of the fitted model.
    type Fitted: FittedIv;

    /// Fit the structural equation described by `design`.
    fn fit(&self, design: &IvDesign) -> Result<Self::Fitted, RegressionError>;
}

/// A fitted instrumental-variable model.
pub trait FittedIv {
    /// Access the estimation results.
    fn result(&self) -> &IvResult;

    /// Parameter estimates, intercept first.
    fn params(&self) -> &Col<f64> {
        &self.result().params
    }

    /// Coefficients of the endogenous regressors.
    fn endogenous_params(&self) -> Col<f64> {
        let result = self.result();
        let offset = result.endogenous_offset();
        Col::from_fn(result.n_endogenous, |j| result.params[offset + j])
    }
}
