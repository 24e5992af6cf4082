//! Regression solvers: OLS, two-stage least squares and two-step IV-GMM.

mod gmm;
mod iv;
mod ols;
mod traits;

pub use gmm::{FittedGmm, HansenJ, IvGmm, IvGmmBuilder};
pub use iv::{FittedTwoStage, IvDesign, TwoStageLeastSquares, TwoStageLeastSquaresBuilder};
pub use ols::{FittedOls, OlsRegressor, OlsRegressorBuilder};
pub use traits::{FittedIv, FittedRegressor, IvEstimator, RegressionError, Regressor};
