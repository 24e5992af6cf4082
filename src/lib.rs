//! Instrumental-variable validity diagnostics.
//!
//! This library checks the three identification conditions of an IV design
//! (relevance, exclusion restriction and exchangeability) and estimates the
//! structural equation by two-stage least squares, with robust standard
//! errors, z-statistics, p-values and confidence intervals.
//!
//! # Example
//!
//! ```rust,ignore
//! use iv_validity::prelude::*;
//!
//! let data = Dataset::from_csv_path("data/output/study.csv")?;
//! let roles = VariableRoles::new("y", ["d"], ["z1", "z2"]).with_controls(["w"]);
//!
//! let mut tests = IvValidityTests::new(&data, roles, DiagnosticsOptions::default())?;
//! tests.run_all_tests()?;
//! let estimate = tests.estimate_2sls()?;
//! println!("effect of d = {:?}", estimate.param("d"));
//! println!("{}", tests.summary_table());
//! ```

pub mod core;
pub mod data;
pub mod diagnostics;
pub mod inference;
pub mod scenarios;
pub mod solvers;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        CovarianceType, DiagnosticsOptions, DiagnosticsOptionsBuilder, IvResult, NaAction,
        NaError, NaHandler, NaInfo, RegressionOptions, RegressionOptionsBuilder,
        RegressionResult,
    };
    pub use crate::data::{prepare_review_features, DataError, Dataset};
    pub use crate::diagnostics::{
        CompositeVerdict, DiagnosticResults, DiagnosticsError, IvValidityTests, SummaryTable,
        VariableRoles,
    };
    pub use crate::inference::{CoefficientRow, JointFTest};
    pub use crate::solvers::{
        FittedIv, FittedRegressor, IvDesign, IvEstimator, IvGmm, OlsRegressor, Regressor,
        TwoStageLeastSquares,
    };
    pub use crate::utils::safe_float;
}

pub use crate::core::{DiagnosticsOptions, NaAction, RegressionOptions};
pub use crate::data::Dataset;
pub use crate::diagnostics::{IvValidityTests, VariableRoles};
