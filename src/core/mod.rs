//! Core types: options, results and missing value handling.

mod na_action;
mod options;
mod result;

pub use na_action::{NaAction, NaError, NaHandler, NaInfo, NaResult};
pub use options::{
    CovarianceType, DiagnosticsOptions, DiagnosticsOptionsBuilder, OptionsError,
    RegressionOptions, RegressionOptionsBuilder,
};
pub use result::{IvResult, RegressionResult};
