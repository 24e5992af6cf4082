//! Statistical inference (standard errors, p-values, joint tests).

mod coefficient;
mod f_test;

pub use coefficient::{significance_stars, CoefficientInference, CoefficientRow};
pub use f_test::{chi_squared_upper_tail, f_upper_tail, JointFTest};
