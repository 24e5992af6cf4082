//! Matrix and numeric helpers shared by the solvers.

mod matrix;
mod scalar;

pub use matrix::{
    center_columns, center_vector, col_as_mat, detect_constant_columns, hstack, invert,
    select_columns, total_sum_of_squares, weighted_outer_sum, with_intercept,
};
pub use scalar::{safe_float, ScalarError, ScalarSource};
