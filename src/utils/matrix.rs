//! Matrix utility functions.

use crate::solvers::RegressionError;
use faer::{Col, Mat};

/// Detect columns that are constant (zero variance).
///
/// A column is constant when its range is within `tolerance` of its largest
/// magnitude, so the check does not depend on the units of the column.
pub fn detect_constant_columns(x: &Mat<f64>, tolerance: f64) -> Vec<bool> {
    let n_cols = x.ncols();
    let n_rows = x.nrows();

    if n_rows == 0 {
        return vec![true; n_cols];
    }

    (0..n_cols)
        .map(|j| {
            let (min, max, magnitude) = (0..n_rows).map(|i| x[(i, j)]).fold(
                (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
                |(lo, hi, mag), v| (lo.min(v), hi.max(v), mag.max(v.abs())),
            );
            max - min <= tolerance * magnitude
        })
        .collect()
}

/// Center a matrix by subtracting column means.
pub fn center_columns(x: &Mat<f64>) -> (Mat<f64>, Col<f64>) {
    let n_rows = x.nrows();
    let n_cols = x.ncols();

    let mut means = Col::zeros(n_cols);
    let mut centered = Mat::zeros(n_rows, n_cols);

    for j in 0..n_cols {
        let sum: f64 = (0..n_rows).map(|i| x[(i, j)]).sum();
        means[j] = sum / n_rows as f64;

        for i in 0..n_rows {
            centered[(i, j)] = x[(i, j)] - means[j];
        }
    }

    (centered, means)
}

/// Center a vector by subtracting the mean.
pub fn center_vector(y: &Col<f64>) -> (Col<f64>, f64) {
    let n = y.nrows();
    let mean: f64 = y.iter().sum::<f64>() / n as f64;

    let centered = Col::from_fn(n, |i| y[i] - mean);

    (centered, mean)
}

/// Total sum of squares around the mean.
pub fn total_sum_of_squares(y: &Col<f64>) -> f64 {
    let n = y.nrows();
    if n == 0 {
        return 0.0;
    }
    let mean: f64 = y.iter().sum::<f64>() / n as f64;
    y.iter().map(|&yi| (yi - mean).powi(2)).sum()
}

/// Prepend a column of ones: `[1 | X]`.
pub fn with_intercept(x: &Mat<f64>) -> Mat<f64> {
    Mat::from_fn(x.nrows(), x.ncols() + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            x[(i, j - 1)]
        }
    })
}

/// Concatenate matrices with equal row counts side by side.
///
/// Zero-column blocks are allowed and contribute nothing.
pub fn hstack(blocks: &[&Mat<f64>]) -> Result<Mat<f64>, RegressionError> {
    let n_rows = blocks.first().map_or(0, |b| b.nrows());
    for block in blocks {
        if block.nrows() != n_rows {
            return Err(RegressionError::DimensionMismatch {
                x_rows: n_rows,
                y_len: block.nrows(),
            });
        }
    }

    let n_cols: usize = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = Mat::zeros(n_rows, n_cols);
    let mut offset = 0;
    for block in blocks {
        for j in 0..block.ncols() {
            for i in 0..n_rows {
                out[(i, offset + j)] = block[(i, j)];
            }
        }
        offset += block.ncols();
    }

    Ok(out)
}

/// Keep the listed columns, in the given order.
pub fn select_columns(x: &Mat<f64>, columns: &[usize]) -> Mat<f64> {
    Mat::from_fn(x.nrows(), columns.len(), |i, j| x[(i, columns[j])])
}

/// Invert a square matrix through its QR decomposition.
///
/// The pivot check is relative to the largest diagonal entry of R so that
/// badly scaled cross-product matrices are not rejected spuriously.
pub fn invert(matrix: &Mat<f64>, tolerance: f64) -> Result<Mat<f64>, RegressionError> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(RegressionError::NumericalError(format!(
            "cannot invert a {}x{} matrix",
            n,
            matrix.ncols()
        )));
    }
    if n == 0 {
        return Ok(Mat::zeros(0, 0));
    }

    let qr: faer::linalg::solvers::Qr<f64> = matrix.qr();
    let q = qr.compute_Q();
    let r = qr.R();

    let scale = (0..n).map(|i| r[(i, i)].abs()).fold(0.0_f64, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return Err(RegressionError::SingularMatrix);
    }
    for i in 0..n {
        if r[(i, i)].abs() < tolerance * scale {
            return Err(RegressionError::SingularMatrix);
        }
    }

    // Back-substitute R * inv = Q' one column at a time
    let mut inv = Mat::zeros(n, n);
    let qt = q.transpose();

    for col in 0..n {
        for i in (0..n).rev() {
            let mut sum = qt[(i, col)];
            for j in (i + 1)..n {
                sum -= r[(i, j)] * inv[(j, col)];
            }
            inv[(i, col)] = sum / r[(i, i)];
        }
    }

    Ok(inv)
}

/// `Σ w_i² a_i a_i'` over the rows `a_i` of `a`: the "meat" of a sandwich estimator.
pub fn weighted_outer_sum(a: &Mat<f64>, weights: &Col<f64>) -> Mat<f64> {
    let k = a.ncols();
    let mut out = Mat::zeros(k, k);
    for i in 0..a.nrows() {
        let w2 = weights[i] * weights[i];
        for r in 0..k {
            let ar = a[(i, r)] * w2;
            for c in 0..k {
                out[(r, c)] += ar * a[(i, c)];
            }
        }
    }
    out
}

/// Turn a vector into a single-column matrix.
pub fn col_as_mat(v: &Col<f64>) -> Mat<f64> {
    Mat::from_fn(v.nrows(), 1, |i, _| v[i])
}
