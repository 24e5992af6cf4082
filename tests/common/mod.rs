//! Common test utilities and data generators.
#![allow(dead_code)]

use faer::{Col, Mat};
use iv_validity::data::Dataset;
use iv_validity::solvers::{FittedRegressor, OlsRegressor, Regressor};

/// Deterministic pseudo-random numbers for reproducible data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_mul(0x9e3779b97f4a7c15).wrapping_add(1),
        }
    }

    /// Uniform draw in [-1, 1).
    pub fn uniform(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64) / ((1u64 << 53) as f64) * 2.0 - 1.0
    }

    pub fn column(&mut self, n: usize) -> Col<f64> {
        Col::from_fn(n, |_| self.uniform())
    }
}

/// Residuals of `v` regressed on `on` with an intercept: orthogonal to a
/// constant and to every column of `on`.
pub fn residualize(v: &Col<f64>, on: &Mat<f64>) -> Col<f64> {
    OlsRegressor::builder()
        .with_intercept(true)
        .build()
        .fit(on, v)
        .expect("residualizing fit should succeed")
        .result()
        .residuals
        .clone()
}

pub fn to_vec(c: &Col<f64>) -> Vec<f64> {
    c.iter().copied().collect()
}

/// Column-stack a set of columns.
pub fn stack(columns: &[&Col<f64>]) -> Mat<f64> {
    let n = columns.first().map_or(0, |c| c.nrows());
    Mat::from_fn(n, columns.len(), |i, j| columns[j][i])
}

/// Generate simple linear data: y = x * beta + intercept + noise
pub fn generate_linear_data(
    n_samples: usize,
    n_features: usize,
    intercept: f64,
    noise_std: f64,
    seed: u64,
) -> (Mat<f64>, Col<f64>, Col<f64>) {
    let mut rng = Lcg::new(seed);
    let true_coefficients = Col::from_fn(n_features, |j| (j + 1) as f64);

    let mut x = Mat::zeros(n_samples, n_features);
    let mut y = Col::zeros(n_samples);
    for i in 0..n_samples {
        let mut yi = intercept;
        for j in 0..n_features {
            x[(i, j)] = rng.uniform();
            yi += x[(i, j)] * true_coefficients[j];
        }
        yi += noise_std * rng.uniform();
        y[i] = yi;
    }

    (x, y, true_coefficients)
}

/// Generate data with collinear features.
pub fn generate_collinear_data(n_samples: usize) -> (Mat<f64>, Col<f64>) {
    let mut x = Mat::zeros(n_samples, 3);
    let mut y = Col::zeros(n_samples);

    for i in 0..n_samples {
        x[(i, 0)] = i as f64;
        x[(i, 1)] = 2.0 * i as f64; // Perfectly collinear with x0
        x[(i, 2)] = (i * i) as f64;
        y[i] = 1.0 + 2.0 * x[(i, 0)] + 3.0 * x[(i, 2)];
    }

    (x, y)
}

/// A confounded IV design with `n_instruments` valid instruments.
///
/// `d = Σ z_k + 0.5 w + u + e_d` and `y = 1 + 2 d + 0.5 w + u + e_y`, so OLS
/// of `y` on `d` is biased upward by the confounder `u`.
pub struct ConfoundedDesign {
    pub y: Col<f64>,
    pub d: Col<f64>,
    pub w: Col<f64>,
    pub z: Mat<f64>,
}

pub const TRUE_EFFECT: f64 = 2.0;

pub fn confounded_design(n: usize, n_instruments: usize, seed: u64) -> ConfoundedDesign {
    let mut rng = Lcg::new(seed);
    let z = Mat::from_fn(n, n_instruments, |_, _| rng.uniform());
    let w = rng.column(n);
    let u = rng.column(n);
    let e_d = rng.column(n);
    let e_y = rng.column(n);

    let d = Col::from_fn(n, |i| {
        (0..n_instruments).map(|k| z[(i, k)]).sum::<f64>() + 0.5 * w[i] + u[i] + e_d[i]
    });
    let y = Col::from_fn(n, |i| 1.0 + TRUE_EFFECT * d[i] + 0.5 * w[i] + u[i] + e_y[i]);

    ConfoundedDesign { y, d, w, z }
}

/// A dataset in which every validity condition holds exactly in sample.
///
/// Columns: `y`, `d`, `z1..zk`, `w`. The control `w` is orthogonal to the
/// instruments and the structural error is orthogonal to every regressor and
/// instrument, so all the F and J statistics of the exclusion and
/// exchangeability tests are zero.
pub fn valid_iv_dataset(n: usize, n_instruments: usize, seed: u64) -> Dataset {
    let mut rng = Lcg::new(seed);
    let z = Mat::from_fn(n, n_instruments, |_, _| rng.uniform());
    let w = residualize(&rng.column(n), &z);
    let e_d = rng.column(n);
    let d = Col::from_fn(n, |i| {
        (0..n_instruments).map(|k| z[(i, k)]).sum::<f64>() + 0.5 * w[i] + 0.5 * e_d[i]
    });

    let mut regressors = Mat::zeros(n, n_instruments + 2);
    for i in 0..n {
        regressors[(i, 0)] = d[i];
        regressors[(i, 1)] = w[i];
        for k in 0..n_instruments {
            regressors[(i, k + 2)] = z[(i, k)];
        }
    }
    let e_y = residualize(&rng.column(n), &regressors);
    let y = Col::from_fn(n, |i| 1.0 + TRUE_EFFECT * d[i] + 0.5 * w[i] + e_y[i]);

    let mut columns = vec![("y".to_string(), to_vec(&y)), ("d".to_string(), to_vec(&d))];
    for k in 0..n_instruments {
        columns.push((format!("z{}", k + 1), (0..n).map(|i| z[(i, k)]).collect()));
    }
    columns.push(("w".to_string(), to_vec(&w)));
    Dataset::from_columns(columns).expect("columns have equal length")
}

/// Names `z1..zk`.
pub fn instrument_names(n_instruments: usize) -> Vec<String> {
    (1..=n_instruments).map(|k| format!("z{k}")).collect()
}
