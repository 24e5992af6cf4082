//! Missing value handling for the analysis table.
//!
//! A row is missing when any variable of interest is NaN or infinite. Two
//! policies are supported:
//! - `Omit`: drop the row (listwise deletion)
//! - `Fail`: return an error if any row is missing
//!
//! # Example
//!
//! ```
//! use iv_validity::core::{NaAction, NaHandler};
//! use faer::Mat;
//!
//! let x = Mat::from_fn(5, 2, |i, j| if i == 2 { f64::NAN } else { (i + j) as f64 });
//!
//! let result = NaHandler::process(&x, NaAction::Omit).unwrap();
//! assert_eq!(result.clean.nrows(), 4);
//! ```

use faer::Mat;
use thiserror::Error;

/// Action to take when missing values are encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NaAction {
    /// Remove rows containing missing values.
    #[default]
    Omit,

    /// Return an error if any missing values are present.
    Fail,
}

/// Errors raised by missing value handling.
#[derive(Debug, Error)]
pub enum NaError {
    /// Missing values found in input data when using `NaAction::Fail`.
    #[error("missing values found in data: {n_na} rows contain missing values")]
    NaValuesPresent { n_na: usize },

    /// All observations were removed due to missing values.
    #[error("all observations contain missing values")]
    AllNa,
}

/// Information about the missing value handling that was applied.
#[derive(Debug, Clone)]
pub struct NaInfo {
    /// Number of rows before removal.
    pub n_original: usize,

    /// Number of rows kept.
    pub n_clean: usize,

    /// Indices of rows that were kept.
    pub kept_indices: Vec<usize>,

    /// Number of rows removed.
    pub n_removed: usize,

    /// The action that was applied.
    pub action: NaAction,
}

impl NaInfo {
    /// Check if any rows were removed.
    pub fn has_removed(&self) -> bool {
        self.n_removed > 0
    }

    fn no_na(n_observations: usize, action: NaAction) -> Self {
        Self {
            n_original: n_observations,
            n_clean: n_observations,
            kept_indices: (0..n_observations).collect(),
            n_removed: 0,
            action,
        }
    }
}

/// Result of missing value preprocessing.
#[derive(Debug, Clone)]
pub struct NaResult {
    /// Matrix with missing rows removed.
    pub clean: Mat<f64>,

    /// Information about the rows that were removed.
    pub na_info: NaInfo,
}

/// Handler for missing value processing.
pub struct NaHandler;

impl NaHandler {
    /// Process a table of variables according to the specified action.
    ///
    /// # Errors
    ///
    /// - `NaError::NaValuesPresent` if `action` is `Fail` and missing rows exist
    /// - `NaError::AllNa` if every row is missing (and there is at least one row)
    pub fn process(x: &Mat<f64>, action: NaAction) -> Result<NaResult, NaError> {
        let n_samples = x.nrows();
        let na_mask = Self::find_na_rows(x);
        let n_na = na_mask.iter().filter(|&&v| v).count();

        if n_na == 0 {
            return Ok(NaResult {
                clean: x.clone(),
                na_info: NaInfo::no_na(n_samples, action),
            });
        }

        match action {
            NaAction::Fail => Err(NaError::NaValuesPresent { n_na }),
            NaAction::Omit => {
                if n_na == n_samples {
                    return Err(NaError::AllNa);
                }

                let kept_indices: Vec<usize> = na_mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &had_na)| if !had_na { Some(i) } else { None })
                    .collect();

                let n_clean = kept_indices.len();
                let clean = Mat::from_fn(n_clean, x.ncols(), |i, j| x[(kept_indices[i], j)]);

                Ok(NaResult {
                    clean,
                    na_info: NaInfo {
                        n_original: n_samples,
                        n_clean,
                        kept_indices,
                        n_removed: n_na,
                        action,
                    },
                })
            }
        }
    }

    /// Rows where any entry is NaN or infinite.
    fn find_na_rows(x: &Mat<f64>) -> Vec<bool> {
        (0..x.nrows())
            .map(|i| (0..x.ncols()).any(|j| !x[(i, j)].is_finite()))
            .collect()
    }

    /// Check if a matrix contains any missing values.
    pub fn has_na(x: &Mat<f64>) -> bool {
        Self::find_na_rows(x).into_iter().any(|v| v)
    }
}
