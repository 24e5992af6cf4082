//! Named numeric columns loaded from CSV.

use faer::{Col, Mat};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Cell values read as missing (compared case-insensitively after trimming).
const MISSING_TOKENS: [&str; 4] = ["", "na", "nan", "null"];

/// Errors raised while loading or querying a dataset.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    #[error("column '{name}' has {got} values, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// A row-aligned table of named `f64` columns.
///
/// Columns whose cells do not all parse as numbers are remembered by name but
/// not stored; asking for them yields `DataError::NonNumericColumn`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    non_numeric: Vec<String>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from `(name, values)` pairs.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Vec<f64>)>,
    ) -> Result<Self, DataError> {
        let mut dataset = Self::default();
        for (name, values) in columns {
            dataset.add_column(name, values)?;
        }
        Ok(dataset)
    }

    /// Load a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| DataError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let dataset = Self::from_csv_reader(reader)?;
        debug!(
            path = %path.display(),
            rows = dataset.n_rows(),
            columns = dataset.n_columns(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Load CSV data with a header row from any reader.
    pub fn from_reader<R: Read>(input: R) -> Result<Self, DataError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);
        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DataError> {
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
        let mut numeric = vec![true; headers.len()];

        for record in reader.records() {
            let record = record?;
            for (j, field) in record.iter().enumerate().take(headers.len()) {
                let value = parse_cell(field);
                if value.is_none() {
                    numeric[j] = false;
                }
                cells[j].push(value);
            }
        }

        let mut dataset = Self::default();
        for ((name, column), is_numeric) in headers.into_iter().zip(cells).zip(numeric) {
            if is_numeric {
                let values = column.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                dataset.add_column(name, values)?;
            } else {
                dataset.non_numeric.push(name);
            }
        }

        Ok(dataset)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of numeric columns.
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Names of the numeric columns, in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Values of a numeric column.
    pub fn column(&self, name: &str) -> Result<&[f64], DataError> {
        match self.position(name) {
            Some(j) => Ok(&self.columns[j]),
            None if self.non_numeric.iter().any(|n| n == name) => {
                Err(DataError::NonNumericColumn(name.to_string()))
            }
            None => Err(DataError::UnknownColumn(name.to_string())),
        }
    }

    /// A numeric column as a faer vector.
    pub fn column_vec(&self, name: &str) -> Result<Col<f64>, DataError> {
        let values = self.column(name)?;
        Ok(Col::from_fn(values.len(), |i| values[i]))
    }

    /// Stack the named columns into an `n_rows x names.len()` matrix.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Mat<f64>, DataError> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Mat::from_fn(self.n_rows, columns.len(), |i, j| columns[j][i]))
    }

    /// Add a column, replacing any existing column of the same name.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), DataError> {
        let name = name.into();
        if !self.names.is_empty() && values.len() != self.n_rows {
            return Err(DataError::RaggedColumn {
                name,
                expected: self.n_rows,
                got: values.len(),
            });
        }

        self.n_rows = values.len();
        self.non_numeric.retain(|n| *n != name);
        match self.position(&name) {
            Some(j) => self.columns[j] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Parse one cell: missing tokens become NaN, anything else must be a number.
fn parse_cell(field: &str) -> Option<f64> {
    let field = field.trim();
    if MISSING_TOKENS
        .iter()
        .any(|token| field.eq_ignore_ascii_case(token))
    {
        return Some(f64::NAN);
    }
    field.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id,name,score,count
1,alpha,0.5,10
2,beta,NA,
3,gamma,1.5,null
";

    #[test]
    fn test_reader_marks_missing_cells() {
        let data = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data.n_rows(), 3);
        assert_eq!(data.column_names(), ["id", "score", "count"]);

        let score = data.column("score").unwrap();
        assert_eq!(score[0], 0.5);
        assert!(score[1].is_nan());

        let count = data.column("count").unwrap();
        assert!(count[1].is_nan() && count[2].is_nan());
    }

    #[test]
    fn test_text_column_is_not_numeric() {
        let data = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(data.column("name"), Err(DataError::NonNumericColumn(_))));
        assert!(matches!(data.column("missing"), Err(DataError::UnknownColumn(_))));
    }

    #[test]
    fn test_select_orders_columns() {
        let data = Dataset::from_columns([("a", vec![1.0, 2.0]), ("b", vec![3.0, 4.0])]).unwrap();
        let m = data.select(&["b", "a"]).unwrap();
        assert_eq!(m.ncols(), 2);
        assert_eq!(m[(0, 0)], 3.0);
        assert_eq!(m[(1, 1)], 2.0);
    }

    #[test]
    fn test_add_column_checks_length_and_replaces() {
        let mut data = Dataset::from_columns([("a", vec![1.0, 2.0])]).unwrap();
        assert!(matches!(
            data.add_column("b", vec![1.0]),
            Err(DataError::RaggedColumn { expected: 2, got: 1, .. })
        ));

        data.add_column("a", vec![5.0, 6.0]).unwrap();
        assert_eq!(data.n_columns(), 1);
        assert_eq!(data.column("a").unwrap(), [5.0, 6.0]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Dataset::from_csv_path("no/such/file.csv").unwrap_err();
        assert!(err.to_string().contains("no/such/file.csv"));
    }
}
