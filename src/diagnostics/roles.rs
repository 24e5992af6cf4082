//! Assignment of dataset columns to their roles in an IV design.

use super::validity::DiagnosticsError;
use crate::data::{DataError, Dataset};

/// Which columns play which part in the structural equation.
///
/// # Example
///
/// ```
/// use iv_validity::diagnostics::VariableRoles;
///
/// let roles = VariableRoles::new("wage", ["education"], ["distance"])
///     .with_controls(["age", "female"]);
///
/// assert_eq!(roles.all_instruments(), vec!["distance".to_string()]);
/// assert_eq!(roles.variables().len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRoles {
    /// Outcome column.
    pub outcome: String,
    /// Endogenous regressors.
    pub endogenous: Vec<String>,
    /// Primary instruments.
    pub instruments: Vec<String>,
    /// Extra instruments appended after the primary ones.
    pub additional_instruments: Vec<String>,
    /// Exogenous control covariates.
    pub controls: Vec<String>,
}

impl VariableRoles {
    /// Roles with no controls and no additional instruments.
    pub fn new<I, J>(outcome: impl Into<String>, endogenous: I, instruments: J) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        Self {
            outcome: outcome.into(),
            endogenous: endogenous.into_iter().map(Into::into).collect(),
            instruments: instruments.into_iter().map(Into::into).collect(),
            additional_instruments: Vec::new(),
            controls: Vec::new(),
        }
    }

    /// Set the control covariates.
    pub fn with_controls<I>(mut self, controls: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.controls = controls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the additional instruments.
    pub fn with_additional_instruments<I>(mut self, instruments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.additional_instruments = instruments.into_iter().map(Into::into).collect();
        self
    }

    /// Primary instruments followed by the additional ones.
    pub fn all_instruments(&self) -> Vec<String> {
        self.instruments
            .iter()
            .chain(&self.additional_instruments)
            .cloned()
            .collect()
    }

    /// Every variable of interest, without repeats: outcome, endogenous,
    /// instruments, controls.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let all = std::iter::once(&self.outcome)
            .chain(&self.endogenous)
            .chain(&self.instruments)
            .chain(&self.additional_instruments)
            .chain(&self.controls);
        for name in all {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Check that the required roles are filled and every column exists.
    pub fn validate(&self, data: &Dataset) -> Result<(), DiagnosticsError> {
        if self.outcome.is_empty() {
            return Err(DiagnosticsError::EmptyRole("outcome"));
        }
        if self.endogenous.is_empty() {
            return Err(DiagnosticsError::EmptyRole("endogenous"));
        }
        if self.instruments.is_empty() && self.additional_instruments.is_empty() {
            return Err(DiagnosticsError::EmptyRole("instruments"));
        }

        for name in self.variables() {
            if !data.has_column(&name) {
                // Distinguishes text columns from absent ones
                data.column(&name)?;
                return Err(DataError::UnknownColumn(name).into());
            }
        }
        Ok(())
    }
}
