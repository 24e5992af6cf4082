//! Relevance: the instruments must predict each endogenous regressor.

use super::roles::VariableRoles;
use super::validity::{fit_ols, DiagnosticsError};
use super::{MODERATE_INSTRUMENT_F, STRONG_INSTRUMENT_F};
use crate::core::DiagnosticsOptions;
use crate::data::Dataset;
use crate::inference::{CoefficientRow, JointFTest};
use crate::solvers::{FittedOls, FittedRegressor};
use std::fmt;
use tracing::debug;

/// Strength class of a first stage by its joint F statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentStrength {
    /// F > 10.
    Strong,
    /// 5 < F <= 10.
    Moderate,
    /// F <= 5 (or undefined).
    Weak,
}

impl InstrumentStrength {
    /// Classify an F statistic.
    pub fn from_f(f_statistic: f64) -> Self {
        if f_statistic > STRONG_INSTRUMENT_F {
            InstrumentStrength::Strong
        } else if f_statistic > MODERATE_INSTRUMENT_F {
            InstrumentStrength::Moderate
        } else {
            InstrumentStrength::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstrumentStrength::Strong => "strong",
            InstrumentStrength::Moderate => "moderate",
            InstrumentStrength::Weak => "weak",
        }
    }
}

/// First-stage regression of one endogenous regressor.
#[derive(Debug, Clone)]
pub struct RelevanceResult {
    /// Endogenous regressor.
    pub endogenous: String,
    /// Joint F statistic of the instrument coefficients.
    pub f_statistic: f64,
    /// p-value of the joint F statistic.
    pub f_pvalue: f64,
    /// F > 10.
    pub is_relevant: bool,
    /// Strength class.
    pub strength: InstrumentStrength,
    /// R² of the first stage.
    pub r_squared: f64,
    /// R² added by the instruments over the controls-only model.
    pub partial_r_squared: f64,
    /// Instrument names, in design order.
    pub instruments: Vec<String>,
    /// First-stage OLS fit on `[instruments | controls]`.
    pub first_stage: FittedOls,
}

impl RelevanceResult {
    /// Coefficient rows of the instruments (`None` when aliased).
    pub fn instrument_rows(&self) -> impl Iterator<Item = (&str, Option<CoefficientRow>)> + '_ {
        self.instruments
            .iter()
            .enumerate()
            .map(|(j, name)| (name.as_str(), self.first_stage.coefficient_row(j)))
    }
}

/// Run the first stage for every endogenous regressor.
pub fn relevance_test(
    data: &Dataset,
    roles: &VariableRoles,
    options: &DiagnosticsOptions,
) -> Result<Vec<RelevanceResult>, DiagnosticsError> {
    let instruments = roles.all_instruments();
    let regressors: Vec<String> = instruments.iter().chain(&roles.controls).cloned().collect();
    let x = data.select(&regressors)?;
    let tested: Vec<usize> = (0..instruments.len()).collect();

    let controls_x = data.select(&roles.controls)?;

    roles
        .endogenous
        .iter()
        .map(|endog| {
            let y = data.column_vec(endog)?;
            let first_stage = fit_ols(&x, &y, options)?;
            let f_test =
                JointFTest::for_columns(&x, &y, &first_stage, &tested, &options.ols_options())?;

            let r_squared = first_stage.r_squared();
            let partial_r_squared = if roles.controls.is_empty() {
                r_squared
            } else {
                r_squared - fit_ols(&controls_x, &y, options)?.r_squared()
            };

            debug!(
                endogenous = %endog,
                f = f_test.statistic,
                r_squared,
                n = y.nrows(),
                "first stage fitted"
            );

            Ok(RelevanceResult {
                endogenous: endog.clone(),
                f_statistic: f_test.statistic,
                f_pvalue: f_test.p_value,
                is_relevant: f_test.statistic > STRONG_INSTRUMENT_F,
                strength: InstrumentStrength::from_f(f_test.statistic),
                r_squared,
                partial_r_squared,
                instruments: instruments.clone(),
                first_stage,
            })
        })
        .collect()
}

impl fmt::Display for RelevanceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:-<80}", "")?;
        writeln!(f, "First stage: {} ~ Instruments + Controls", self.endogenous)?;
        writeln!(f, "{:-<80}", "")?;

        writeln!(f, "\nOverall fit:")?;
        writeln!(f, "  R-squared: {:.4}", self.r_squared)?;
        writeln!(f, "  Partial R² (instruments only): {:.4}", self.partial_r_squared)?;

        writeln!(f, "\nJoint significance of the instruments:")?;
        writeln!(f, "  F statistic: {:.4}", self.f_statistic)?;
        writeln!(f, "  P-value: {:.6}", self.f_pvalue)?;

        writeln!(f, "\nVerdict:")?;
        match self.strength {
            InstrumentStrength::Strong => {
                writeln!(f, "  [PASS] Strong instruments (F = {:.2} > 10)", self.f_statistic)?;
                writeln!(f, "  Relevance condition satisfied")?;
            }
            InstrumentStrength::Moderate => {
                writeln!(
                    f,
                    "  [WARN] Moderately strong instruments (F = {:.2}, between 5 and 10)",
                    self.f_statistic
                )?;
                writeln!(f, "  Consider looking for stronger instruments")?;
            }
            InstrumentStrength::Weak => {
                writeln!(f, "  [FAIL] Weak instruments (F = {:.2} <= 5)", self.f_statistic)?;
                writeln!(f, "  Relevance fails; IV estimates will be severely biased")?;
            }
        }

        writeln!(f, "\nInstrument coefficients:")?;
        for (name, row) in self.instrument_rows() {
            match row {
                Some(row) => writeln!(
                    f,
                    "  {}: β={:.4} (SE={:.4}), t={:.3}, p={:.4} {}",
                    name,
                    row.estimate,
                    row.std_error,
                    row.statistic,
                    row.p_value,
                    row.stars()
                )?,
                None => writeln!(f, "  {}: aliased", name)?,
            }
        }
        Ok(())
    }
}
