//! Exchangeability: instruments independent of confounders.

use super::roles::VariableRoles;
use super::validity::{fit_ols, DiagnosticsError};
use super::SIGNIFICANCE_LEVEL;
use crate::core::DiagnosticsOptions;
use crate::data::Dataset;
use crate::inference::JointFTest;
use crate::solvers::FittedRegressor;
use faer::Mat;
use std::fmt;
use tracing::{debug, warn};

/// Regression of one control on the instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceResult {
    pub control: String,
    pub f_statistic: f64,
    pub p_value: f64,
    /// p > 0.05.
    pub is_balanced: bool,
}

/// Residuals of `outcome ~ endogenous + controls` regressed on the instruments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualIndependence {
    pub f_statistic: f64,
    pub p_value: f64,
    /// p > 0.05.
    pub is_independent: bool,
}

/// Balance and residual-independence checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeabilityResult {
    /// One entry per control; `None` when there are no controls.
    pub balance: Option<Vec<BalanceResult>>,
    pub residual: ResidualIndependence,
}

impl ExchangeabilityResult {
    /// Whether every control is balanced; `None` when there are no controls.
    pub fn all_balanced(&self) -> Option<bool> {
        self.balance
            .as_ref()
            .map(|results| results.iter().all(|r| r.is_balanced))
    }

    /// Balance (when tested) and residual independence both hold.
    pub fn passed(&self) -> bool {
        self.all_balanced().unwrap_or(true) && self.residual.is_independent
    }
}

/// Joint F-test that every column of `x` has a zero coefficient.
fn all_columns_f(
    x: &Mat<f64>,
    y: &faer::Col<f64>,
    options: &DiagnosticsOptions,
) -> Result<JointFTest, DiagnosticsError> {
    let fitted = fit_ols(x, y, options)?;
    let tested: Vec<usize> = (0..x.ncols()).collect();
    Ok(JointFTest::for_columns(x, y, &fitted, &tested, &options.ols_options())?)
}

/// Balance test per control, then the residual-independence test.
pub fn exchangeability_test(
    data: &Dataset,
    roles: &VariableRoles,
    options: &DiagnosticsOptions,
) -> Result<ExchangeabilityResult, DiagnosticsError> {
    let z = data.select(&roles.all_instruments())?;

    let balance = if roles.controls.is_empty() {
        warn!("no controls, skipping balance test");
        None
    } else {
        let results = roles
            .controls
            .iter()
            .map(|control| {
                let test = all_columns_f(&z, &data.column_vec(control)?, options)?;
                Ok(BalanceResult {
                    control: control.clone(),
                    f_statistic: test.statistic,
                    p_value: test.p_value,
                    is_balanced: test.p_value > SIGNIFICANCE_LEVEL,
                })
            })
            .collect::<Result<Vec<_>, DiagnosticsError>>()?;
        Some(results)
    };

    let regressors: Vec<String> = roles
        .endogenous
        .iter()
        .chain(&roles.controls)
        .cloned()
        .collect();
    let ols = fit_ols(
        &data.select(&regressors)?,
        &data.column_vec(&roles.outcome)?,
        options,
    )?;
    let residuals = ols.result().residuals.clone();
    let test = all_columns_f(&z, &residuals, options)?;
    debug!(f = test.statistic, p = test.p_value, "residual independence tested");

    Ok(ExchangeabilityResult {
        balance,
        residual: ResidualIndependence {
            f_statistic: test.statistic,
            p_value: test.p_value,
            is_independent: test.p_value > SIGNIFICANCE_LEVEL,
        },
    })
}

impl fmt::Display for ExchangeabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:-<80}", "")?;
        writeln!(f, "Test 3.1: Balance test")?;
        writeln!(f, "{:-<80}", "")?;
        writeln!(f, "\nAre the instruments independent of the controls?")?;

        match &self.balance {
            Some(results) => {
                writeln!(f, "\nRegression per control: Control ~ Instruments")?;
                for result in results {
                    let status = if result.is_balanced {
                        "[PASS] balanced"
                    } else {
                        "[FAIL] unbalanced"
                    };
                    writeln!(f, "\n  {}:", result.control)?;
                    writeln!(f, "    F statistic: {:.4}", result.f_statistic)?;
                    writeln!(f, "    P-value: {:.4}", result.p_value)?;
                    writeln!(f, "    Verdict: {}", status)?;
                }

                writeln!(f, "\nBalance summary:")?;
                if self.all_balanced().unwrap_or(true) {
                    writeln!(f, "  [PASS] The instruments are balanced on every control")?;
                    writeln!(f, "  Suggests independence from unobserved confounders")?;
                } else {
                    writeln!(f, "  [WARN] The instruments are unbalanced on some controls")?;
                    writeln!(f, "  The instruments may be correlated with confounders")?;
                }
            }
            None => writeln!(f, "\nNo controls; the balance test does not apply")?,
        }

        let residual = &self.residual;
        writeln!(f, "\n{:-<80}", "")?;
        writeln!(f, "Test 3.2: Residual prediction test")?;
        writeln!(f, "{:-<80}", "")?;
        writeln!(f, "\nRegression: OLS residuals ~ Instruments")?;
        writeln!(f, "F statistic: {:.4}", residual.f_statistic)?;
        writeln!(f, "P-value: {:.4}", residual.p_value)?;
        if residual.is_independent {
            writeln!(
                f,
                "\n[PASS] Instruments do not predict the residuals (p = {:.4} > 0.05)",
                residual.p_value
            )?;
        } else {
            writeln!(
                f,
                "\n[WARN] Instruments predict the residuals (p = {:.4} <= 0.05)",
                residual.p_value
            )?;
            writeln!(f, "  The instruments may be correlated with confounders")?;
        }
        Ok(())
    }
}
