//! Two-stage least squares estimate of the structural equation.

use super::exclusion::iv_design;
use super::roles::VariableRoles;
use super::validity::DiagnosticsError;
use crate::core::DiagnosticsOptions;
use crate::data::Dataset;
use crate::solvers::{FittedIv, FittedTwoStage, IvEstimator, TwoStageLeastSquares};
use std::fmt;
use tracing::debug;

/// Name of the intercept parameter.
pub const INTERCEPT_NAME: &str = "const";

/// A fitted 2SLS model together with its parameter names.
#[derive(Debug, Clone)]
pub struct TwoStageEstimate {
    /// Dependent variable.
    pub outcome: String,
    /// Names in parameter order: intercept, controls, endogenous.
    pub parameter_names: Vec<String>,
    pub model: FittedTwoStage,
}

impl TwoStageEstimate {
    /// Estimate of the named parameter.
    pub fn param(&self, name: &str) -> Option<f64> {
        let j = self.parameter_names.iter().position(|n| n == name)?;
        Some(self.model.params()[j])
    }
}

/// Fit 2SLS of the outcome on the endogenous regressors, instrumented by all
/// instruments, with intercept and controls as exogenous regressors.
pub fn estimate_two_stage(
    data: &Dataset,
    roles: &VariableRoles,
    options: &DiagnosticsOptions,
) -> Result<TwoStageEstimate, DiagnosticsError> {
    let design = iv_design(data, roles)?;
    let model = TwoStageLeastSquares::new(options.iv_options()).fit(&design)?;
    debug!(
        r_squared = model.result().r_squared,
        n = model.result().n_observations,
        "2sls fitted"
    );

    let parameter_names = std::iter::once(INTERCEPT_NAME.to_string())
        .chain(roles.controls.iter().cloned())
        .chain(roles.endogenous.iter().cloned())
        .collect();

    Ok(TwoStageEstimate {
        outcome: roles.outcome.clone(),
        parameter_names,
        model,
    })
}

impl fmt::Display for TwoStageEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.model.result();
        let width = self
            .parameter_names
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(9);

        writeln!(f, "{:^80}", "IV-2SLS Estimation Summary")?;
        writeln!(f, "{:=<80}", "")?;
        writeln!(
            f,
            "Dep. Variable:      {:<20} R-squared:          {:.4}",
            self.outcome, result.r_squared
        )?;
        writeln!(
            f,
            "No. Observations:   {:<20} Adj. R-squared:     {:.4}",
            result.n_observations, result.adj_r_squared
        )?;
        writeln!(
            f,
            "Cov. Estimator:     {:<20} Instruments:        {}",
            result.covariance_type.label(),
            result.n_instruments
        )?;
        writeln!(f, "{:=<80}", "")?;

        let level = (result.confidence_level * 100.0).round();
        writeln!(
            f,
            "{:<width$} {:>10} {:>10} {:>8} {:>8} {:>10} {:>10}",
            "Parameter",
            "Estimate",
            "Std. Err.",
            "z-stat",
            "P>|z|",
            format!("Lower {level}%"),
            format!("Upper {level}%"),
            width = width
        )?;
        writeln!(f, "{:-<80}", "")?;
        for (j, name) in self.parameter_names.iter().enumerate() {
            writeln!(
                f,
                "{:<width$} {:>10.4} {:>10.4} {:>8.3} {:>8.4} {:>10.4} {:>10.4}",
                name,
                result.params[j],
                result.std_errors[j],
                result.z_statistics[j],
                result.p_values[j],
                result.conf_interval_lower[j],
                result.conf_interval_upper[j],
                width = width
            )?;
        }
        writeln!(f, "{:=<80}", "")?;
        writeln!(
            f,
            "Endogenous: {}",
            self.parameter_names[result.endogenous_offset()..].join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_order_and_summary() {
        let n = 60;
        let z: Vec<f64> = (0..n).map(|i| ((i * 13) % 17) as f64).collect();
        let w: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
        let d: Vec<f64> = (0..n).map(|i| z[i] + 0.5 * w[i] + ((i * 3) % 4) as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| 1.0 + 2.0 * d[i] - w[i]).collect();
        let data = Dataset::from_columns([("y", y), ("d", d), ("z", z), ("w", w)]).unwrap();
        let roles = VariableRoles::new("y", ["d"], ["z"]).with_controls(["w"]);

        let estimate = estimate_two_stage(&data, &roles, &DiagnosticsOptions::default()).unwrap();
        assert_eq!(estimate.parameter_names, ["const", "w", "d"]);
        assert!((estimate.param("d").unwrap() - 2.0).abs() < 1e-8);
        assert!((estimate.param("const").unwrap() - 1.0).abs() < 1e-8);
        assert!(estimate.param("z").is_none());

        let text = estimate.to_string();
        assert!(text.contains("IV-2SLS Estimation Summary"));
        assert!(text.contains("Robust"));
        assert!(text.contains("Endogenous: d"));
    }
}
