//! Exclusion restriction: instruments act on the outcome only through the
//! endogenous regressors.

use super::roles::VariableRoles;
use super::validity::{fit_ols, DiagnosticsError};
use super::SIGNIFICANCE_LEVEL;
use crate::core::DiagnosticsOptions;
use crate::data::Dataset;
use crate::inference::CoefficientRow;
use crate::solvers::{
    FittedGmm, FittedOls, FittedRegressor, FittedTwoStage, IvDesign, IvEstimator, IvGmm,
    TwoStageLeastSquares,
};
use std::fmt;
use tracing::{debug, warn};

/// Hansen J test of the overidentifying restrictions.
#[derive(Debug, Clone)]
pub struct HansenJResult {
    /// J statistic from the two-step GMM fit.
    pub statistic: f64,
    /// Chi-square p-value.
    pub p_value: f64,
    /// Instruments minus endogenous regressors.
    pub df: usize,
    /// 2SLS fit of the same specification.
    pub two_stage: FittedTwoStage,
    /// Two-step GMM fit providing the statistic.
    pub gmm: FittedGmm,
}

impl HansenJResult {
    /// p > 0.05.
    pub fn passed(&self) -> bool {
        self.p_value > SIGNIFICANCE_LEVEL
    }
}

/// Outcome of the overidentification step.
#[derive(Debug, Clone)]
pub enum Overidentification {
    /// Exactly identified; nothing to test.
    NotApplicable {
        n_instruments: usize,
        n_endogenous: usize,
    },
    /// More instruments than endogenous regressors.
    Tested(HansenJResult),
}

impl Overidentification {
    pub fn hansen(&self) -> Option<&HansenJResult> {
        match self {
            Overidentification::Tested(hansen) => Some(hansen),
            Overidentification::NotApplicable { .. } => None,
        }
    }

    /// A non-applicable test counts as passed.
    pub fn passed(&self) -> bool {
        self.hansen().map_or(true, HansenJResult::passed)
    }
}

/// Coefficient of one variable in the direct-effect regression.
#[derive(Debug, Clone)]
pub struct DirectEffect {
    pub name: String,
    /// `None` when the coefficient is aliased.
    pub row: Option<CoefficientRow>,
    /// p < 0.05 (always false for the endogenous regressors).
    pub is_significant: bool,
}

/// Placebo regression of the outcome on endogenous + instruments + controls.
#[derive(Debug, Clone)]
pub struct DirectEffectResult {
    pub outcome: String,
    /// Endogenous coefficients, reported for context.
    pub endogenous: Vec<DirectEffect>,
    /// Instrument coefficients; a significant one violates exclusion.
    pub instruments: Vec<DirectEffect>,
    /// Whether any instrument has a significant direct effect.
    pub any_significant: bool,
    /// The fitted OLS model.
    pub model: FittedOls,
}

impl DirectEffectResult {
    /// Largest absolute instrument t statistic.
    pub fn max_abs_t(&self) -> f64 {
        self.instrument_rows()
            .map(|row| row.statistic.abs())
            .fold(f64::NAN, f64::max)
    }

    /// Smallest instrument p-value.
    pub fn min_p_value(&self) -> f64 {
        self.instrument_rows()
            .map(|row| row.p_value)
            .fold(f64::NAN, f64::min)
    }

    fn instrument_rows(&self) -> impl Iterator<Item = CoefficientRow> + '_ {
        self.instruments.iter().filter_map(|effect| effect.row)
    }
}

/// Both exclusion checks.
#[derive(Debug, Clone)]
pub struct ExclusionResult {
    pub overidentification: Overidentification,
    pub direct_effect: DirectEffectResult,
}

impl ExclusionResult {
    /// Hansen J passes (or is not applicable) and no direct effect is significant.
    pub fn passed(&self) -> bool {
        self.overidentification.passed() && !self.direct_effect.any_significant
    }
}

/// Outcome, controls, endogenous regressors and all instruments as an IV design.
pub(crate) fn iv_design(
    data: &Dataset,
    roles: &VariableRoles,
) -> Result<IvDesign, DiagnosticsError> {
    Ok(IvDesign::new(
        data.column_vec(&roles.outcome)?,
        data.select(&roles.controls)?,
        data.select(&roles.endogenous)?,
        data.select(&roles.all_instruments())?,
    )?)
}

/// Hansen J when overidentified, then the direct-effect regression.
pub fn exclusion_test(
    data: &Dataset,
    roles: &VariableRoles,
    options: &DiagnosticsOptions,
) -> Result<ExclusionResult, DiagnosticsError> {
    let instruments = roles.all_instruments();
    let n_instruments = instruments.len();
    let n_endogenous = roles.endogenous.len();

    let overidentification = if n_instruments > n_endogenous {
        let design = iv_design(data, roles)?;
        let two_stage = TwoStageLeastSquares::new(options.iv_options()).fit(&design)?;
        let gmm = IvGmm::new(options.iv_options()).fit(&design)?;
        let j_stat = gmm.j_stat();
        debug!(j = j_stat.statistic, p = j_stat.p_value, df = j_stat.df, "hansen j computed");

        Overidentification::Tested(HansenJResult {
            statistic: j_stat.statistic,
            p_value: j_stat.p_value,
            df: j_stat.df,
            two_stage,
            gmm,
        })
    } else {
        warn!(
            n_instruments,
            n_endogenous, "exactly identified, skipping overidentification test"
        );
        Overidentification::NotApplicable {
            n_instruments,
            n_endogenous,
        }
    };

    let direct_effect = direct_effect_test(data, roles, &instruments, options)?;

    Ok(ExclusionResult {
        overidentification,
        direct_effect,
    })
}

fn direct_effect_test(
    data: &Dataset,
    roles: &VariableRoles,
    instruments: &[String],
    options: &DiagnosticsOptions,
) -> Result<DirectEffectResult, DiagnosticsError> {
    let regressors: Vec<String> = roles
        .endogenous
        .iter()
        .chain(instruments)
        .chain(&roles.controls)
        .cloned()
        .collect();
    let x = data.select(&regressors)?;
    let y = data.column_vec(&roles.outcome)?;
    let model = fit_ols(&x, &y, options)?;
    debug!(r_squared = model.r_squared(), "direct effect regression fitted");

    let n_endogenous = roles.endogenous.len();
    let effect = |offset: usize, name: &String, flag: bool| {
        let row = model.coefficient_row(offset);
        DirectEffect {
            name: name.clone(),
            row,
            is_significant: flag && row.is_some_and(|r| r.p_value < SIGNIFICANCE_LEVEL),
        }
    };

    let endogenous: Vec<DirectEffect> = roles
        .endogenous
        .iter()
        .enumerate()
        .map(|(j, name)| effect(j, name, false))
        .collect();
    let instrument_effects: Vec<DirectEffect> = instruments
        .iter()
        .enumerate()
        .map(|(j, name)| effect(n_endogenous + j, name, true))
        .collect();
    let any_significant = instrument_effects.iter().any(|e| e.is_significant);

    Ok(DirectEffectResult {
        outcome: roles.outcome.clone(),
        endogenous,
        instruments: instrument_effects,
        any_significant,
        model,
    })
}

fn write_effect(f: &mut fmt::Formatter<'_>, effect: &DirectEffect) -> fmt::Result {
    match effect.row {
        Some(row) => write!(
            f,
            "  {}: β={:.4}, t={:.3}, p={:.4} {}",
            effect.name,
            row.estimate,
            row.statistic,
            row.p_value,
            row.stars()
        ),
        None => write!(f, "  {}: aliased", effect.name),
    }
}

impl fmt::Display for ExclusionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:-<80}", "")?;
        writeln!(f, "Test 2.1: Overidentification (Hansen J test via IV-GMM)")?;
        writeln!(f, "{:-<80}", "")?;

        match &self.overidentification {
            Overidentification::Tested(hansen) => {
                writeln!(f, "\nHansen J statistic: {:.4}", hansen.statistic)?;
                writeln!(f, "P-value: {:.4}", hansen.p_value)?;
                writeln!(f, "Degrees of freedom: {}", hansen.df)?;
                if hansen.passed() {
                    writeln!(f, "\n[PASS] Null not rejected (p = {:.4} > 0.05)", hansen.p_value)?;
                    writeln!(f, "  The instruments pass the overidentification test")?;
                } else {
                    writeln!(f, "\n[FAIL] Null rejected (p = {:.4} <= 0.05)", hansen.p_value)?;
                    writeln!(f, "  At least one instrument may violate the exclusion restriction")?;
                }
            }
            Overidentification::NotApplicable {
                n_instruments,
                n_endogenous,
            } => {
                writeln!(
                    f,
                    "\nInstruments ({}) = endogenous regressors ({})",
                    n_instruments, n_endogenous
                )?;
                writeln!(f, "Exactly identified; the overidentification test does not apply")?;
            }
        }

        let direct = &self.direct_effect;
        writeln!(f, "\n{:-<80}", "")?;
        writeln!(f, "Test 2.2: Direct effect (placebo test)")?;
        writeln!(f, "{:-<80}", "")?;
        writeln!(f, "\nRegression: {} ~ Endogenous + Instruments + Controls", direct.outcome)?;
        writeln!(f, "R-squared: {:.4}", direct.model.r_squared())?;

        writeln!(f, "\nEndogenous coefficients:")?;
        for effect in &direct.endogenous {
            write_effect(f, effect)?;
            writeln!(f)?;
        }

        writeln!(f, "\nDirect effects of the instruments (ideally not significant):")?;
        for effect in &direct.instruments {
            write_effect(f, effect)?;
            let status = if effect.is_significant {
                "[FAIL] significant"
            } else {
                "[PASS] not significant"
            };
            writeln!(f, " [{}]", status)?;
        }

        if direct.any_significant {
            writeln!(f, "\n[WARN] Some direct effects are significant")?;
            writeln!(f, "  The exclusion restriction may be violated")?;
        } else {
            writeln!(f, "\n[PASS] No instrument has a significant direct effect")?;
            writeln!(f, "  Supports the exclusion restriction")?;
        }
        Ok(())
    }
}
