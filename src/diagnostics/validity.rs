//! The `IvValidityTests` orchestrator.

use super::estimation::{estimate_two_stage, TwoStageEstimate};
use super::exchangeability::{exchangeability_test, ExchangeabilityResult};
use super::exclusion::{exclusion_test, ExclusionResult};
use super::relevance::{relevance_test, RelevanceResult};
use super::report::CompositeReport;
use super::roles::VariableRoles;
use super::summary::SummaryTable;
use crate::core::{DiagnosticsOptions, NaError, NaHandler, NaInfo, OptionsError};
use crate::data::{DataError, Dataset};
use crate::solvers::{FittedOls, OlsRegressor, RegressionError, Regressor};
use faer::{Col, Mat};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised by a validity run.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("no variables given for the {0} role")]
    EmptyRole(&'static str),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    MissingValues(#[from] NaError),

    #[error(transparent)]
    Regression(#[from] RegressionError),

    #[error(transparent)]
    InvalidOptions(#[from] OptionsError),
}

/// Results accumulated by an `IvValidityTests` run.
///
/// Each test overwrites its own entry; nothing is cleared.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResults {
    pub relevance: Option<Vec<RelevanceResult>>,
    pub exclusion: Option<ExclusionResult>,
    pub exchangeability: Option<ExchangeabilityResult>,
    pub two_stage: Option<TwoStageEstimate>,
}

/// OLS with intercept using the run's options.
pub(crate) fn fit_ols(
    x: &Mat<f64>,
    y: &Col<f64>,
    options: &DiagnosticsOptions,
) -> Result<FittedOls, DiagnosticsError> {
    Ok(OlsRegressor::new(options.ols_options()).fit(x, y)?)
}

/// Validity diagnostics for one IV design over one dataset.
///
/// # Example
///
/// ```rust,ignore
/// use iv_validity::diagnostics::{IvValidityTests, VariableRoles};
/// use iv_validity::core::DiagnosticsOptions;
///
/// let roles = VariableRoles::new("y", ["d"], ["z1", "z2"]).with_controls(["w"]);
/// let mut tests = IvValidityTests::new(&data, roles, DiagnosticsOptions::default())?;
/// tests.run_all_tests()?;
/// tests.estimate_2sls()?;
/// println!("{}", tests.summary_table());
/// ```
#[derive(Debug, Clone)]
pub struct IvValidityTests {
    data: Dataset,
    roles: VariableRoles,
    options: DiagnosticsOptions,
    na_info: NaInfo,
    results: DiagnosticResults,
}

impl IvValidityTests {
    /// Validate the roles and keep the complete rows of the variables of interest.
    pub fn new(
        data: &Dataset,
        roles: VariableRoles,
        options: DiagnosticsOptions,
    ) -> Result<Self, DiagnosticsError> {
        options.validate()?;
        roles.validate(data)?;

        let variables = roles.variables();
        let na = NaHandler::process(&data.select(variables.as_slice())?, options.na_action)?;
        if na.na_info.has_removed() {
            warn!(
                removed = na.na_info.n_removed,
                remaining = na.na_info.n_clean,
                "dropped rows with missing values"
            );
        }

        let clean = &na.clean;
        let data = Dataset::from_columns(
            variables
                .iter()
                .enumerate()
                .map(|(j, name)| (name.as_str(), (0..clean.nrows()).map(|i| clean[(i, j)]).collect())),
        )?;

        let tests = Self {
            data,
            roles,
            options,
            na_info: na.na_info,
            results: DiagnosticResults::default(),
        };
        if tests.options.verbose {
            tests.print_setup();
        }
        Ok(tests)
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn roles(&self) -> &VariableRoles {
        &self.roles
    }

    pub fn options(&self) -> &DiagnosticsOptions {
        &self.options
    }

    /// Rows kept and dropped by missing-value handling.
    pub fn na_info(&self) -> &NaInfo {
        &self.na_info
    }

    pub fn results(&self) -> &DiagnosticResults {
        &self.results
    }

    /// Condition 1: first-stage F test per endogenous regressor.
    pub fn test_relevance(&mut self) -> Result<&[RelevanceResult], DiagnosticsError> {
        info!("running relevance test");
        let results = relevance_test(&self.data, &self.roles, &self.options)?;
        if self.options.verbose {
            print_banner("CONDITION 1: RELEVANCE TEST");
            println!("\nRequirement: Cov(Z, D) != 0");
            println!("The instruments must be strongly correlated with the endogenous variables");
            println!("Criterion: first-stage F statistic > 10");
            for result in &results {
                println!("\n{result}");
            }
        }
        Ok(self.results.relevance.insert(results))
    }

    /// Condition 2: Hansen J (when overidentified) and the direct-effect check.
    pub fn test_exclusion_restriction(&mut self) -> Result<&ExclusionResult, DiagnosticsError> {
        info!("running exclusion restriction test");
        let result = exclusion_test(&self.data, &self.roles, &self.options)?;
        if self.options.verbose {
            print_banner("CONDITION 2: EXCLUSION RESTRICTION TEST");
            println!("\nRequirement: Cov(Z, ε) = 0");
            println!("The instruments may affect the outcome only through the endogenous variables");
            println!("\n{result}");
        }
        Ok(self.results.exclusion.insert(result))
    }

    /// Condition 3: balance on the controls and residual independence.
    pub fn test_exchangeability(&mut self) -> Result<&ExchangeabilityResult, DiagnosticsError> {
        info!("running exchangeability test");
        let result = exchangeability_test(&self.data, &self.roles, &self.options)?;
        if self.options.verbose {
            print_banner("CONDITION 3: EXCHANGEABILITY TEST");
            println!("\nRequirement: Z ⊥ U");
            println!("The instruments must be independent of unobserved confounders");
            println!("\n{result}");
        }
        Ok(self.results.exchangeability.insert(result))
    }

    /// Run the three tests in order, then print the composite report.
    pub fn run_all_tests(&mut self) -> Result<&DiagnosticResults, DiagnosticsError> {
        println!("\n{:=<40}", "");
        println!("Running the full IV validity diagnostics...");
        println!("{:=<40}", "");

        self.test_relevance()?;
        self.test_exclusion_restriction()?;
        self.test_exchangeability()?;

        println!("\n{}", self.report());
        Ok(&self.results)
    }

    /// 2SLS with robust covariance; the fit is stored in the results.
    pub fn estimate_2sls(&mut self) -> Result<&TwoStageEstimate, DiagnosticsError> {
        info!("estimating 2sls");
        let estimate = estimate_two_stage(&self.data, &self.roles, &self.options)?;
        if self.options.verbose {
            print_banner("2SLS ESTIMATION: Two-Stage Least Squares");
            println!("\n{estimate}");
        }
        Ok(self.results.two_stage.insert(estimate))
    }

    /// Composite report over whatever has run so far.
    pub fn report(&self) -> CompositeReport<'_> {
        CompositeReport::new(&self.results)
    }

    /// One row per executed sub-test.
    pub fn summary_table(&self) -> SummaryTable {
        SummaryTable::from_results(&self.results)
    }

    fn print_setup(&self) {
        print_banner("IV VALIDITY DIAGNOSTICS");
        println!(
            "\nData dimensions: ({}, {})",
            self.data.n_rows(),
            self.data.n_columns()
        );
        if self.na_info.has_removed() {
            println!("Rows dropped for missing values: {}", self.na_info.n_removed);
        }
        println!("Outcome: {}", self.roles.outcome);
        println!("Endogenous: {:?}", self.roles.endogenous);
        println!("Primary instruments: {:?}", self.roles.instruments);
        if !self.roles.additional_instruments.is_empty() {
            println!("Additional instruments: {:?}", self.roles.additional_instruments);
        }
        println!("Controls: {:?}", self.roles.controls);
    }
}

fn print_banner(title: &str) {
    println!("\n{:=<80}", "");
    println!("{title}");
    println!("{:=<80}", "");
}
