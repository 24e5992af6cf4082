//! Instrumental-variable validity diagnostics.
//!
//! Three identification conditions are checked:
//! - **Relevance**: joint F-test of the instruments in each first stage
//! - **Exclusion restriction**: Hansen J test (when overidentified) and a
//!   direct-effect placebo regression
//! - **Exchangeability**: balance of the controls on the instruments and
//!   independence of the OLS residuals from the instruments
//!
//! `IvValidityTests` runs them over one dataset and condenses the outcome
//! into a composite report and a summary table.

mod estimation;
mod exchangeability;
mod exclusion;
mod relevance;
mod report;
mod roles;
mod summary;
mod validity;

/// First-stage F above which instruments are strong.
pub const STRONG_INSTRUMENT_F: f64 = 10.0;

/// First-stage F above which instruments are moderately strong.
pub const MODERATE_INSTRUMENT_F: f64 = 5.0;

/// Significance level for every other test.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

pub use estimation::{estimate_two_stage, TwoStageEstimate, INTERCEPT_NAME};
pub use exchangeability::{
    exchangeability_test, BalanceResult, ExchangeabilityResult, ResidualIndependence,
};
pub use exclusion::{
    exclusion_test, DirectEffect, DirectEffectResult, ExclusionResult, HansenJResult,
    Overidentification,
};
pub use relevance::{relevance_test, InstrumentStrength, RelevanceResult};
pub use report::{CompositeReport, CompositeVerdict};
pub use roles::VariableRoles;
pub use summary::{SummaryRow, SummaryTable};
pub use validity::{DiagnosticResults, DiagnosticsError, IvValidityTests};
