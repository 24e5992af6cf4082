//! Composite verdict over the three identification conditions.

use super::exclusion::Overidentification;
use super::validity::DiagnosticResults;
use std::fmt;

/// Which of the three conditions hold.
///
/// Sub-tests that did not run count as passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeVerdict {
    pub all_relevant: bool,
    pub exclusion_passed: bool,
    pub exchangeability_passed: bool,
}

impl CompositeVerdict {
    pub fn from_results(results: &DiagnosticResults) -> Self {
        Self {
            all_relevant: results
                .relevance
                .iter()
                .flatten()
                .all(|r| r.is_relevant),
            exclusion_passed: results.exclusion.as_ref().map_or(true, |e| e.passed()),
            exchangeability_passed: results
                .exchangeability
                .as_ref()
                .map_or(true, |e| e.passed()),
        }
    }

    /// All three conditions hold.
    pub fn passed(&self) -> bool {
        self.all_relevant && self.exclusion_passed && self.exchangeability_passed
    }
}

/// Printable composite report.
pub struct CompositeReport<'a> {
    results: &'a DiagnosticResults,
}

impl<'a> CompositeReport<'a> {
    pub fn new(results: &'a DiagnosticResults) -> Self {
        Self { results }
    }

    pub fn verdict(&self) -> CompositeVerdict {
        CompositeVerdict::from_results(self.results)
    }
}

impl fmt::Display for CompositeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:=<80}", "")?;
        writeln!(f, "COMPREHENSIVE IV VALIDITY REPORT")?;
        writeln!(f, "{:=<80}", "")?;
        writeln!(f, "\nThe three core conditions for instrument validity:")?;
        writeln!(f, "{:-<80}", "")?;

        writeln!(f, "\n1. RELEVANCE")?;
        writeln!(f, "   Requires Cov(Z, D) != 0: instruments correlate with the endogenous variables")?;
        for res in self.results.relevance.iter().flatten() {
            if res.is_relevant {
                writeln!(f, "   {}: [PASS] (F = {:.2} > 10)", res.endogenous, res.f_statistic)?;
            } else {
                writeln!(f, "   {}: [FAIL] (F = {:.2} <= 10)", res.endogenous, res.f_statistic)?;
            }
        }

        writeln!(f, "\n2. EXCLUSION RESTRICTION")?;
        writeln!(f, "   Requires Cov(Z, ε) = 0: instruments affect the outcome only through D")?;
        if let Some(exclusion) = &self.results.exclusion {
            match &exclusion.overidentification {
                Overidentification::Tested(hansen) => {
                    let status = if hansen.passed() { "[PASS]" } else { "[FAIL]" };
                    writeln!(
                        f,
                        "   Overidentification (Hansen J): {} (p = {:.4})",
                        status, hansen.p_value
                    )?;
                }
                Overidentification::NotApplicable { .. } => {
                    writeln!(f, "   Overidentification: - not testable (exactly identified)")?;
                }
            }
            if exclusion.direct_effect.any_significant {
                writeln!(f, "   Direct effect: [WARN] significant direct effect")?;
            } else {
                writeln!(f, "   Direct effect: [PASS] no significant direct effect")?;
            }
        }

        writeln!(f, "\n3. EXCHANGEABILITY")?;
        writeln!(f, "   Requires Z ⊥ U: instruments independent of unobserved confounders")?;
        if let Some(exchangeability) = &self.results.exchangeability {
            match exchangeability.all_balanced() {
                Some(true) => writeln!(f, "   Balance: [PASS] balanced on all controls")?,
                Some(false) => writeln!(f, "   Balance: [WARN] unbalanced on some controls")?,
                None => writeln!(f, "   Balance: - no controls")?,
            }
            if exchangeability.residual.is_independent {
                writeln!(f, "   Residual prediction: [PASS] Z does not predict the residuals")?;
            } else {
                writeln!(f, "   Residual prediction: [WARN] Z predicts the residuals")?;
            }
        }

        writeln!(f, "\n{:=<80}", "")?;
        writeln!(f, "OVERALL ASSESSMENT")?;
        writeln!(f, "{:=<80}", "")?;

        let verdict = self.verdict();
        if verdict.passed() {
            writeln!(f, "\n[PASS][PASS][PASS] The instruments satisfy all three core conditions")?;
            writeln!(f, "\nConclusion: the instruments are valid for causal inference")?;
            writeln!(f, "Recommendation: proceed with 2SLS and report the IV estimates")?;
        } else {
            writeln!(f, "\n[WARN][WARN][WARN] The instruments do not satisfy every condition")?;
            writeln!(f, "\nProblems found:")?;
            if !verdict.all_relevant {
                writeln!(f, "  [FAIL] Weak instruments: first-stage F statistic too low")?;
                writeln!(f, "    Recommendation: find stronger instruments")?;
            }
            if !verdict.exclusion_passed {
                writeln!(f, "  [FAIL] The exclusion restriction may be violated")?;
                writeln!(f, "    Recommendation: reassess the choice of instruments")?;
            }
            if !verdict.exchangeability_passed {
                writeln!(f, "  [FAIL] Exchangeability may not hold")?;
                writeln!(f, "    Recommendation: control for the unbalanced covariates")?;
            }

            writeln!(f, "\nNext steps:")?;
            writeln!(f, "  1. Reassess the choice of instruments")?;
            writeln!(f, "  2. Consider other identification strategies")?;
            writeln!(f, "  3. Run sensitivity analyses")?;
            writeln!(f, "  4. Report the potential limitations with the results")?;
        }

        write!(f, "\n{:=<80}", "")
    }
}
