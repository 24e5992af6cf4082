//! One-row-per-sub-test summary of a validity run.

use super::exclusion::Overidentification;
use super::validity::DiagnosticResults;
use std::fmt;

const HEADERS: [&str; 5] = ["Test", "Variable", "Statistic", "P-value", "Verdict"];

/// A row of the summary table; every cell is pre-formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub test: String,
    pub variable: String,
    pub statistic: String,
    pub p_value: String,
    pub verdict: String,
}

impl SummaryRow {
    fn new(test: &str, variable: &str, statistic: String, p_value: String, verdict: &str) -> Self {
        Self {
            test: test.to_string(),
            variable: variable.to_string(),
            statistic,
            p_value,
            verdict: verdict.to_string(),
        }
    }

    fn cells(&self) -> [&str; 5] {
        [
            &self.test,
            &self.variable,
            &self.statistic,
            &self.p_value,
            &self.verdict,
        ]
    }
}

fn verdict(passed: bool, failed: &'static str) -> &'static str {
    if passed {
        "[PASS]"
    } else {
        failed
    }
}

fn write_cells(f: &mut fmt::Formatter<'_>, cells: [&str; 5], widths: &[usize; 5]) -> fmt::Result {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
        .collect();
    writeln!(f, "{}", line.join("  ").trim_end())
}

/// Condensed results, rendered as a fixed-width text table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// One row per executed sub-test.
    pub fn from_results(results: &DiagnosticResults) -> Self {
        let mut rows = Vec::new();

        for res in results.relevance.iter().flatten() {
            rows.push(SummaryRow::new(
                "Relevance",
                &res.endogenous,
                format!("F = {:.2}", res.f_statistic),
                format!("{:.4}", res.f_pvalue),
                verdict(res.is_relevant, "[FAIL]"),
            ));
        }

        if let Some(exclusion) = &results.exclusion {
            if let Overidentification::Tested(hansen) = &exclusion.overidentification {
                rows.push(SummaryRow::new(
                    "Exclusion (Hansen J)",
                    "All IVs",
                    format!("J = {:.2}", hansen.statistic),
                    format!("{:.4}", hansen.p_value),
                    verdict(hansen.passed(), "[FAIL]"),
                ));
            }

            let direct = &exclusion.direct_effect;
            rows.push(SummaryRow::new(
                "Exclusion (Direct effect)",
                "All IVs",
                format!("|t| = {:.2}", direct.max_abs_t()),
                format!("{:.4}", direct.min_p_value()),
                verdict(!direct.any_significant, "[WARN] direct effect"),
            ));
        }

        if let Some(exchangeability) = &results.exchangeability {
            if let Some(all_balanced) = exchangeability.all_balanced() {
                rows.push(SummaryRow::new(
                    "Exchangeability (Balance)",
                    "All Controls",
                    "-".to_string(),
                    "-".to_string(),
                    verdict(all_balanced, "[WARN] partly unbalanced"),
                ));
            }

            let residual = &exchangeability.residual;
            rows.push(SummaryRow::new(
                "Exchangeability (Residual)",
                "All IVs",
                format!("F = {:.2}", residual.f_statistic),
                format!("{:.4}", residual.p_value),
                verdict(residual.is_independent, "[WARN] predicts residuals"),
            ));
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths = HEADERS.map(str::len);
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_cells(f, HEADERS, &widths)?;
        let total = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
        writeln!(f, "{:-<total$}", "", total = total)?;
        for row in &self.rows {
            write_cells(f, row.cells(), &widths)?;
        }
        Ok(())
    }
}
