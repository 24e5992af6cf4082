//! The three review-rating study scenarios.
//!
//! Each scenario reads one CSV export, derives the review features and runs
//! the full diagnostics followed by a 2SLS estimate.

use crate::core::DiagnosticsOptions;
use crate::data::{prepare_review_features, Dataset};
use crate::diagnostics::{DiagnosticsError, IvValidityTests, VariableRoles};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

const OUTCOME: &str = "star_avg";
const ENDOGENOUS: [&str; 2] = ["memory_score", "memory_score_review_high"];

const IMAGE_CONTROLS: [&str; 13] = [
    "categories_counts",
    "average_hue",
    "average_saturation",
    "average_value",
    "food",
    "drink",
    "menu",
    "inside",
    "var",
    "person_exist",
    "beauty_score",
    "review_high",
    "log_review_count",
];

const DRINK_CONTROLS: [&str; 13] = [
    "categories_counts",
    "var",
    "average_saturation",
    "average_value",
    "food",
    "drink",
    "menu",
    "inside",
    "person_exist",
    "beauty_score",
    "review_high",
    "log_review_count",
    "sharpness_measure",
];

/// A study dataset with its fixed variable roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Restaurant,
    Business,
    Drink,
}

impl Scenario {
    pub fn all() -> [Scenario; 3] {
        [Scenario::Restaurant, Scenario::Business, Scenario::Drink]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Restaurant => "restaurant",
            Scenario::Business => "business",
            Scenario::Drink => "drink",
        }
    }

    /// CSV file name under the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Scenario::Restaurant => "study1_2_res_data.csv",
            Scenario::Business => "study1_2_business_data.csv",
            Scenario::Drink => "study1_2_drink_data.csv",
        }
    }

    pub fn path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }

    pub fn roles(&self) -> VariableRoles {
        let roles = VariableRoles::new(OUTCOME, ENDOGENOUS, self.instruments());
        match self {
            Scenario::Restaurant | Scenario::Business => roles.with_controls(IMAGE_CONTROLS),
            Scenario::Drink => roles.with_controls(DRINK_CONTROLS),
        }
    }

    fn instruments(&self) -> [&'static str; 3] {
        match self {
            Scenario::Restaurant | Scenario::Business => [
                "sharpness_measure",
                "sharpness_measure_review_high",
                "person_total_count_x",
            ],
            Scenario::Drink => [
                "person_total_count_review_high",
                "person_total_count_x",
                "average_hue",
            ],
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Load, prepare and analyse one scenario, then print its summary table.
pub fn run_scenario(
    data_dir: &Path,
    scenario: Scenario,
    options: DiagnosticsOptions,
) -> Result<IvValidityTests, DiagnosticsError> {
    let path = scenario.path(data_dir);
    info!(scenario = scenario.name(), path = %path.display(), "running scenario");

    let mut data = Dataset::from_csv_path(&path)?;
    prepare_review_features(&mut data)?;

    let mut tests = IvValidityTests::new(&data, scenario.roles(), options)?;
    tests.run_all_tests()?;
    tests.estimate_2sls()?;

    println!("\n{:=<80}", "");
    println!("SUMMARY TABLE ({})", scenario.name().to_uppercase());
    println!("{:=<80}", "");
    println!("{}", tests.summary_table());

    Ok(tests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_distinct_and_identified() {
        for scenario in Scenario::all() {
            let roles = scenario.roles();
            assert_eq!(roles.outcome, "star_avg");
            assert_eq!(roles.endogenous.len(), 2);
            assert_eq!(roles.instruments.len(), 3);
            assert_eq!(roles.controls.len(), 13);
            assert_eq!(roles.variables().len(), 1 + 2 + 3 + 13);
        }
    }

    #[test]
    fn test_file_names() {
        let dir = Path::new("data/output");
        assert_eq!(
            Scenario::Business.path(dir),
            Path::new("data/output/study1_2_business_data.csv")
        );
        assert_eq!(Scenario::Drink.to_string(), "drink");
    }
}
