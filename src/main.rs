use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use iv_validity::core::DiagnosticsOptions;
use iv_validity::scenarios::{run_scenario, Scenario};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iv-validity")]
#[command(about = "Instrumental-variable validity diagnostics for the review-rating studies")]
#[command(version)]
struct Cli {
    /// Scenario to analyse
    #[arg(value_enum, ignore_case = true, default_value = "all")]
    scenario: ScenarioSelection,

    /// Directory holding the scenario CSV files
    #[arg(long, default_value = "data/output")]
    data_dir: PathBuf,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,

    /// Only print the composite report and the summary table
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioSelection {
    #[value(alias = "res")]
    Restaurant,
    #[value(alias = "biz")]
    Business,
    Drink,
    All,
}

impl ScenarioSelection {
    fn scenarios(self) -> Vec<Scenario> {
        match self {
            ScenarioSelection::Restaurant => vec![Scenario::Restaurant],
            ScenarioSelection::Business => vec![Scenario::Business],
            ScenarioSelection::Drink => vec![Scenario::Drink],
            ScenarioSelection::All => Scenario::all().to_vec(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = DiagnosticsOptions::builder()
        .verbose(!cli.quiet)
        .build()
        .context("invalid diagnostics options")?;

    for scenario in cli.scenario.scenarios() {
        let path = scenario.path(&cli.data_dir);
        run_scenario(&cli.data_dir, scenario, options.clone()).with_context(|| {
            format!("{} scenario failed ({})", scenario, path.display())
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_aliases() {
        let cli = Cli::try_parse_from(["iv-validity", "res"]).unwrap();
        assert_eq!(cli.scenario, ScenarioSelection::Restaurant);
        let cli = Cli::try_parse_from(["iv-validity", "BIZ"]).unwrap();
        assert_eq!(cli.scenario, ScenarioSelection::Business);
        let cli = Cli::try_parse_from(["iv-validity", "Drink"]).unwrap();
        assert_eq!(cli.scenario, ScenarioSelection::Drink);
    }

    #[test]
    fn test_defaults_run_everything() {
        let cli = Cli::try_parse_from(["iv-validity"]).unwrap();
        assert_eq!(cli.scenario.scenarios().len(), 3);
        assert_eq!(cli.data_dir, PathBuf::from("data/output"));
        assert_eq!(cli.log_level, tracing::Level::WARN);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        assert!(Cli::try_parse_from(["iv-validity", "bakery"]).is_err());
    }
}
