#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use revop::EngineConfig;

use crate::error::Result;
use crate::scenario;

#[derive(Debug, Parser)]
#[command(
    name = "revop-demo",
    about = "Walk the reversible operation engine through its demo scenarios",
    version
)]
pub struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    pub config: Option<PathBuf>,

    /// Scenario to run.
    #[arg(long, value_enum, default_value_t = ScenarioChoice::All)]
    pub scenario: ScenarioChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioChoice {
    /// Create, rename and delete files.
    Files,
    /// Type text and restore checkpoints.
    Editor,
    /// Both, files first.
    All,
}

pub fn run_from_env() -> Result<Vec<String>> {
    run(Cli::parse())
}

/// Run the selected scenarios and return their transcripts.
pub fn run(cli: Cli) -> Result<Vec<String>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    tracing::info!(
        target: "revop_demo",
        max_depth = config.history.max_depth,
        max_bytes = config.history.max_bytes,
        slow_operation_ms = config.slow_operation_ms,
        "engine configured"
    );

    let mut lines = Vec::new();
    if matches!(cli.scenario, ScenarioChoice::Files | ScenarioChoice::All) {
        lines.extend(scenario::file_system(config)?.transcript);
    }
    if matches!(cli.scenario, ScenarioChoice::Editor | ScenarioChoice::All) {
        lines.extend(scenario::text_editor(config)?.transcript);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use std::io::Write;

    #[test]
    fn positional_config_path_is_optional() {
        let cli = Cli::parse_from(["revop-demo"]);
        assert!(cli.config.is_none());
        assert_eq!(cli.scenario, ScenarioChoice::All);

        let cli = Cli::parse_from(["revop-demo", "engine.toml", "--scenario", "editor"]);
        assert_eq!(cli.config, Some(PathBuf::from("engine.toml")));
        assert_eq!(cli.scenario, ScenarioChoice::Editor);
    }

    #[test]
    fn runs_selected_scenario_only() {
        let lines = run(Cli::parse_from(["revop-demo", "--scenario", "files"])).unwrap();
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| l.starts_with("[files]")));
    }

    #[test]
    fn config_file_is_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history]\nmax_depth = 1").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let lines = run(Cli::parse_from(["revop-demo", path.as_str(), "--scenario", "files"])).unwrap();
        let boundaries = lines
            .iter()
            .filter(|l| l.ends_with("nothing to undo"))
            .count();
        assert_eq!(boundaries, 3);
    }

    #[test]
    fn invalid_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history]\nmax_depth = 0").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let err = run(Cli::parse_from(["revop-demo", path.as_str()])).unwrap_err();
        assert!(matches!(err, DemoError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
