//! Validation gates: tests, lint and type-check.
//!
//! The executor only sees the [`ValidationGates`] trait. [`CommandGates`]
//! runs the commands from `[commands]` in `refguard.toml`, falling back to the
//! detected ecosystem's defaults.

mod runner;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::project::ProjectType;

pub use crate::types::CommandResult;
pub use runner::run_commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    Tests,
    Lint,
    TypeCheck,
}

impl GateKind {
    pub const ALL: [Self; 3] = [Self::Tests, Self::Lint, Self::TypeCheck];

    /// Key under `[commands]`.
    #[must_use]
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Tests => "test",
            Self::Lint => "lint",
            Self::TypeCheck => "typecheck",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tests => "tests",
            Self::Lint => "lint",
            Self::TypeCheck => "type-check",
        })
    }
}

/// Outcome of one gate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateReport {
    pub gate: GateKind,
    pub passed: bool,
    pub commands: Vec<CommandResult>,
    pub duration_ms: u64,
    /// Set when no command was configured or detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl GateReport {
    #[must_use]
    pub fn from_commands(gate: GateKind, commands: Vec<CommandResult>, duration_ms: u64) -> Self {
        Self {
            gate,
            passed: commands.iter().all(CommandResult::passed),
            commands,
            duration_ms,
            note: None,
        }
    }

    #[must_use]
    pub fn not_configured(gate: GateKind) -> Self {
        Self {
            gate,
            passed: true,
            commands: Vec::new(),
            duration_ms: 0,
            note: Some("not configured".to_string()),
        }
    }

    /// Combined output of every command, in run order.
    #[must_use]
    pub fn output(&self) -> String {
        if let Some(note) = &self.note {
            return note.clone();
        }
        self.commands
            .iter()
            .map(CommandResult::output)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Exit code of the first failing command.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.commands.iter().find(|c| !c.passed()).map(CommandResult::exit_code)
    }
}

/// The checks run after changes are applied. Implementations block until done.
pub trait ValidationGates {
    fn run_tests(&self) -> GateReport;
    fn run_lint(&self) -> GateReport;
    fn run_type_check(&self) -> GateReport;

    fn run(&self, gate: GateKind) -> GateReport {
        match gate {
            GateKind::Tests => self.run_tests(),
            GateKind::Lint => self.run_lint(),
            GateKind::TypeCheck => self.run_type_check(),
        }
    }
}

/// Gates backed by external commands run in the project root.
#[derive(Debug, Clone)]
pub struct CommandGates {
    root: PathBuf,
    commands: HashMap<GateKind, Vec<String>>,
    timeout: Duration,
}

impl CommandGates {
    #[must_use]
    pub fn new(root: &Path, commands: HashMap<GateKind, Vec<String>>, timeout: Duration) -> Self {
        Self {
            root: root.to_path_buf(),
            commands,
            timeout,
        }
    }

    /// Commands from config, else the defaults for the project type found at `root`.
    #[must_use]
    pub fn from_config(root: &Path, config: &Config) -> Self {
        let project = ProjectType::detect_in(root);
        let commands = GateKind::ALL
            .into_iter()
            .map(|gate| {
                let cmds = config
                    .gate_commands(gate.config_key())
                    .map_or_else(|| project.default_commands(gate, root), <[String]>::to_vec);
                (gate, cmds)
            })
            .collect();
        Self::new(root, commands, Duration::from_secs(config.executor.gate_timeout_secs))
    }

    #[must_use]
    pub fn commands_for(&self, gate: GateKind) -> &[String] {
        self.commands.get(&gate).map(Vec::as_slice).unwrap_or_default()
    }

    fn run_gate(&self, gate: GateKind) -> GateReport {
        let commands = self.commands_for(gate);
        if commands.is_empty() {
            return GateReport::not_configured(gate);
        }
        let (results, duration_ms) = run_commands(&self.root, commands, self.timeout);
        GateReport::from_commands(gate, results, duration_ms)
    }
}

impl ValidationGates for CommandGates {
    fn run_tests(&self) -> GateReport {
        self.run_gate(GateKind::Tests)
    }

    fn run_lint(&self) -> GateReport {
        self.run_gate(GateKind::Lint)
    }

    fn run_type_check(&self) -> GateReport {
        self.run_gate(GateKind::TypeCheck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates(test: &[&str]) -> CommandGates {
        let mut commands = HashMap::new();
        commands.insert(GateKind::Tests, test.iter().map(|s| (*s).to_string()).collect());
        CommandGates::new(Path::new(env!("CARGO_MANIFEST_DIR")), commands, Duration::from_secs(30))
    }

    #[test]
    fn unconfigured_gate_passes_with_note() {
        let report = gates(&[]).run_lint();
        assert!(report.passed);
        assert_eq!(report.output(), "not configured");
        assert!(report.exit_code().is_none());
    }

    #[test]
    fn gate_fails_when_any_command_fails() {
        let report = gates(&["echo ok", "false"]).run(GateKind::Tests);
        assert!(!report.passed);
        assert_eq!(report.commands.len(), 2);
        assert_ne!(report.exit_code(), Some(0));
        assert!(report.output().contains("ok"));
    }

    #[test]
    fn configured_commands_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();
        let config = Config::parse_toml("[commands]\ntest = \"echo custom\"\n").unwrap();
        let gates = CommandGates::from_config(dir.path(), &config);
        assert_eq!(gates.commands_for(GateKind::Tests), ["echo custom".to_string()]);
        assert_eq!(gates.commands_for(GateKind::Lint), ["cargo clippy --all-targets".to_string()]);
    }
}
