// src/config/mod.rs
pub mod types;

pub use self::types::{
    CheckpointStrategy, CommandEntry, Config, CycleConfig, ExecutorConfig, IndexConfig,
    RefguardToml, RuleConfig,
};

use crate::error::{RefguardError, Result};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "refguard.toml";

/// Directory for refguard's own state (events, checkpoints, lock). Never indexed.
pub const STATE_DIR: &str = ".refguard";

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `refguard.toml` from `root`. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns `RefguardError::Config` if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| RefguardError::Config(format!("{}: {e}", path.display())))?;
        Self::parse_toml(&content)
    }

    /// Parses config text in `refguard.toml` format.
    ///
    /// # Errors
    /// Returns `RefguardError::Config` on malformed TOML or mistyped fields.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let parsed: RefguardToml = toml::from_str(content)?;
        Ok(Self::from(parsed))
    }

    /// Commands configured for one gate, if any.
    #[must_use]
    pub fn gate_commands(&self, gate: &str) -> Option<&[String]> {
        self.commands
            .get(gate)
            .map(Vec::as_slice)
            .filter(|cmds| !cmds.is_empty())
    }
}

impl From<RefguardToml> for Config {
    fn from(file: RefguardToml) -> Self {
        Self {
            rules: file.rules,
            cycles: file.cycles,
            index: file.index,
            executor: file.executor,
            commands: file
                .commands
                .into_iter()
                .map(|(name, entry)| (name, entry.into_vec()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::parse_toml("").unwrap();
        assert_eq!(cfg.rules.complexity_threshold, 10);
        assert_eq!(cfg.cycles.high_length, 3);
        assert_eq!(cfg.executor.checkpoint, CheckpointStrategy::Auto);
        assert!(cfg.commands.is_empty());
    }

    #[test]
    fn commands_accept_string_or_list() {
        let cfg = Config::parse_toml(
            r#"
            [commands]
            test = "npm test"
            lint = ["npx eslint .", "npx prettier --check ."]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gate_commands("test"), Some(&["npm test".to_string()][..]));
        assert_eq!(cfg.gate_commands("lint").map(<[String]>::len), Some(2));
        assert_eq!(cfg.gate_commands("typecheck"), None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::parse_toml(
            r#"
            [cycles]
            low_weight_ceiling = 1
            [executor]
            checkpoint = "backup"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cycles.low_weight_ceiling, Some(1));
        assert_eq!(cfg.cycles.high_weight, 10);
        assert_eq!(cfg.executor.checkpoint, CheckpointStrategy::Backup);
        assert_eq!(cfg.executor.gate_timeout_secs, 600);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = Config::parse_toml("[rules\ncomplexity_threshold = ").unwrap_err();
        assert!(matches!(err, RefguardError::Config(_)));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.rules.caution_score, 70.0);
    }
}
