use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Files above this complexity count against the safety score.
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: usize,
    /// Scores below this trigger the "reduce risk first" recommendation.
    #[serde(default = "default_caution_score")]
    pub caution_score: f64,
    #[serde(default = "default_low_coverage")]
    pub low_coverage: f64,
    /// Fan-in at which a file counts as a hub.
    #[serde(default = "default_hub_threshold")]
    pub hub_threshold: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            complexity_threshold: default_complexity_threshold(),
            caution_score: default_caution_score(),
            low_coverage: default_low_coverage(),
            hub_threshold: default_hub_threshold(),
        }
    }
}

/// Cycle severity thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Cycles with at least this many files are `high`.
    #[serde(default = "default_high_length")]
    pub high_length: usize,
    /// Cycles whose summed edge weight reaches this are `high`.
    #[serde(default = "default_high_weight")]
    pub high_weight: usize,
    /// 2-file cycles at or below this weight drop to `low`. Unset keeps them `medium`.
    #[serde(default)]
    pub low_weight_ceiling: Option<usize>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            high_length: default_high_length(),
            high_weight: default_high_weight(),
            low_weight_ceiling: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory names pruned in addition to the built-in list.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Replaces the built-in resolution extension order when set.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointStrategy {
    #[default]
    Auto,
    Git,
    Backup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub checkpoint: CheckpointStrategy,
    #[serde(default = "default_gate_timeout")]
    pub gate_timeout_secs: u64,
    #[serde(default = "default_lock_wait")]
    pub lock_wait_secs: u64,
    #[serde(default = "default_backup_retention")]
    pub backup_retention: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            checkpoint: CheckpointStrategy::default(),
            gate_timeout_secs: default_gate_timeout(),
            lock_wait_secs: default_lock_wait(),
            backup_retention: default_backup_retention(),
        }
    }
}

const fn default_complexity_threshold() -> usize { 10 }
const fn default_caution_score() -> f64 { 70.0 }
const fn default_low_coverage() -> f64 { 50.0 }
const fn default_hub_threshold() -> usize { 5 }
const fn default_high_length() -> usize { 3 }
const fn default_high_weight() -> usize { 10 }
const fn default_gate_timeout() -> u64 { 600 }
const fn default_lock_wait() -> u64 { 30 }
const fn default_backup_retention() -> usize { 5 }

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandEntry {
    Single(String),
    List(Vec<String>),
}

impl CommandEntry {
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::List(l) => l,
        }
    }
}

/// On-disk shape of `refguard.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefguardToml {
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub cycles: CycleConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub commands: HashMap<String, CommandEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub rules: RuleConfig,
    pub cycles: CycleConfig,
    pub index: IndexConfig,
    pub executor: ExecutorConfig,
    /// Gate name (`test`, `lint`, `typecheck`) to command lines.
    pub commands: HashMap<String, Vec<String>>,
}
