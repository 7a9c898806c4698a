// src/events.rs
//! Machine-readable event journal for executions.
//!
//! Events are appended to `.refguard/events.jsonl` under the project root.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::STATE_DIR;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ExecutionStarted {
        description: String,
        changes: usize,
    },
    CheckpointCreated {
        id: String,
    },
    CheckpointFailed {
        error: String,
    },
    ChangeApplied {
        path: String,
        operation: String,
    },
    ApplyFailed {
        path: String,
        error: String,
        applied: usize,
    },
    GatePassed {
        gate: String,
    },
    GateFailed {
        gate: String,
        exit_code: i32,
    },
    GateSkipped {
        gate: String,
    },
    Committed {
        checkpoint: String,
    },
    RollbackSucceeded {
        checkpoint: String,
    },
    RollbackFailed {
        checkpoint: String,
        error: String,
    },
    ExecutionFinished {
        success: bool,
        applied: usize,
        rolled_back: bool,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefguardEvent {
    pub timestamp: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub struct EventLogger {
    log_path: PathBuf,
}

impl EventLogger {
    #[must_use]
    pub fn new(repo_root: &Path) -> Self {
        let log_path = repo_root.join(STATE_DIR).join("events.jsonl");
        Self { log_path }
    }

    pub fn log(&self, kind: EventKind) {
        // Best-effort: a journal write never changes an execution outcome.
        if let Ok(json) = Self::serialize_event(kind) {
            let _ = self.append_to_file(&json);
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Reads back every event in the journal, skipping unparsable lines.
    #[must_use]
    pub fn read_all(&self) -> Vec<RefguardEvent> {
        fs::read_to_string(&self.log_path)
            .map(|content| {
                content
                    .lines()
                    .filter_map(|line| serde_json::from_str(line).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn serialize_event(kind: EventKind) -> Result<String> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let event = RefguardEvent { timestamp, kind };
        Ok(serde_json::to_string(&event)?)
    }

    fn append_to_file(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_through_journal() {
        let dir = tempfile::tempdir().unwrap();
        let logger = EventLogger::new(dir.path());
        logger.log(EventKind::CheckpointCreated { id: "abc".into() });
        logger.log(EventKind::GateSkipped { gate: "lint".into() });

        let events = logger.read_all();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::CheckpointCreated { id: "abc".into() });
        assert!(logger.path().ends_with(".refguard/events.jsonl"));
    }
}
