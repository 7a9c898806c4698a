// src/apply/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::checkpoint::CheckpointId;
use crate::verification::GateReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Create and update carry the new file body.
    #[must_use]
    pub fn needs_content(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// One requested mutation. `file_path` is relative to the project root, or
/// absolute inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub file_path: PathBuf,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
}

impl FileChange {
    #[must_use]
    pub fn create(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
            operation: Operation::Create,
            new_content: Some(content.into()),
        }
    }

    #[must_use]
    pub fn update(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
            operation: Operation::Update,
            new_content: Some(content.into()),
        }
    }

    #[must_use]
    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            operation: Operation::Delete,
            new_content: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub changes: Vec<FileChange>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skip_validation: bool,
    #[serde(default = "default_true")]
    pub auto_rollback: bool,
    #[serde(default)]
    pub skip_tests: bool,
    #[serde(default)]
    pub skip_lint: bool,
    #[serde(default)]
    pub skip_type_check: bool,
}

fn default_true() -> bool {
    true
}

impl ExecutionRequest {
    #[must_use]
    pub fn new(description: impl Into<String>, changes: Vec<FileChange>) -> Self {
        Self {
            changes,
            description: description.into(),
            skip_validation: false,
            auto_rollback: true,
            skip_tests: false,
            skip_lint: false,
            skip_type_check: false,
        }
    }

    /// Parses a request from its JSON form.
    ///
    /// # Errors
    /// Returns `RefguardError::Resolution` if the JSON does not describe a request.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::error::RefguardError::Resolution(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// No gate ran: validation was skipped or the run stopped before it.
    Skipped,
    Passed,
    Failed,
}

/// Terminal outcome of one execution. Never retried.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub description: String,
    pub checkpoint_id: Option<CheckpointId>,
    pub applied_change_count: usize,
    pub requested_change_count: usize,
    pub validation: ValidationStatus,
    pub rolled_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub gates: Vec<GateReport>,
}

impl ExecutionResult {
    /// A result for a request that never reached the working tree.
    #[must_use]
    pub fn rejected(request: &ExecutionRequest, error: String) -> Self {
        Self {
            success: false,
            description: request.description.clone(),
            checkpoint_id: None,
            applied_change_count: 0,
            requested_change_count: request.changes.len(),
            validation: ValidationStatus::Skipped,
            rolled_back: false,
            rollback_error: None,
            error: Some(error),
            gates: Vec::new(),
        }
    }

    #[must_use]
    pub fn validation_passed(&self) -> bool {
        self.validation == ValidationStatus::Passed
    }

    /// Gates that ran and failed.
    pub fn failed_gates(&self) -> impl Iterator<Item = &GateReport> {
        self.gates.iter().filter(|g| !g.passed)
    }
}
