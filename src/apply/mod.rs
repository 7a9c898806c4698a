// src/apply/mod.rs
//! Transactional execution of a batch of file changes.
//!
//! checkpoint, apply, validate, then commit or roll back. Everything after the
//! request check is reported through [`ExecutionResult`]; only a bad root or a
//! held lock surfaces as an error.

pub mod checkpoint;
pub mod lock;
pub mod transaction;
pub mod types;
pub mod validator;
pub mod writer;

pub use checkpoint::{store_for, BackupCheckpoints, CheckpointId, CheckpointStore, GitCheckpoints};
pub use lock::ExecutionLock;
pub use types::{ExecutionRequest, ExecutionResult, FileChange, Operation, ValidationStatus};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::events::EventLogger;
use crate::index;
use crate::verification::{CommandGates, ValidationGates};

/// Executes `request` under `root` with the given collaborators.
///
/// # Errors
/// `NotFound` if `root` does not exist, `Locked` if another execution holds
/// the project past `lock_wait_secs`. Every other failure is a terminal result.
pub fn execute(
    root: &Path,
    request: &ExecutionRequest,
    store: &dyn CheckpointStore,
    gates: &dyn ValidationGates,
    config: &Config,
) -> Result<ExecutionResult> {
    let root = index::canonical(root)?;
    let scope = match scope_of(&root, request) {
        Ok(scope) => scope,
        Err(e) => return Ok(ExecutionResult::rejected(request, e.to_string())),
    };

    let _lock = ExecutionLock::acquire(&root, Duration::from_secs(config.executor.lock_wait_secs))?;
    let logger = EventLogger::new(&root);
    Ok(transaction::run(&root, request, &scope, store, gates, &logger))
}

/// Executes with the configured checkpoint store and command gates.
///
/// # Errors
/// Same as [`execute`].
pub fn execute_in(root: &Path, request: &ExecutionRequest, config: &Config) -> Result<ExecutionResult> {
    let root = index::canonical(root)?;
    let store = store_for(&root, &config.executor);
    let gates = CommandGates::from_config(&root, config);
    execute(&root, request, store.as_ref(), &gates, config)
}

/// Root-relative paths the request touches, in request order without repeats.
fn scope_of(root: &Path, request: &ExecutionRequest) -> Result<Vec<PathBuf>> {
    validator::validate_request(root, request)?;
    let mut scope: Vec<PathBuf> = Vec::new();
    for change in &request.changes {
        let rel = validator::validate_change(root, change)?;
        if !scope.contains(&rel) {
            scope.push(rel);
        }
    }
    Ok(scope)
}
