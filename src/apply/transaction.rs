// src/apply/transaction.rs
//! The execution protocol as a typestate machine.
//!
//! `Idle -> CheckpointCreated -> ChangesApplied -> Validated`, then either
//! committed or failed. Each transition consumes the previous state, so a
//! transaction cannot validate before applying or roll back twice.

use std::path::{Path, PathBuf};

use super::checkpoint::{CheckpointId, CheckpointStore};
use super::types::{ExecutionRequest, ExecutionResult, ValidationStatus};
use super::writer;
use crate::events::{EventKind, EventLogger};
use crate::verification::{GateKind, GateReport, ValidationGates};

pub struct Idle;

pub struct CheckpointCreated {
    checkpoint: CheckpointId,
}

pub struct ChangesApplied {
    checkpoint: CheckpointId,
    applied: usize,
}

pub struct Validated {
    checkpoint: CheckpointId,
    applied: usize,
    status: ValidationStatus,
    gates: Vec<GateReport>,
}

/// Something went wrong after the checkpoint; only rollback remains.
pub struct Failed {
    checkpoint: CheckpointId,
    applied: usize,
    status: ValidationStatus,
    gates: Vec<GateReport>,
    error: String,
}

pub struct Transaction<'a, S> {
    root: &'a Path,
    request: &'a ExecutionRequest,
    logger: &'a EventLogger,
    state: S,
}

impl<'a, S> Transaction<'a, S> {
    fn map<T>(self, next: impl FnOnce(S) -> T) -> Transaction<'a, T> {
        Transaction {
            root: self.root,
            request: self.request,
            logger: self.logger,
            state: next(self.state),
        }
    }

    fn finish(&self, result: ExecutionResult) -> ExecutionResult {
        self.logger.log(EventKind::ExecutionFinished {
            success: result.success,
            applied: result.applied_change_count,
            rolled_back: result.rolled_back,
        });
        result
    }
}

impl<'a> Transaction<'a, Idle> {
    #[must_use]
    pub fn begin(root: &'a Path, request: &'a ExecutionRequest, logger: &'a EventLogger) -> Self {
        logger.log(EventKind::ExecutionStarted {
            description: request.description.clone(),
            changes: request.changes.len(),
        });
        Self {
            root,
            request,
            logger,
            state: Idle,
        }
    }

    /// Takes the snapshot. On failure nothing has been touched and the
    /// terminal result is returned as the error.
    ///
    /// # Errors
    /// Returns the terminal `ExecutionResult` when the store cannot snapshot.
    pub fn checkpoint(
        self,
        store: &dyn CheckpointStore,
        scope: &[PathBuf],
    ) -> Result<Transaction<'a, CheckpointCreated>, ExecutionResult> {
        let message = format!("refguard: {}", self.request.description);
        match store.create(&message, scope) {
            Ok(checkpoint) => {
                self.logger.log(EventKind::CheckpointCreated {
                    id: checkpoint.to_string(),
                });
                Ok(self.map(|Idle| CheckpointCreated { checkpoint }))
            }
            Err(e) => {
                self.logger.log(EventKind::CheckpointFailed { error: e.to_string() });
                Err(self.finish(ExecutionResult::rejected(self.request, e.to_string())))
            }
        }
    }
}

impl<'a> Transaction<'a, CheckpointCreated> {
    /// Applies every change in request order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the `Failed` transaction, with the count that landed.
    pub fn apply(self) -> Result<Transaction<'a, ChangesApplied>, Transaction<'a, Failed>> {
        let request = self.request;
        let mut applied = 0;
        for change in &request.changes {
            if let Err(e) = writer::apply_change(self.root, change, applied) {
                self.logger.log(EventKind::ApplyFailed {
                    path: change.file_path.display().to_string(),
                    error: e.to_string(),
                    applied,
                });
                return Err(self.map(|s| Failed {
                    checkpoint: s.checkpoint,
                    applied,
                    status: ValidationStatus::Skipped,
                    gates: Vec::new(),
                    error: e.to_string(),
                }));
            }
            applied += 1;
            self.logger.log(EventKind::ChangeApplied {
                path: change.file_path.display().to_string(),
                operation: change.operation.to_string(),
            });
        }
        Ok(self.map(|s| ChangesApplied {
            checkpoint: s.checkpoint,
            applied,
        }))
    }
}

impl<'a> Transaction<'a, ChangesApplied> {
    /// Runs every gate the request does not skip. Gates report, they do not error.
    #[must_use]
    pub fn validate(self, gates: &dyn ValidationGates) -> Transaction<'a, Validated> {
        let mut reports = Vec::new();
        if !self.request.skip_validation {
            for gate in GateKind::ALL {
                if skips(self.request, gate) {
                    self.logger.log(EventKind::GateSkipped { gate: gate.to_string() });
                    continue;
                }
                let report = gates.run(gate);
                if report.passed {
                    self.logger.log(EventKind::GatePassed { gate: gate.to_string() });
                } else {
                    self.logger.log(EventKind::GateFailed {
                        gate: gate.to_string(),
                        exit_code: report.exit_code().unwrap_or(-1),
                    });
                }
                reports.push(report);
            }
        }

        let status = if reports.is_empty() {
            ValidationStatus::Skipped
        } else if reports.iter().all(|r| r.passed) {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };
        self.map(|s| Validated {
            checkpoint: s.checkpoint,
            applied: s.applied,
            status,
            gates: reports,
        })
    }
}

impl<'a> Transaction<'a, Validated> {
    /// Commits when no gate failed, otherwise hands over to rollback.
    #[must_use]
    pub fn conclude(self, store: &dyn CheckpointStore) -> ExecutionResult {
        if self.state.status == ValidationStatus::Failed {
            let failed: Vec<String> = self
                .state
                .gates
                .iter()
                .filter(|g| !g.passed)
                .map(|g| g.gate.to_string())
                .collect();
            let error = format!("Validation failed: {}", failed.join(", "));
            return self
                .map(|s| Failed {
                    checkpoint: s.checkpoint,
                    applied: s.applied,
                    status: s.status,
                    gates: s.gates,
                    error,
                })
                .finish_failed(store);
        }

        self.logger.log(EventKind::Committed {
            checkpoint: self.state.checkpoint.to_string(),
        });
        let result = ExecutionResult {
            success: true,
            description: self.request.description.clone(),
            checkpoint_id: Some(self.state.checkpoint.clone()),
            applied_change_count: self.state.applied,
            requested_change_count: self.request.changes.len(),
            validation: self.state.status,
            rolled_back: false,
            rollback_error: None,
            error: None,
            gates: self.state.gates.clone(),
        };
        self.finish(result)
    }
}

impl Transaction<'_, Failed> {
    /// One rollback attempt when the request allows it. A failed rollback is
    /// reported next to the original error, never in place of it.
    #[must_use]
    pub fn finish_failed(self, store: &dyn CheckpointStore) -> ExecutionResult {
        let checkpoint = &self.state.checkpoint;
        let mut rolled_back = false;
        let mut rollback_error = None;

        if self.request.auto_rollback {
            match store.rollback(checkpoint) {
                Ok(()) => {
                    rolled_back = true;
                    self.logger.log(EventKind::RollbackSucceeded {
                        checkpoint: checkpoint.to_string(),
                    });
                }
                Err(e) => {
                    self.logger.log(EventKind::RollbackFailed {
                        checkpoint: checkpoint.to_string(),
                        error: e.to_string(),
                    });
                    rollback_error = Some(e.to_string());
                }
            }
        }

        let result = ExecutionResult {
            success: false,
            description: self.request.description.clone(),
            checkpoint_id: Some(checkpoint.clone()),
            applied_change_count: self.state.applied,
            requested_change_count: self.request.changes.len(),
            validation: self.state.status,
            rolled_back,
            rollback_error,
            error: Some(self.state.error.clone()),
            gates: self.state.gates.clone(),
        };
        self.finish(result)
    }
}

fn skips(request: &ExecutionRequest, gate: GateKind) -> bool {
    match gate {
        GateKind::Tests => request.skip_tests,
        GateKind::Lint => request.skip_lint,
        GateKind::TypeCheck => request.skip_type_check,
    }
}

/// Drives one request through the whole protocol.
#[must_use]
pub fn run(
    root: &Path,
    request: &ExecutionRequest,
    scope: &[PathBuf],
    store: &dyn CheckpointStore,
    gates: &dyn ValidationGates,
    logger: &EventLogger,
) -> ExecutionResult {
    let created = match Transaction::begin(root, request, logger).checkpoint(store, scope) {
        Ok(tx) => tx,
        Err(result) => return result,
    };
    match created.apply() {
        Ok(applied) => applied.validate(gates).conclude(store),
        Err(failed) => failed.finish_failed(store),
    }
}
