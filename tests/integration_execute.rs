// tests/integration_execute.rs
//! End-to-end executions against throwaway project trees.

use refguard_core::apply::{
    self, BackupCheckpoints, CheckpointId, CheckpointStore, ExecutionRequest, FileChange,
    ValidationStatus,
};
use refguard_core::config::Config;
use refguard_core::error::RefguardError;
use refguard_core::verification::{CommandGates, GateKind};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn gates(root: &Path, test: &str) -> CommandGates {
    let mut commands = HashMap::new();
    commands.insert(GateKind::Tests, vec![test.to_string()]);
    CommandGates::new(root, commands, Duration::from_secs(30))
}

struct BrokenStore;

impl CheckpointStore for BrokenStore {
    fn create(&self, _message: &str, _scope: &[PathBuf]) -> refguard_core::error::Result<CheckpointId> {
        Err(RefguardError::Checkpoint("no snapshot today".into()))
    }

    fn rollback(&self, _id: &CheckpointId) -> refguard_core::error::Result<()> {
        Ok(())
    }
}

#[test]
fn failing_test_gate_restores_original_content() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::write(root.join("a.ts"), "export const a = 1;\n")?;

    let json = r#"{"changes":[{"filePath":"a.ts","operation":"update","newContent":"x"}],"autoRollback":true}"#;
    let request = ExecutionRequest::from_json(json)?;
    let store = BackupCheckpoints::new(&root, 5);
    let result = apply::execute(&root, &request, &store, &gates(&root, "false"), &Config::default())?;

    assert!(!result.success);
    assert!(result.rolled_back);
    assert_eq!(result.validation, ValidationStatus::Failed);
    assert_eq!(fs::read_to_string(root.join("a.ts"))?, "export const a = 1;\n");
    Ok(())
}

#[test]
fn passing_gates_commit_the_batch() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::write(root.join("old.ts"), "legacy")?;

    let request = ExecutionRequest::new(
        "move helper",
        vec![FileChange::create("src/helper.ts", "export {}\n"), FileChange::delete("old.ts")],
    );
    let store = BackupCheckpoints::new(&root, 5);
    let result = apply::execute(&root, &request, &store, &gates(&root, "true"), &Config::default())?;

    assert!(result.success, "{:?}", result.error);
    assert!(result.validation_passed());
    assert_eq!(result.applied_change_count, 2);
    assert!(root.join("src/helper.ts").exists());
    assert!(!root.join("old.ts").exists());

    // The checkpoint is retained after commit.
    let id = result.checkpoint_id.ok_or("checkpoint missing")?;
    store.rollback(&id)?;
    assert!(root.join("old.ts").exists());
    assert!(!root.join("src/helper.ts").exists());
    Ok(())
}

#[test]
fn checkpoint_failure_leaves_tree_untouched() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::write(root.join("a.ts"), "keep")?;

    let request = ExecutionRequest::new("doomed", vec![FileChange::update("a.ts", "x")]);
    let result = apply::execute(&root, &request, &BrokenStore, &gates(&root, "true"), &Config::default())?;

    assert!(!result.success);
    assert_eq!(result.applied_change_count, 0);
    assert!(!result.rolled_back);
    assert!(result.error.unwrap_or_default().contains("no snapshot today"));
    assert_eq!(fs::read_to_string(root.join("a.ts"))?, "keep");
    Ok(())
}

#[test]
fn skip_validation_commits_without_gates() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::write(root.join("a.ts"), "old")?;

    let mut request = ExecutionRequest::new("quick", vec![FileChange::update("a.ts", "new")]);
    request.skip_validation = true;
    let store = BackupCheckpoints::new(&root, 5);
    let result = apply::execute(&root, &request, &store, &gates(&root, "false"), &Config::default())?;

    assert!(result.success);
    assert_eq!(result.validation, ValidationStatus::Skipped);
    assert!(result.gates.is_empty());
    assert_eq!(fs::read_to_string(root.join("a.ts"))?, "new");
    Ok(())
}

#[test]
fn escaping_paths_are_rejected_before_any_write() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::create_dir(root.join("proj"))?;
    let proj = root.join("proj");

    let request = ExecutionRequest::new(
        "escape",
        vec![FileChange::create("ok.ts", "x"), FileChange::create("../evil.ts", "x")],
    );
    let store = BackupCheckpoints::new(&proj, 5);
    let result = apply::execute(&proj, &request, &store, &gates(&proj, "true"), &Config::default())?;

    assert!(!result.success);
    assert_eq!(result.applied_change_count, 0);
    assert!(result.checkpoint_id.is_none());
    assert!(!proj.join("ok.ts").exists());
    assert!(!root.join("evil.ts").exists());
    Ok(())
}

#[test]
fn configured_backup_strategy_runs_end_to_end() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::write(
        root.join("refguard.toml"),
        "[executor]\ncheckpoint = \"backup\"\n\n[commands]\ntest = \"false\"\nlint = \"true\"\ntypecheck = \"true\"\n",
    )?;
    fs::write(root.join("a.ts"), "before")?;

    let config = Config::load(&root)?;
    let request = ExecutionRequest::new("configured", vec![FileChange::update("a.ts", "after")]);
    let result = apply::execute_in(&root, &request, &config)?;

    assert!(!result.success);
    assert!(result.rolled_back);
    assert_eq!(result.failed_gates().count(), 1);
    assert_eq!(fs::read_to_string(root.join("a.ts"))?, "before");
    assert!(root.join(".refguard/events.jsonl").exists());
    Ok(())
}

#[test]
fn lock_orphaned_by_a_dead_run_does_not_block_execution() -> Result<()> {
    let d = tempdir()?;
    let root = fs::canonicalize(d.path())?;
    fs::create_dir_all(root.join(".refguard"))?;
    fs::write(root.join(".refguard/execute.lock"), "4000000\n")?;
    fs::write(root.join("a.ts"), "old")?;

    let mut config = Config::default();
    config.executor.lock_wait_secs = 1;
    let request = ExecutionRequest::new("after crash", vec![FileChange::update("a.ts", "new")]);
    let store = BackupCheckpoints::new(&root, 5);
    let result = apply::execute(&root, &request, &store, &gates(&root, "true"), &config)?;

    assert!(result.success, "{:?}", result.error);
    assert!(!root.join(".refguard/execute.lock").exists());
    Ok(())
}
