// src/apply/checkpoint/mod.rs
//! Snapshots of the working tree taken before an execution mutates it.

mod backup;
mod git;

pub use backup::{BackupCheckpoints, CHECKPOINT_DIR};
pub use git::GitCheckpoints;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{CheckpointStrategy, ExecutorConfig};
use crate::error::Result;

/// Opaque handle to a snapshot. Only the store that issued it can interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointId(String);

impl CheckpointId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait CheckpointStore {
    /// Snapshots the tree. `scope` lists the root-relative paths the execution
    /// may touch, so files that do not exist yet can be removed on rollback.
    ///
    /// # Errors
    /// Returns `RefguardError::Checkpoint` if no snapshot could be taken.
    fn create(&self, message: &str, scope: &[PathBuf]) -> Result<CheckpointId>;

    /// Restores the tree to the snapshot.
    ///
    /// # Errors
    /// Returns `RefguardError::Checkpoint` if the snapshot is unknown or cannot be restored.
    fn rollback(&self, id: &CheckpointId) -> Result<()>;
}

/// The store configured for `root`. `auto` uses git inside a work tree that
/// has at least one commit, and backups otherwise.
#[must_use]
pub fn store_for(root: &Path, config: &ExecutorConfig) -> Box<dyn CheckpointStore> {
    let use_git = match config.checkpoint {
        CheckpointStrategy::Git => true,
        CheckpointStrategy::Backup => false,
        CheckpointStrategy::Auto => git::in_work_tree(root) && git::has_commits(root),
    };
    if use_git {
        Box::new(GitCheckpoints::new(root))
    } else {
        Box::new(BackupCheckpoints::new(root, config.backup_retention))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STATE_DIR;
    use std::fs;

    #[test]
    fn auto_falls_back_to_backups_in_a_fresh_repo() {
        let Some(dir) = git::tests::unborn_repo() else {
            return;
        };
        let root = dir.path();
        fs::write(root.join("a.ts"), "original").unwrap();

        let store = store_for(root, &ExecutorConfig::default());
        let id = store.create("refguard: first run", &[PathBuf::from("a.ts")]).unwrap();
        assert!(root.join(STATE_DIR).join(CHECKPOINT_DIR).exists());

        fs::write(root.join("a.ts"), "changed").unwrap();
        store.rollback(&id).unwrap();
        assert_eq!(fs::read_to_string(root.join("a.ts")).unwrap(), "original");
    }

    #[test]
    fn auto_uses_backups_outside_git() {
        let dir = tempfile::tempdir().unwrap();
        if git::in_work_tree(dir.path()) {
            return;
        }
        let store = store_for(dir.path(), &ExecutorConfig::default());
        store.create("refguard: plain dir", &[]).unwrap();
        assert!(dir.path().join(STATE_DIR).join(CHECKPOINT_DIR).exists());
    }
}
