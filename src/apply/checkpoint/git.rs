// src/apply/checkpoint/git.rs
//! Checkpoints kept as git stash entries.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError};

use super::{CheckpointId, CheckpointStore};
use crate::error::{RefguardError, Result};

/// What git cannot restore for a scope path.
#[derive(Debug)]
enum Loose {
    /// Did not exist at checkpoint time.
    Absent(PathBuf),
    /// Existed but untracked, so the stash does not hold it.
    Untracked(PathBuf, Vec<u8>),
}

/// Snapshots tracked files with `git stash create`, retained via `git stash store`.
#[derive(Debug)]
pub struct GitCheckpoints {
    root: PathBuf,
    loose: Mutex<HashMap<CheckpointId, Vec<Loose>>>,
}

impl GitCheckpoints {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            loose: Mutex::new(HashMap::new()),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.root, args)
    }

    fn tracked(&self, scope: &[PathBuf]) -> Result<HashSet<PathBuf>> {
        if scope.is_empty() {
            return Ok(HashSet::new());
        }
        let mut args = vec!["ls-files", "-z", "--"];
        let names: Vec<String> = scope.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        args.extend(names.iter().map(String::as_str));
        let out = self.git(&args)?;
        Ok(out.split('\0').filter(|s| !s.is_empty()).map(PathBuf::from).collect())
    }

    fn loose_entries(&self, scope: &[PathBuf]) -> Result<Vec<Loose>> {
        let tracked = self.tracked(scope)?;
        let mut loose = Vec::new();
        for rel in scope {
            let path = self.root.join(rel);
            if !path.exists() {
                loose.push(Loose::Absent(rel.clone()));
            } else if !tracked.contains(rel) {
                let bytes = fs::read(&path).map_err(|e| {
                    RefguardError::Checkpoint(format!("failed to read {}: {e}", path.display()))
                })?;
                loose.push(Loose::Untracked(rel.clone(), bytes));
            }
        }
        Ok(loose)
    }

    fn restore_loose(&self, id: &CheckpointId) -> Result<()> {
        let entries = self
            .loose
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .unwrap_or_default();
        for entry in entries {
            match entry {
                Loose::Absent(rel) => {
                    let path = self.root.join(rel);
                    if path.exists() {
                        fs::remove_file(&path).map_err(|e| {
                            RefguardError::Checkpoint(format!("failed to remove {}: {e}", path.display()))
                        })?;
                    }
                }
                Loose::Untracked(rel, bytes) => {
                    let path = self.root.join(rel);
                    fs::write(&path, bytes).map_err(|e| {
                        RefguardError::Checkpoint(format!("failed to restore {}: {e}", path.display()))
                    })?;
                }
            }
        }
        Ok(())
    }
}

impl CheckpointStore for GitCheckpoints {
    fn create(&self, message: &str, scope: &[PathBuf]) -> Result<CheckpointId> {
        if !in_work_tree(&self.root) {
            return Err(RefguardError::Checkpoint(format!(
                "{} is not inside a git work tree",
                self.root.display()
            )));
        }
        if !has_commits(&self.root) {
            return Err(RefguardError::Checkpoint(format!(
                "{} has no commits to snapshot against; commit once or use checkpoint = \"backup\"",
                self.root.display()
            )));
        }
        let loose = self.loose_entries(scope)?;

        let stash = self.git(&["stash", "create", message])?.trim().to_string();
        let sha = if stash.is_empty() {
            // Clean tree: HEAD already is the snapshot.
            self.git(&["rev-parse", "HEAD"])?.trim().to_string()
        } else {
            self.git(&["stash", "store", "-m", message, &stash])?;
            stash
        };

        let id = CheckpointId::new(sha);
        self.loose
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), loose);
        Ok(id)
    }

    fn rollback(&self, id: &CheckpointId) -> Result<()> {
        self.git(&["checkout", id.as_str(), "--", "."])?;
        self.restore_loose(id)
    }
}

/// True when `root` is inside a git work tree.
#[must_use]
pub fn in_work_tree(root: &Path) -> bool {
    Command::new("git")
        .current_dir(root)
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "true")
        .unwrap_or(false)
}

/// True when `HEAD` names a commit. A freshly initialized repo has none.
#[must_use]
pub fn has_commits(root: &Path) -> bool {
    Command::new("git")
        .current_dir(root)
        .args(["rev-parse", "--verify", "--quiet", "HEAD"])
        .output()
        .is_ok_and(|o| o.status.success())
}

fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .current_dir(root)
        .args(args)
        .output()
        .map_err(|e| RefguardError::Checkpoint(format!("failed to run git {}: {e}", args.join(" "))))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RefguardError::Checkpoint(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
