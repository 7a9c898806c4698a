// src/apply/checkpoint/backup.rs
//! File-copy checkpoints for trees outside version control.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{CheckpointId, CheckpointStore};
use crate::config::STATE_DIR;
use crate::error::{RefguardError, Result};

pub const CHECKPOINT_DIR: &str = "checkpoints";

const MANIFEST: &str = "manifest.json";
const FILES: &str = "files";

#[derive(Debug, Serialize, Deserialize)]
struct BackupManifest {
    message: String,
    created_at: u64,
    /// Copied into `files/`.
    present: Vec<PathBuf>,
    /// Did not exist; removed on rollback.
    absent: Vec<PathBuf>,
}

/// Copies every scope file into `.refguard/checkpoints/<id>/`.
#[derive(Debug, Clone)]
pub struct BackupCheckpoints {
    root: PathBuf,
    retention: usize,
}

impl BackupCheckpoints {
    #[must_use]
    pub fn new(root: &Path, retention: usize) -> Self {
        Self {
            root: root.to_path_buf(),
            retention: retention.max(1),
        }
    }

    fn base(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(CHECKPOINT_DIR)
    }

    fn snapshot(&self, dir: &Path, message: &str, created_at: u64, scope: &[PathBuf]) -> Result<()> {
        let mut manifest = BackupManifest {
            message: message.to_string(),
            created_at,
            present: Vec::new(),
            absent: Vec::new(),
        };
        for rel in scope {
            let src = self.root.join(rel);
            if !src.exists() {
                manifest.absent.push(rel.clone());
                continue;
            }
            let dest = dir.join(FILES).join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| checkpoint_io("create", parent, &e))?;
            }
            fs::copy(&src, &dest).map_err(|e| checkpoint_io("back up", &src, &e))?;
            manifest.present.push(rel.clone());
        }
        let json = serde_json::to_string_pretty(&manifest)?;
        let path = dir.join(MANIFEST);
        fs::write(&path, json).map_err(|e| checkpoint_io("write", &path, &e))
    }

    /// Removes the oldest checkpoints beyond the retention count.
    fn prune(&self) {
        let Ok(entries) = fs::read_dir(self.base()) else {
            return;
        };
        let mut stamped: Vec<(u64, PathBuf)> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|e| {
                let path = e.path();
                let name = path.file_name()?.to_string_lossy().into_owned();
                let stamp: u64 = name.split('-').next()?.parse().ok()?;
                Some((stamp, path))
            })
            .collect();

        stamped.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in stamped.into_iter().skip(self.retention) {
            let _ = fs::remove_dir_all(path);
        }
    }
}

impl CheckpointStore for BackupCheckpoints {
    fn create(&self, message: &str, scope: &[PathBuf]) -> Result<CheckpointId> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RefguardError::Checkpoint(e.to_string()))?;
        let created_at = u64::try_from(now.as_millis()).unwrap_or(u64::MAX);
        let id = CheckpointId::new(format!("{created_at}-{}", short_hash(message, now.as_nanos(), scope)));

        let base = self.base();
        fs::create_dir_all(&base).map_err(|e| checkpoint_io("create", &base, &e))?;
        let dir = base.join(id.as_str());
        fs::create_dir(&dir).map_err(|e| checkpoint_io("create", &dir, &e))?;

        if let Err(e) = self.snapshot(&dir, message, created_at, scope) {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        self.prune();
        Ok(id)
    }

    fn rollback(&self, id: &CheckpointId) -> Result<()> {
        let dir = self.base().join(id.as_str());
        let manifest_path = dir.join(MANIFEST);
        let raw = fs::read_to_string(&manifest_path)
            .map_err(|_| RefguardError::Checkpoint(format!("checkpoint {id} not found")))?;
        let manifest: BackupManifest = serde_json::from_str(&raw)
            .map_err(|e| RefguardError::Checkpoint(format!("checkpoint {id} is corrupt: {e}")))?;

        for rel in &manifest.present {
            let dest = self.root.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| checkpoint_io("create", parent, &e))?;
            }
            fs::copy(dir.join(FILES).join(rel), &dest).map_err(|e| checkpoint_io("restore", &dest, &e))?;
        }
        for rel in &manifest.absent {
            let path = self.root.join(rel);
            if path.exists() {
                fs::remove_file(&path).map_err(|e| checkpoint_io("remove", &path, &e))?;
            }
        }
        Ok(())
    }
}

fn short_hash(message: &str, nanos: u128, scope: &[PathBuf]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(nanos.to_le_bytes());
    for path in scope {
        hasher.update(path.to_string_lossy().as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    digest.chars().take(8).collect()
}

fn checkpoint_io(action: &str, path: &Path, err: &std::io::Error) -> RefguardError {
    RefguardError::Checkpoint(format!("failed to {action} {}: {err}", path.display()))
}
