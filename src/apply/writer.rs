// src/apply/writer.rs
use std::fs;
use std::io;
use std::path::Path;

use super::types::{FileChange, Operation};
use super::validator;
use crate::error::{RefguardError, Result};

/// Applies one change under `root`. `applied` is the number of changes that
/// already landed, carried into the error.
///
/// # Errors
/// Returns `RefguardError::Apply` naming the file and operation that failed.
pub fn apply_change(root: &Path, change: &FileChange, applied: usize) -> Result<()> {
    let relative = validator::relative_target(root, &change.file_path)?;
    let path = root.join(&relative);
    let fail = |source: io::Error| RefguardError::Apply {
        path: relative.clone(),
        operation: change.operation.to_string(),
        applied,
        source,
    };

    match change.operation {
        Operation::Create | Operation::Update => {
            let content = change.new_content.as_deref().ok_or_else(|| {
                RefguardError::Resolution(format!("{} requires newContent", relative.display()))
            })?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(fail)?;
            }
            fs::write(&path, content).map_err(fail)
        }
        Operation::Delete => fs::remove_file(&path).map_err(fail),
    }
}
