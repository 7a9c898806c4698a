// src/apply/validator.rs
//! Request checks that run before any checkpoint is taken.

use std::path::{Component, Path, PathBuf};

use super::types::{ExecutionRequest, FileChange};
use crate::config::STATE_DIR;
use crate::error::{RefguardError, Result};

const BLOCKED_DIRS: &[&str] = &[".git", STATE_DIR];

/// Checks every change in `request`.
///
/// # Errors
/// Returns `RefguardError::Resolution` naming the first offending change.
pub fn validate_request(root: &Path, request: &ExecutionRequest) -> Result<()> {
    if request.changes.is_empty() {
        return Err(RefguardError::Resolution("request contains no changes".into()));
    }
    for (i, change) in request.changes.iter().enumerate() {
        validate_change(root, change)
            .map_err(|e| RefguardError::Resolution(format!("change #{}: {}", i + 1, detail(e))))?;
    }
    Ok(())
}

/// Checks one change and returns its root-relative path.
///
/// # Errors
/// Returns `RefguardError::Resolution` on a bad path or missing content.
pub fn validate_change(root: &Path, change: &FileChange) -> Result<PathBuf> {
    let relative = relative_target(root, &change.file_path)?;
    if change.operation.needs_content() && change.new_content.is_none() {
        return Err(RefguardError::Resolution(format!(
            "{} of {} requires newContent",
            change.operation,
            relative.display()
        )));
    }
    Ok(relative)
}

/// Maps a requested path onto the project root.
///
/// # Errors
/// Returns `RefguardError::Resolution` for empty, escaping or blocked paths.
pub fn relative_target(root: &Path, path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(RefguardError::Resolution("empty file path".into()));
    }
    if raw.contains('\0') {
        return Err(RefguardError::Resolution(format!("null byte in path {raw:?}")));
    }

    let relative = if path.is_absolute() {
        path.strip_prefix(root)
            .map_err(|_| RefguardError::Resolution(format!("{raw} is outside the project root")))?
            .to_path_buf()
    } else if is_absolute_os(&raw) {
        return Err(RefguardError::Resolution(format!("{raw} is outside the project root")));
    } else {
        path.to_path_buf()
    };

    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::ParentDir => {
                return Err(RefguardError::Resolution(format!("{raw} contains '..'")));
            }
            Component::Normal(part) => clean.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let Some(Component::Normal(first)) = clean.components().next() else {
        return Err(RefguardError::Resolution(format!("{raw} does not name a file")));
    };
    if BLOCKED_DIRS.iter().any(|b| first == *b) {
        return Err(RefguardError::Resolution(format!("{raw} targets a protected directory")));
    }
    Ok(clean)
}

/// Absolute on any platform, including drive letters and UNC paths.
fn is_absolute_os(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with("\\\\") {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn detail(err: RefguardError) -> String {
    match err {
        RefguardError::Resolution(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_validation_logic() {
        let root = Path::new("/proj");
        let cases = vec![
            ("src/a.ts", true, "Simple relative"),
            ("./src/a.ts", true, "Dot prefix"),
            ("/proj/src/a.ts", true, "Absolute inside root"),
            ("/etc/passwd", false, "Absolute outside root"),
            ("C:\\absolute\\win", false, "Windows drive absolute"),
            ("\\\\unc\\path", false, "Windows UNC"),
            ("../traversal", false, "Parent traversal"),
            ("src/../../x", false, "Nested traversal"),
            (".git/config", false, "Blocked dir (.git)"),
            (".refguard/events.jsonl", false, "Blocked dir (state)"),
            (".gitignore", true, "Dotfile at root"),
            ("", false, "Empty"),
            ("   ", false, "Whitespace only"),
            (".", false, "Root itself"),
            ("foo\0bar", false, "Null byte"),
        ];

        for (path, expected, desc) in cases {
            let result = relative_target(root, Path::new(path));
            assert_eq!(result.is_ok(), expected, "{desc} ({path:?}): {result:?}");
        }
    }

    #[test]
    fn test_is_absolute_os() {
        assert!(is_absolute_os("/"));
        assert!(is_absolute_os("C:"));
        assert!(is_absolute_os("D:\\path"));
        assert!(is_absolute_os("\\\\server\\share"));
        assert!(!is_absolute_os("relative/path"));
    }

    #[test]
    fn absolute_paths_inside_root_become_relative() {
        let rel = relative_target(Path::new("/proj"), Path::new("/proj/./src/a.ts")).unwrap();
        assert_eq!(rel, PathBuf::from("src/a.ts"));
    }

    #[test]
    fn writes_need_content() {
        let root = Path::new("/proj");
        let mut change = FileChange::update("a.ts", "x");
        change.new_content = None;
        assert!(validate_change(root, &change).is_err());
        assert!(validate_change(root, &FileChange::delete("a.ts")).is_ok());
        assert!(validate_change(root, &FileChange::create("a.ts", "")).is_ok());
    }

    #[test]
    fn request_errors_name_the_change() {
        let request = ExecutionRequest::new(
            "bad",
            vec![FileChange::update("a.ts", "x"), FileChange::delete("../b.ts")],
        );
        let err = validate_request(Path::new("/proj"), &request).unwrap_err();
        assert!(err.to_string().contains("change #2"), "{err}");

        let empty = ExecutionRequest::new("empty", Vec::new());
        assert!(validate_request(Path::new("/proj"), &empty).is_err());
    }
}
