// src/index/discovery.rs
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::{DirEntry, WalkDir};

use crate::config::STATE_DIR;
use crate::error::Result;
use crate::lang::Lang;

/// Dependency caches, build output and VCS metadata. Never descended into.
pub const PRUNE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "target",
    "out",
    "coverage",
    "vendor",
    "third_party",
    ".venv",
    "venv",
    "__pycache__",
    ".tox",
    ".cache",
    ".next",
    STATE_DIR,
];

pub const TEST_DIR_PATTERN: &str = r"(^|/)(tests?|__tests__|__mocks__|spec)/";

pub const TEST_FILE_PATTERN: &str =
    r"(?i)(\.(test|spec)\.[a-z0-9]+$|^test_.*\.py$|_test\.(py|go|rs)$|^conftest\.py$)";

static TEST_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TEST_DIR_PATTERN).unwrap_or_else(|_| panic!("Invalid Regex")));
static TEST_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TEST_FILE_PATTERN).unwrap_or_else(|_| panic!("Invalid Regex")));

/// A source file found by the walk, not yet parsed.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub lang: Lang,
    pub is_test: bool,
}

/// Walks `root` for source files in a stable (name-sorted) discovery order.
///
/// # Errors
/// The first unreadable directory or entry aborts the walk.
pub fn walk(root: &Path, extra_prune: &[String]) -> Result<Vec<Discovered>> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_prune(e, extra_prune));

    let mut files = Vec::new();
    for item in walker {
        let entry = item?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(found) = classify(root, entry.path()) {
            files.push(found);
        }
    }
    Ok(files)
}

fn should_prune(entry: &DirEntry, extra: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    PRUNE_DIRS.contains(&name.as_ref()) || extra.iter().any(|d| d == name.as_ref())
}

fn classify(root: &Path, path: &Path) -> Option<Discovered> {
    let lang = Lang::from_path(path)?;
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let is_test = is_test_path(&relative);
    Some(Discovered {
        path: path.to_path_buf(),
        relative,
        lang,
        is_test,
    })
}

/// Normalizes a path to use forward slashes (cross-platform pattern matching).
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Test-file convention: a test directory segment or a test file name.
#[must_use]
pub fn is_test_path(relative: &Path) -> bool {
    let normalized = normalize_path(relative);
    if TEST_DIR_RE.is_match(&normalized) {
        return true;
    }
    relative
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| TEST_FILE_RE.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_conventions() {
        for p in [
            "src/a.test.ts",
            "src/a.spec.tsx",
            "tests/helpers.rs",
            "pkg/__tests__/x.js",
            "test_models.py",
            "models_test.py",
            "server_test.go",
            "conftest.py",
        ] {
            assert!(is_test_path(Path::new(p)), "{p} should be a test file");
        }
        for p in ["src/testing.ts", "src/contest.py", "src/latest/a.ts", "spec.ts"] {
            assert!(!is_test_path(Path::new(p)), "{p} should not be a test file");
        }
    }

    #[test]
    fn walk_prunes_dependency_dirs_and_non_source() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join("src/b.ts"), "").unwrap();
        fs::write(root.join("src/a.ts"), "").unwrap();
        fs::write(root.join("src/notes.md"), "").unwrap();
        fs::write(root.join("node_modules/lib/index.js"), "").unwrap();
        fs::write(root.join("generated/api.ts"), "").unwrap();

        let files = walk(root, &["generated".to_string()]).unwrap();
        let rel: Vec<_> = files.iter().map(|f| normalize_path(&f.relative)).collect();
        assert_eq!(rel, vec!["src/a.ts", "src/b.ts"]);
    }

    #[test]
    fn walk_error_aborts_instead_of_shrinking_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let err = walk(&dir.path().join("vanished"), &[]).unwrap_err();
        assert!(err.to_string().contains("vanished"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_fails_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("a.ts"), "").unwrap();
        fs::write(dir.path().join("b.ts"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits.
        let readable = fs::read_dir(&locked).is_ok();
        let result = walk(dir.path(), &[]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }
        assert!(result.is_err());
    }
}
