//! Walks a project and produces one [`FileRecord`] per source file.

pub mod complexity;
pub mod discovery;
pub mod extract;

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::Parser;

use crate::config::IndexConfig;
use crate::error::{RefguardError, Result};
use crate::lang;
use crate::types::FileRecord;

pub use discovery::is_test_path;

/// Inputs to one indexing run.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub include_tests: bool,
    /// Directory names pruned in addition to the built-in list.
    pub exclude_dirs: Vec<String>,
}

impl IndexOptions {
    #[must_use]
    pub fn new(include_tests: bool) -> Self {
        Self {
            include_tests,
            exclude_dirs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &IndexConfig) -> Self {
        self.exclude_dirs.clone_from(&config.exclude_dirs);
        self
    }
}

/// Indexes every source file under `target`, in discovery order.
///
/// A file target indexes its directory and keeps only that file.
///
/// # Errors
/// Returns `NotFound` before any work if `target` does not exist, and aborts
/// on the first file that cannot be read.
pub fn index(target: &Path, options: &IndexOptions) -> Result<Vec<FileRecord>> {
    let target = canonical(target)?;

    let (root, only) = if target.is_file() {
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| RefguardError::NotFound {
                path: target.clone(),
            })?;
        (parent, Some(target))
    } else {
        (target, None)
    };

    let found = discovery::walk(&root, &options.exclude_dirs)?;
    let selected: Vec<_> = found
        .into_iter()
        .filter(|f| match &only {
            Some(file) => &f.path == file,
            None => options.include_tests || !f.is_test,
        })
        .collect();

    selected
        .par_iter()
        .map(build_record)
        .collect::<Result<Vec<_>>>()
}

/// Resolves `path` to an absolute, symlink-free form.
///
/// # Errors
/// Returns `NotFound` if the path does not exist.
pub fn canonical(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(RefguardError::NotFound {
            path: path.to_path_buf(),
        });
    }
    fs::canonicalize(path).map_err(|e| RefguardError::io(e, path))
}

fn build_record(found: &discovery::Discovered) -> Result<FileRecord> {
    let bytes = fs::read(&found.path).map_err(|e| RefguardError::io(e, &found.path))?;
    let source = String::from_utf8_lossy(&bytes);
    let (complexity, extraction) = parse(&found.path, &source, found.lang);

    Ok(FileRecord {
        path: found.path.clone(),
        relative_path: found.relative.clone(),
        language: found.lang,
        size_bytes: bytes.len() as u64,
        line_count: source.lines().count(),
        symbols: extraction.symbols,
        imports: extraction.imports,
        complexity,
        is_test_file: found.is_test,
        usages: extraction.usages,
    })
}

/// Parses one file. A grammar that fails to load degrades to an empty record
/// with base complexity rather than failing the run.
fn parse(path: &Path, source: &str, language: lang::Lang) -> (usize, extract::Extraction) {
    let mut parser = Parser::new();
    let Some(grammar) = lang::grammar_for(path) else {
        return (1, extract::Extraction::default());
    };
    if parser.set_language(grammar).is_err() {
        return (1, extract::Extraction::default());
    }
    let Some(tree) = parser.parse(source, None) else {
        return (1, extract::Extraction::default());
    };
    let root = tree.root_node();
    (
        complexity::calculate(root, language),
        extract::extract(root, source, language),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_target_fails_fast() {
        let err = index(Path::new("/definitely/not/here"), &IndexOptions::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn tests_are_skipped_unless_requested() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        fs::write(dir.path().join("a.test.ts"), "import { a } from './a';\n").unwrap();

        let without = index(dir.path(), &IndexOptions::new(false)).unwrap();
        assert_eq!(without.len(), 1);

        let with = index(dir.path(), &IndexOptions::new(true)).unwrap();
        assert_eq!(with.len(), 2);
        assert!(with.iter().any(|r| r.is_test_file));
    }

    #[test]
    fn single_file_target_keeps_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "import os\n").unwrap();
        fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();

        let records = index(&dir.path().join("b.py"), &IndexOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path, PathBuf::from("b.py"));
        assert_eq!(records[0].line_count, 1);
        assert_eq!(records[0].size_bytes, 6);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_fails_the_whole_index() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        let hidden = dir.path().join("hidden");
        fs::create_dir(&hidden).unwrap();
        fs::write(hidden.join("b.ts"), "export const b = 1;\n").unwrap();
        fs::set_permissions(&hidden, fs::Permissions::from_mode(0o000)).unwrap();

        let readable = fs::read_dir(&hidden).is_ok();
        let result = index(dir.path(), &IndexOptions::default());
        fs::set_permissions(&hidden, fs::Permissions::from_mode(0o755)).unwrap();
        if !readable {
            assert!(result.is_err(), "partial index returned");
        }
    }
}
