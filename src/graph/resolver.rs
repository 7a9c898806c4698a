// src/graph/resolver.rs
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::lang::Lang;
use crate::types::{FileRecord, ImportDecl};

/// Suffixes tried, in order, against a relative specifier.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    ".mjs",
    ".cjs",
    ".py",
    ".rs",
    ".go",
    "/index.ts",
    "/index.tsx",
    "/index.js",
    "/index.jsx",
    "/__init__.py",
    "/mod.rs",
];

/// An import matched to an indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    /// The imported name binds the module itself (`from . import utils`,
    /// `use super::{cycles}`), so its members are reached through that name.
    pub module_binding: bool,
}

impl Resolved {
    fn file(path: PathBuf) -> Self {
        Self { path, module_binding: false }
    }

    fn module(path: PathBuf) -> Self {
        Self { path, module_binding: true }
    }
}

/// Matches import specifiers against the analyzed file set.
///
/// Only relative specifiers resolve. Nothing here touches the disk: a
/// candidate matches only if it is one of the indexed paths.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    known: HashSet<PathBuf>,
    extensions: Vec<String>,
}

impl Resolver {
    #[must_use]
    pub fn new(records: &[FileRecord], extensions: Option<&[String]>) -> Self {
        let extensions = match extensions {
            Some(list) => list.to_vec(),
            None => DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        };
        Self {
            known: records.iter().map(|r| r.path.clone()).collect(),
            extensions,
        }
    }

    /// The indexed file `decl` refers to, if any.
    #[must_use]
    pub fn resolve(&self, importer: &FileRecord, decl: &ImportDecl) -> Option<PathBuf> {
        self.resolve_binding(importer, decl).map(|r| r.path)
    }

    /// Like [`Resolver::resolve`], but also says whether the import binds the module itself.
    #[must_use]
    pub fn resolve_binding(&self, importer: &FileRecord, decl: &ImportDecl) -> Option<Resolved> {
        let spec = decl.source_specifier.as_str();
        match importer.language {
            Lang::Rust => self.resolve_rust(&importer.path, decl),
            Lang::Python => {
                let relative = python_relative(spec)?;
                // `from . import utils` names a sibling module before the package itself.
                let package_only = relative.trim_end_matches('/').chars().all(|c| c == '.' || c == '/');
                let submodule = package_only
                    .then(|| decl.imported_names().find(|n| *n != "*"))
                    .flatten()
                    .and_then(|first| self.resolve_relative(&importer.path, &format!("{relative}/{first}")));
                match submodule {
                    Some(path) => Some(Resolved::module(path)),
                    None => self.resolve_relative(&importer.path, &relative).map(Resolved::file),
                }
            }
            Lang::TypeScript | Lang::JavaScript | Lang::Go => self
                .resolve_relative(&importer.path, spec)
                .map(Resolved::file),
        }
    }

    fn resolve_relative(&self, importer: &Path, spec: &str) -> Option<PathBuf> {
        if !spec.starts_with('.') {
            return None;
        }
        let base = normalize(&importer.parent()?.join(spec));
        self.first_match(&base)
    }

    fn first_match(&self, base: &Path) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| with_suffix(base, ext))
            .find(|candidate| self.known.contains(candidate))
    }

    fn resolve_rust(&self, importer: &Path, decl: &ImportDecl) -> Option<Resolved> {
        let spec = decl.source_specifier.as_str();
        let mut parts = spec.split("::").peekable();
        let mut dir = match parts.peek().copied()? {
            "crate" => {
                parts.next();
                self.crate_root(importer)?
            }
            "self" => {
                parts.next();
                module_dir(importer)?
            }
            "super" => {
                let mut dir = module_dir(importer)?;
                while parts.peek() == Some(&"super") {
                    parts.next();
                    dir = dir.parent()?.to_path_buf();
                }
                dir
            }
            _ => return None,
        };
        for part in parts {
            dir.push(part);
        }

        // A named item may itself be a submodule: `use crate::graph::{cycles, Edge}`.
        let by_name = decl
            .imported_names()
            .filter(|n| !matches!(*n, "*" | "self"))
            .find_map(|name| self.first_match(&dir.join(name)));

        by_name
            .map(Resolved::module)
            .or_else(|| self.first_match(&dir).map(Resolved::file))
            .filter(|target| target.path != importer)
    }

    /// Directory holding `lib.rs` or `main.rs` nearest above `file`.
    fn crate_root(&self, file: &Path) -> Option<PathBuf> {
        file.ancestors().skip(1).find_map(|dir| {
            ["lib.rs", "main.rs"]
                .iter()
                .any(|root| self.known.contains(&dir.join(root)))
                .then(|| dir.to_path_buf())
        })
    }
}

/// Directory that a Rust file's child modules live in.
fn module_dir(file: &Path) -> Option<PathBuf> {
    let dir = file.parent()?;
    let stem = file.file_stem()?.to_str()?;
    if matches!(stem, "lib" | "main" | "mod") {
        Some(dir.to_path_buf())
    } else {
        Some(dir.join(stem))
    }
}

/// `.utils` -> `./utils`, `..pkg.mod` -> `../pkg/mod`. Absolute imports yield `None`.
fn python_relative(spec: &str) -> Option<String> {
    let dots = spec.chars().take_while(|&c| c == '.').count();
    if dots == 0 {
        return None;
    }
    let prefix = if dots == 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };
    let rest = spec[dots..].replace('.', "/");
    Some(format!("{prefix}{rest}"))
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    if suffix.is_empty() {
        return base.to_path_buf();
    }
    let mut raw = OsString::from(base.as_os_str());
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Lexically folds `.` and `..` without touching the disk.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
