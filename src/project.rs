// src/project.rs
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;
use crate::verification::GateKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectType {
    Rust,
    Node,
    Python,
    Go,
    Unknown,
}

impl ProjectType {
    /// Detects project type in a specific directory.
    #[must_use]
    pub fn detect_in(root: &Path) -> Self {
        if root.join("Cargo.toml").exists() {
            return Self::Rust;
        }
        if root.join("package.json").exists() {
            return Self::Node;
        }
        if root.join("pyproject.toml").exists()
            || root.join("requirements.txt").exists()
            || root.join("Pipfile").exists()
            || root.join("setup.py").exists()
        {
            return Self::Python;
        }
        if root.join("go.mod").exists() {
            return Self::Go;
        }
        Self::Unknown
    }

    /// Detects if a Node project is written in TypeScript.
    #[must_use]
    pub fn is_typescript(root: &Path) -> bool {
        root.join("tsconfig.json").exists() || root.join("tsconfig.node.json").exists()
    }

    /// Built-in command lines for `gate`, used when `[commands]` leaves it unset.
    #[must_use]
    pub fn default_commands(self, gate: GateKind, root: &Path) -> Vec<String> {
        let npx = npx_cmd();
        let cmd: Option<String> = match (self, gate) {
            (Self::Rust, GateKind::Tests) => Some("cargo test".into()),
            (Self::Rust, GateKind::Lint) => Some("cargo clippy --all-targets".into()),
            (Self::Rust, GateKind::TypeCheck) => Some("cargo check --all-targets".into()),
            (Self::Node, GateKind::Tests) => Some(format!("{} test", npm_cmd())),
            (Self::Node, GateKind::Lint) => Some(format!("{npx} eslint .")),
            (Self::Node, GateKind::TypeCheck) if Self::is_typescript(root) => {
                Some(format!("{npx} tsc --noEmit"))
            }
            (Self::Python, GateKind::Tests) => Some("pytest".into()),
            (Self::Python, GateKind::Lint) => Some("ruff check .".into()),
            (Self::Python, GateKind::TypeCheck) => Some("mypy .".into()),
            (Self::Go, GateKind::Tests) => Some("go test ./...".into()),
            (Self::Go, GateKind::Lint) => Some("go vet ./...".into()),
            (Self::Go, GateKind::TypeCheck) => Some("go build ./...".into()),
            _ => None,
        };
        cmd.into_iter().collect()
    }
}

/// Walks up from `start` to the nearest directory that looks like a project root.
#[must_use]
pub fn find_root(start: &Path) -> Option<PathBuf> {
    const MARKERS: &[&str] = &[
        CONFIG_FILE,
        ".git",
        "Cargo.toml",
        "package.json",
        "pyproject.toml",
        "go.mod",
    ];
    let start = if start.is_file() { start.parent()? } else { start };
    start
        .ancestors()
        .find(|dir| MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

#[must_use]
pub fn npx_cmd() -> &'static str {
    if cfg!(windows) {
        "npx.cmd"
    } else {
        "npx"
    }
}

#[must_use]
pub fn npm_cmd() -> &'static str {
    if cfg!(windows) {
        "npm.cmd"
    } else {
        "npm"
    }
}
