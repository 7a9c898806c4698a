//! Records produced by the indexer and shared by every analysis pass.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::lang::Lang;

mod command;
pub use command::CommandResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Type,
}

/// A declaration found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    pub is_exported: bool,
    pub is_private: bool,
}

/// One name brought in by an import, with its local binding if renamed.
///
/// `*` stands for a namespace / wildcard import, `default` for a default import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedName {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ImportedName {
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The identifier this import binds in the importing file.
    #[must_use]
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

/// A raw import statement. Unresolved until the graph builder matches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDecl {
    pub source_specifier: String,
    pub names: Vec<ImportedName>,
    pub is_type_only: bool,
    /// `export ... from` forwards names without binding them locally.
    pub is_reexport: bool,
    pub start_line: usize,
    pub end_line: usize,
}

impl ImportDecl {
    /// Original (exported) names, in declaration order.
    pub fn imported_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.name.as_str())
    }

    /// Side-effect-only imports weigh nothing.
    #[must_use]
    pub fn weight(&self) -> usize {
        self.names.len()
    }
}

/// Structural summary of one source file. Immutable once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub language: Lang,
    pub size_bytes: u64,
    pub line_count: usize,
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportDecl>,
    pub complexity: usize,
    pub is_test_file: bool,
    /// Identifiers referenced outside import statements.
    #[serde(skip)]
    pub usages: BTreeSet<String>,
}

impl FileRecord {
    pub fn exported_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.is_exported)
    }

    #[must_use]
    pub fn uses_identifier(&self, ident: &str) -> bool {
        self.usages.contains(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_prefers_alias() {
        assert_eq!(ImportedName::plain("foo").local(), "foo");
        assert_eq!(ImportedName::aliased("foo", "bar").local(), "bar");
        assert!(ImportedName::aliased("*", "utils").is_wildcard());
    }

    #[test]
    fn side_effect_import_has_zero_weight() {
        let decl = ImportDecl {
            source_specifier: "./polyfill".into(),
            names: vec![],
            is_type_only: false,
            is_reexport: false,
            start_line: 1,
            end_line: 1,
        };
        assert_eq!(decl.weight(), 0);
    }
}
