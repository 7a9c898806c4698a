use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tree_sitter::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Go,
}

impl Lang {
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "py" => Some(Self::Python),
            "rs" => Some(Self::Rust),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_ext)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
        }
    }

    /// Node kinds that add one branch to a file's complexity.
    #[must_use]
    pub fn branch_kinds(self) -> &'static [&'static str] {
        match self {
            Self::TypeScript | Self::JavaScript => &[
                "if_statement",
                "else_clause",
                "while_statement",
                "do_statement",
                "for_statement",
                "for_in_statement",
                "switch_statement",
                "switch_case",
                "switch_default",
                "try_statement",
                "catch_clause",
                "finally_clause",
                "ternary_expression",
            ],
            Self::Python => &[
                "if_statement",
                "elif_clause",
                "else_clause",
                "while_statement",
                "for_statement",
                "match_statement",
                "case_clause",
                "try_statement",
                "except_clause",
                "finally_clause",
                "conditional_expression",
            ],
            Self::Rust => &[
                "if_expression",
                "else_clause",
                "while_expression",
                "loop_expression",
                "for_expression",
                "match_expression",
                "match_arm",
            ],
            Self::Go => &[
                "if_statement",
                "for_statement",
                "expression_switch_statement",
                "type_switch_statement",
                "select_statement",
                "expression_case",
                "type_case",
                "default_case",
                "communication_case",
            ],
        }
    }

    /// Node kind whose `alternative` field is an `else` branch. Grammars
    /// that give `else` its own node return `None`.
    #[must_use]
    pub fn else_field_kind(self) -> Option<&'static str> {
        match self {
            Self::Go => Some("if_statement"),
            Self::TypeScript | Self::JavaScript | Self::Python | Self::Rust => None,
        }
    }

    /// Node kinds that declare a function or method.
    #[must_use]
    pub fn function_kinds(self) -> &'static [&'static str] {
        match self {
            Self::TypeScript | Self::JavaScript => &[
                "function_declaration",
                "generator_function_declaration",
                "function",
                "function_expression",
                "generator_function",
                "arrow_function",
                "method_definition",
            ],
            Self::Python => &["function_definition", "lambda"],
            Self::Rust => &["function_item", "closure_expression"],
            Self::Go => &["function_declaration", "method_declaration", "func_literal"],
        }
    }

    /// Node kinds of whole import statements; identifiers inside them are not usages.
    #[must_use]
    pub fn import_kinds(self) -> &'static [&'static str] {
        match self {
            Self::TypeScript | Self::JavaScript => &["import_statement"],
            Self::Python => &["import_statement", "import_from_statement", "future_import_statement"],
            Self::Rust => &["use_declaration"],
            Self::Go => &["import_declaration"],
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the grammar for a file. TSX/JSX dialects need the TSX grammar, plain
/// `.ts` needs the TypeScript one (angle-bracket casts are not JSX).
#[must_use]
pub fn grammar_for(path: &Path) -> Option<Language> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    let grammar = match ext {
        "ts" | "mts" | "cts" => tree_sitter_typescript::language_typescript(),
        "tsx" | "js" | "jsx" | "mjs" | "cjs" => tree_sitter_typescript::language_tsx(),
        "py" => tree_sitter_python::language(),
        "rs" => tree_sitter_rust::language(),
        "go" => tree_sitter_go::language(),
        _ => return None,
    };
    Some(grammar)
}
