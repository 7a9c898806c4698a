//! Symbol, import and identifier extraction from a parsed syntax tree.

mod go;
mod python;
mod rust;
mod typescript;

use std::collections::BTreeSet;
use tree_sitter::Node;

use crate::lang::Lang;
use crate::types::{ImportDecl, Symbol, SymbolKind};

/// Everything the indexer pulls out of one tree besides complexity.
#[derive(Debug, Default)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportDecl>,
    pub usages: BTreeSet<String>,
}

#[must_use]
pub fn extract(root: Node, source: &str, lang: Lang) -> Extraction {
    let (symbols, imports) = match lang {
        Lang::TypeScript | Lang::JavaScript => {
            (typescript::symbols(root, source), typescript::imports(root, source))
        }
        Lang::Python => (python::symbols(root, source), python::imports(root, source)),
        Lang::Rust => (rust::symbols(root, source), rust::imports(root, source)),
        Lang::Go => (go::symbols(root, source), go::imports(root, source)),
    };
    Extraction {
        symbols,
        imports,
        usages: usages(root, source, lang),
    }
}

/// Identifiers referenced anywhere outside import statements.
fn usages(root: Node, source: &str, lang: Lang) -> BTreeSet<String> {
    let skip = lang.import_kinds();
    let idents: &[&str] = match lang {
        Lang::TypeScript | Lang::JavaScript => {
            &["identifier", "type_identifier", "shorthand_property_identifier"]
        }
        Lang::Python => &["identifier"],
        Lang::Rust => &["identifier", "type_identifier"],
        Lang::Go => &["identifier", "type_identifier", "package_identifier"],
    };

    let mut found = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let kind = node.kind();
        if skip.contains(&kind) || typescript::is_reexport(node) {
            continue;
        }
        if idents.contains(&kind) {
            let name = text(node, source);
            if !name.is_empty() {
                found.insert(name.to_string());
            }
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
    found
}

pub(crate) fn text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub(crate) fn field_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field)
        .map(|n| text(n, source))
        .filter(|t| !t.is_empty())
}

pub(crate) fn has_child_kind(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

pub(crate) fn strip_quotes(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

pub(crate) fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

pub(crate) fn end_line(node: Node) -> usize {
    node.end_position().row + 1
}

pub(crate) fn symbol(
    name: &str,
    kind: SymbolKind,
    node: Node,
    is_exported: bool,
    is_private: bool,
) -> Symbol {
    Symbol {
        name: name.to_string(),
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        is_exported,
        is_private,
    }
}

pub(crate) fn import(source: String, names: Vec<crate::types::ImportedName>, node: Node) -> ImportDecl {
    ImportDecl {
        source_specifier: source,
        names,
        is_type_only: false,
        is_reexport: false,
        start_line: start_line(node),
        end_line: end_line(node),
    }
}

#[cfg(test)]
pub(crate) fn parse_for_test(file: &str, source: &str) -> (tree_sitter::Tree, Lang) {
    let path = std::path::Path::new(file);
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(crate::lang::grammar_for(path).unwrap())
        .unwrap();
    (
        parser.parse(source, None).unwrap(),
        Lang::from_path(path).unwrap(),
    )
}
