use tree_sitter::Node;

use super::{field_text, import, symbol, text};
use crate::types::{ImportDecl, ImportedName, Symbol, SymbolKind};

/// Dunder names are public protocol, not private.
fn is_private(name: &str) -> bool {
    name.starts_with('_') && !(name.starts_with("__") && name.ends_with("__"))
}

pub fn symbols(root: Node, source: &str) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        top_level(unwrap_decorated(child), source, &mut out);
    }
    out
}

fn unwrap_decorated(node: Node) -> Node {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

fn top_level(node: Node, source: &str, out: &mut Vec<Symbol>) {
    match node.kind() {
        "function_definition" => push(node, source, SymbolKind::Function, true, out),
        "class_definition" => {
            push(node, source, SymbolKind::Class, true, out);
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for member in body.named_children(&mut cursor) {
                    let member = unwrap_decorated(member);
                    if member.kind() == "function_definition" {
                        push(member, source, SymbolKind::Method, false, out);
                    }
                }
            }
        }
        "expression_statement" => {
            let mut cursor = node.walk();
            for expr in node.named_children(&mut cursor) {
                if expr.kind() != "assignment" {
                    continue;
                }
                if let Some(left) = expr.child_by_field_name("left").filter(|l| l.kind() == "identifier") {
                    let name = text(left, source);
                    out.push(symbol(name, SymbolKind::Variable, node, !is_private(name), is_private(name)));
                }
            }
        }
        _ => {}
    }
}

fn push(node: Node, source: &str, kind: SymbolKind, module_level: bool, out: &mut Vec<Symbol>) {
    if let Some(name) = field_text(node, "name", source) {
        let private = is_private(name);
        out.push(symbol(name, kind, node, module_level && !private, private));
    }
}

pub fn imports(root: Node, source: &str) -> Vec<ImportDecl> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                out.extend(plain_import(node, source));
                continue;
            }
            "import_from_statement" => {
                if let Some(decl) = from_import(node, source) {
                    out.push(decl);
                }
                continue;
            }
            _ => {}
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// `import a.b, c as d` yields one declaration per module.
fn plain_import(node: Node, source: &str) -> Vec<ImportDecl> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (module, binding) = match name.kind() {
            "aliased_import" => {
                let module = field_text(name, "name", source).unwrap_or_default();
                let alias = field_text(name, "alias", source).unwrap_or(module);
                (module, alias.to_string())
            }
            _ => {
                let module = text(name, source);
                let first = module.split('.').next().unwrap_or(module);
                (module, first.to_string())
            }
        };
        if !module.is_empty() {
            out.push(import(module.to_string(), vec![ImportedName::aliased("*", binding)], node));
        }
    }
    out
}

fn from_import(node: Node, source: &str) -> Option<ImportDecl> {
    let module = field_text(node, "module_name", source)?.to_string();
    let mut names = Vec::new();

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "aliased_import" => {
                if let (Some(orig), Some(alias)) =
                    (field_text(name, "name", source), field_text(name, "alias", source))
                {
                    names.push(ImportedName::aliased(orig, alias));
                }
            }
            _ => names.push(ImportedName::plain(text(name, source))),
        }
    }

    let mut inner = node.walk();
    if node.named_children(&mut inner).any(|c| c.kind() == "wildcard_import") {
        names.push(ImportedName::plain("*"));
    }
    Some(import(module, names, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::extract::parse_for_test;

    const SAMPLE: &str = r#"
import os
import numpy as np
from typing import List, Dict
from .utils import helper as h

class DataProcessor:
    def __init__(self, config):
        self.config = config

    def _process_item(self, item):
        return item.upper()

def calculate(n):
    return n

async def fetch(data):
    return data

def _helper_function():
    pass

API_VERSION = "1.0.0"
"#;

    #[test]
    fn module_symbols_and_privacy() {
        let (tree, _) = parse_for_test("sample.py", SAMPLE);
        let syms = symbols(tree.root_node(), SAMPLE);
        let find = |n: &str| syms.iter().find(|s| s.name == n).unwrap();

        assert_eq!(find("DataProcessor").kind, SymbolKind::Class);
        assert_eq!(find("__init__").kind, SymbolKind::Method);
        assert!(!find("__init__").is_private);
        assert!(find("_process_item").is_private);
        assert!(find("calculate").is_exported);
        assert_eq!(find("fetch").kind, SymbolKind::Function);
        assert!(find("_helper_function").is_private);
        assert!(!find("_helper_function").is_exported);
        assert_eq!(find("API_VERSION").kind, SymbolKind::Variable);
    }

    #[test]
    fn plain_and_relative_imports() {
        let (tree, _) = parse_for_test("sample.py", SAMPLE);
        let imports = imports(tree.root_node(), SAMPLE);
        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].source_specifier, "os");
        assert_eq!(imports[1].names[0].local(), "np");
        assert_eq!(imports[2].imported_names().collect::<Vec<_>>(), vec!["List", "Dict"]);
        assert_eq!(imports[3].source_specifier, ".utils");
        assert_eq!(imports[3].names[0], ImportedName::aliased("helper", "h"));
    }
}
