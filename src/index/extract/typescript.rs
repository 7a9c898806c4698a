use std::collections::HashSet;
use tree_sitter::Node;

use super::{field_text, has_child_kind, import, strip_quotes, symbol, text};
use crate::types::{ImportDecl, ImportedName, Symbol, SymbolKind};

pub fn symbols(root: Node, source: &str) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut local_exports = HashSet::new();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        declaration(child, source, false, &mut out, &mut local_exports);
    }

    // `export { a, b }` without a source exports earlier declarations.
    for sym in &mut out {
        if sym.kind != SymbolKind::Method && local_exports.contains(&sym.name) {
            sym.is_exported = true;
        }
    }
    out
}

fn declaration(
    node: Node,
    source: &str,
    exported: bool,
    out: &mut Vec<Symbol>,
    local_exports: &mut HashSet<String>,
) {
    match node.kind() {
        "export_statement" => export_statement(node, source, out, local_exports),
        "function_declaration" | "generator_function_declaration" => {
            push_named(node, source, SymbolKind::Function, exported, out);
        }
        "class_declaration" | "abstract_class_declaration" => {
            push_named(node, source, SymbolKind::Class, exported, out);
            if let Some(body) = node.child_by_field_name("body") {
                class_members(body, source, out);
            }
        }
        "interface_declaration" | "type_alias_declaration" | "enum_declaration" => {
            push_named(node, source, SymbolKind::Type, exported, out);
        }
        "lexical_declaration" | "variable_declaration" => {
            variables(node, source, exported, out);
        }
        "ambient_declaration" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                declaration(child, source, exported, out, local_exports);
            }
        }
        _ => {}
    }
}

fn export_statement(
    node: Node,
    source: &str,
    out: &mut Vec<Symbol>,
    local_exports: &mut HashSet<String>,
) {
    if node.child_by_field_name("source").is_some() {
        return;
    }
    if let Some(decl) = node.child_by_field_name("declaration") {
        declaration(decl, source, true, out, local_exports);
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "export_clause" {
            for (name, _) in specifiers(child, source) {
                local_exports.insert(name);
            }
        }
    }
}

fn push_named(node: Node, source: &str, kind: SymbolKind, exported: bool, out: &mut Vec<Symbol>) {
    if let Some(name) = field_text(node, "name", source) {
        out.push(symbol(name, kind, node, exported, name.starts_with('_')));
    }
}

fn class_members(body: Node, source: &str, out: &mut Vec<Symbol>) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "method_definition" {
            continue;
        }
        let Some(name_node) = member.child_by_field_name("name") else {
            continue;
        };
        let name = text(name_node, source);
        let is_private = name_node.kind() == "private_property_identifier"
            || name.starts_with('_')
            || has_private_modifier(member, source);
        out.push(symbol(name, SymbolKind::Method, member, false, is_private));
    }
}

fn has_private_modifier(member: Node, source: &str) -> bool {
    let mut cursor = member.walk();
    let found = member
        .children(&mut cursor)
        .any(|c| c.kind() == "accessibility_modifier" && text(c, source) == "private");
    found
}

fn variables(node: Node, source: &str, exported: bool, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        // Destructuring patterns declare no single named symbol.
        if name_node.kind() != "identifier" {
            continue;
        }
        let name = text(name_node, source);
        let kind = match declarator.child_by_field_name("value").map(|v| v.kind()) {
            Some("arrow_function" | "function" | "function_expression") => SymbolKind::Function,
            _ => SymbolKind::Variable,
        };
        out.push(symbol(name, kind, declarator, exported, name.starts_with('_')));
    }
}

pub fn imports(root: Node, source: &str) -> Vec<ImportDecl> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                if let Some(decl) = import_statement(node, source) {
                    out.push(decl);
                }
                continue;
            }
            "export_statement" if is_reexport(node) => {
                if let Some(decl) = reexport(node, source) {
                    out.push(decl);
                }
                continue;
            }
            "call_expression" => {
                if let Some(decl) = require_call(node, source) {
                    out.push(decl);
                }
            }
            _ => {}
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        // Reverse so the stack pops in source order.
        stack.extend(children.into_iter().rev());
    }
    out
}

/// `export ... from "..."` re-exports behave like imports.
pub(super) fn is_reexport(node: Node) -> bool {
    node.kind() == "export_statement" && node.child_by_field_name("source").is_some()
}

fn import_statement(node: Node, source: &str) -> Option<ImportDecl> {
    let mut names = Vec::new();
    let mut spec = field_text(node, "source", source).map(strip_quotes);

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_clause" => names.extend(import_clause(child, source)),
            "import_require_clause" => {
                let mut inner = child.walk();
                for part in child.named_children(&mut inner) {
                    match part.kind() {
                        "identifier" => names.push(ImportedName::aliased("*", text(part, source))),
                        "string" => spec = Some(strip_quotes(text(part, source))),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let mut decl = import(spec?, names, node);
    decl.is_type_only = has_child_kind(node, "type");
    Some(decl)
}

fn import_clause(clause: Node, source: &str) -> Vec<ImportedName> {
    let mut names = Vec::new();
    let mut cursor = clause.walk();
    for part in clause.named_children(&mut cursor) {
        match part.kind() {
            "identifier" => names.push(ImportedName::aliased("default", text(part, source))),
            "namespace_import" => {
                let mut inner = part.walk();
                let local = part
                    .named_children(&mut inner)
                    .find(|n| n.kind() == "identifier")
                    .map(|n| text(n, source).to_string());
                if let Some(local) = local {
                    names.push(ImportedName::aliased("*", local));
                }
            }
            "named_imports" => {
                for (name, alias) in specifiers(part, source) {
                    names.push(match alias {
                        Some(alias) => ImportedName::aliased(name, alias),
                        None => ImportedName::plain(name),
                    });
                }
            }
            _ => {}
        }
    }
    names
}

/// `(name, alias)` pairs of `import_specifier` / `export_specifier` children.
fn specifiers(list: Node, source: &str) -> Vec<(String, Option<String>)> {
    let mut out = Vec::new();
    let mut cursor = list.walk();
    for spec in list.named_children(&mut cursor) {
        if !matches!(spec.kind(), "import_specifier" | "export_specifier") {
            continue;
        }
        if let Some(name) = field_text(spec, "name", source) {
            let alias = field_text(spec, "alias", source).map(strip_quotes);
            out.push((strip_quotes(name), alias));
        }
    }
    out
}

fn reexport(node: Node, source: &str) -> Option<ImportDecl> {
    let spec = field_text(node, "source", source).map(strip_quotes)?;
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "export_clause" => {
                names.extend(specifiers(child, source).into_iter().map(|(n, _)| ImportedName::plain(n)));
            }
            "namespace_export" => names.push(ImportedName::plain("*")),
            _ => {}
        }
    }
    if names.is_empty() && text(node, source).contains('*') {
        names.push(ImportedName::plain("*"));
    }
    let mut decl = import(spec, names, node);
    decl.is_type_only = has_child_kind(node, "type");
    decl.is_reexport = true;
    Some(decl)
}

fn require_call(node: Node, source: &str) -> Option<ImportDecl> {
    let func = node.child_by_field_name("function")?;
    if func.kind() != "identifier" || text(func, source) != "require" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let spec = args
        .named_children(&mut cursor)
        .find(|a| a.kind() == "string")
        .map(|a| strip_quotes(text(a, source)))?;

    let mut names = Vec::new();
    if let Some(parent) = node.parent().filter(|p| p.kind() == "variable_declarator") {
        if let Some(binding) = parent.child_by_field_name("name") {
            match binding.kind() {
                "identifier" => names.push(ImportedName::aliased("*", text(binding, source))),
                "object_pattern" => {
                    let mut inner = binding.walk();
                    for prop in binding.named_children(&mut inner) {
                        if prop.kind() == "shorthand_property_identifier_pattern" {
                            names.push(ImportedName::plain(text(prop, source)));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Some(import(spec, names, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::extract::parse_for_test;

    #[test]
    fn collects_named_default_and_namespace_imports() {
        let src = r#"
import React from "react";
import { useState, useEffect as effect } from "react";
import * as utils from './utils';
import './polyfill';
"#;
        let (tree, _) = parse_for_test("app.tsx", src);
        let imports = imports(tree.root_node(), src);
        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].names, vec![ImportedName::aliased("default", "React")]);
        assert_eq!(imports[1].names[1], ImportedName::aliased("useEffect", "effect"));
        assert_eq!(imports[2].source_specifier, "./utils");
        assert_eq!(imports[2].names[0].local(), "utils");
        assert_eq!(imports[3].weight(), 0);
    }

    #[test]
    fn type_only_and_reexports() {
        let src = r#"
import type { Props } from './types';
export { helper } from './helpers';
export * from './all';
"#;
        let (tree, _) = parse_for_test("index.ts", src);
        let imports = imports(tree.root_node(), src);
        assert!(imports[0].is_type_only);
        assert!(!imports[0].is_reexport);
        assert!(imports[1].is_reexport);
        assert_eq!(imports[1].imported_names().collect::<Vec<_>>(), vec!["helper"]);
        assert_eq!(imports[2].imported_names().collect::<Vec<_>>(), vec!["*"]);
    }

    #[test]
    fn require_calls_are_imports() {
        let src = "const fs = require('fs');\nconst { join } = require('./path');\n";
        let (tree, _) = parse_for_test("a.js", src);
        let imports = imports(tree.root_node(), src);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].names[0].local(), "fs");
        assert_eq!(imports[1].names, vec![ImportedName::plain("join")]);
    }

    #[test]
    fn symbols_with_export_and_privacy_flags() {
        let src = r"
export function run() {}
function _internal() {}
export class Service {
  private secret() {}
  #hidden() {}
  open() {}
}
export const handler = () => 1;
const LIMIT = 3;
export interface Shape {}
export { LIMIT };
";
        let (tree, _) = parse_for_test("svc.ts", src);
        let syms = symbols(tree.root_node(), src);
        let find = |n: &str| syms.iter().find(|s| s.name == n).unwrap();

        assert!(find("run").is_exported);
        assert!(find("_internal").is_private && !find("_internal").is_exported);
        assert_eq!(find("Service").kind, SymbolKind::Class);
        assert!(find("secret").is_private);
        assert!(find("#hidden").is_private);
        assert_eq!(find("open").kind, SymbolKind::Method);
        assert!(!find("open").is_private);
        assert_eq!(find("handler").kind, SymbolKind::Function);
        assert!(find("LIMIT").is_exported, "exported through export clause");
        assert_eq!(find("Shape").kind, SymbolKind::Type);
    }
}
