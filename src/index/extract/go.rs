use tree_sitter::Node;

use super::{field_text, import, strip_quotes, symbol, text};
use crate::types::{ImportDecl, ImportedName, Symbol, SymbolKind};

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

pub fn symbols(root: Node, source: &str) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        match decl.kind() {
            "function_declaration" => push(decl, source, SymbolKind::Function, &mut out),
            "method_declaration" => push(decl, source, SymbolKind::Method, &mut out),
            "type_declaration" => specs(decl, "type_spec", source, &mut out),
            "const_declaration" => specs(decl, "const_spec", source, &mut out),
            "var_declaration" => specs(decl, "var_spec", source, &mut out),
            _ => {}
        }
    }
    out
}

fn push(node: Node, source: &str, kind: SymbolKind, out: &mut Vec<Symbol>) {
    if let Some(name) = field_text(node, "name", source) {
        let exported = is_exported(name);
        out.push(symbol(name, kind, node, exported, !exported));
    }
}

fn specs(decl: Node, spec_kind: &str, source: &str, out: &mut Vec<Symbol>) {
    let mut stack = vec![decl];
    while let Some(node) = stack.pop() {
        if node.kind() != spec_kind {
            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
            continue;
        }
        let kind = match node.child_by_field_name("type").map(|t| t.kind()) {
            _ if spec_kind != "type_spec" => SymbolKind::Variable,
            Some("struct_type") => SymbolKind::Class,
            _ => SymbolKind::Type,
        };
        let mut cursor = node.walk();
        for name_node in node.children_by_field_name("name", &mut cursor) {
            let name = text(name_node, source);
            let exported = is_exported(name);
            out.push(symbol(name, kind, node, exported, !exported));
        }
    }
    out.sort_by_key(|s| s.start_line);
}

pub fn imports(root: Node, source: &str) -> Vec<ImportDecl> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "import_spec" {
            if let Some(decl) = import_spec(node, source) {
                out.push(decl);
            }
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

fn import_spec(node: Node, source: &str) -> Option<ImportDecl> {
    let path = field_text(node, "path", source).map(strip_quotes)?;
    let binding = field_text(node, "name", source)
        .map(str::to_string)
        .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(&path).to_string());
    Some(import(path, vec![ImportedName::aliased("*", binding)], node))
}
