use tree_sitter::Node;

use super::{field_text, has_child_kind, import, symbol, text};
use crate::types::{ImportDecl, ImportedName, Symbol, SymbolKind};

pub fn symbols(root: Node, source: &str) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for item in root.named_children(&mut cursor) {
        item_symbols(item, source, &mut out);
    }
    out
}

fn item_symbols(item: Node, source: &str, out: &mut Vec<Symbol>) {
    let kind = match item.kind() {
        "function_item" => SymbolKind::Function,
        "struct_item" | "enum_item" | "union_item" => SymbolKind::Class,
        "trait_item" | "type_item" => SymbolKind::Type,
        "const_item" | "static_item" => SymbolKind::Variable,
        "impl_item" => {
            members(item, source, out);
            return;
        }
        _ => return,
    };
    let Some(name) = field_text(item, "name", source) else {
        return;
    };
    let public = has_child_kind(item, "visibility_modifier");
    out.push(symbol(name, kind, item, public, !public));
    if item.kind() == "trait_item" {
        members(item, source, out);
    }
}

/// Methods declared in an `impl` or `trait` body.
fn members(container: Node, source: &str, out: &mut Vec<Symbol>) {
    let Some(body) = container.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if !matches!(member.kind(), "function_item" | "function_signature_item") {
            continue;
        }
        if let Some(name) = field_text(member, "name", source) {
            let public = has_child_kind(member, "visibility_modifier");
            out.push(symbol(name, SymbolKind::Method, member, public, !public));
        }
    }
}

pub fn imports(root: Node, source: &str) -> Vec<ImportDecl> {
    let mut out: Vec<ImportDecl> = Vec::new();
    let mut cursor = root.walk();
    for item in root.named_children(&mut cursor) {
        match item.kind() {
            "use_declaration" => {
                let Some(arg) = item.child_by_field_name("argument") else {
                    continue;
                };
                let mut flat = Vec::new();
                flatten_use(arg, "", source, &mut flat);
                group_into(&mut out, flat, item);
            }
            // `mod foo;` pulls in a sibling file; `mod foo { .. }` does not.
            "mod_item" if item.child_by_field_name("body").is_none() => {
                if let Some(name) = field_text(item, "name", source) {
                    out.push(import(format!("self::{name}"), Vec::new(), item));
                }
            }
            _ => {}
        }
    }
    out
}

fn join(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}::{path}"),
    }
}

/// Flattens a use tree into `(module path, imported name)` pairs.
fn flatten_use(node: Node, prefix: &str, source: &str, out: &mut Vec<(String, ImportedName)>) {
    match node.kind() {
        "scoped_identifier" => {
            let path = field_text(node, "path", source).unwrap_or_default();
            if let Some(name) = field_text(node, "name", source) {
                out.push((join(prefix, path), ImportedName::plain(name)));
            }
        }
        "use_as_clause" => {
            let Some(path_node) = node.child_by_field_name("path") else {
                return;
            };
            let alias = field_text(node, "alias", source).unwrap_or_default();
            let (module, name) = split_last(path_node, source);
            out.push((join(prefix, &module), ImportedName::aliased(name, alias)));
        }
        "scoped_use_list" => {
            let path = field_text(node, "path", source).unwrap_or_default();
            let nested = join(prefix, path);
            if let Some(list) = node.child_by_field_name("list") {
                flatten_use(list, &nested, source, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                flatten_use(child, prefix, source, out);
            }
        }
        "use_wildcard" => {
            let mut cursor = node.walk();
            let path = node
                .named_children(&mut cursor)
                .next()
                .map(|p| text(p, source).to_string())
                .unwrap_or_default();
            out.push((join(prefix, &path), ImportedName::plain("*")));
        }
        "self" => out.push((prefix.to_string(), ImportedName::plain("self"))),
        _ => {
            let name = text(node, source);
            if !name.is_empty() {
                out.push((prefix.to_string(), ImportedName::plain(name)));
            }
        }
    }
}

fn split_last(path: Node, source: &str) -> (String, String) {
    if path.kind() == "scoped_identifier" {
        let module = field_text(path, "path", source).unwrap_or_default().to_string();
        let name = field_text(path, "name", source).unwrap_or_default().to_string();
        (module, name)
    } else {
        (String::new(), text(path, source).to_string())
    }
}

/// One declaration per distinct module path, names in source order.
fn group_into(out: &mut Vec<ImportDecl>, flat: Vec<(String, ImportedName)>, node: Node) {
    let first_new = out.len();
    for (module, name) in flat {
        let existing = out[first_new..]
            .iter_mut()
            .find(|d| d.source_specifier == module);
        match existing {
            Some(decl) => decl.names.push(name),
            None => out.push(import(module, vec![name], node)),
        }
    }
}
