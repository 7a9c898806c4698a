// src/graph/builder.rs
//! Graph construction: resolve every import and fold them into weighted edges.

use std::collections::HashMap;
use std::path::PathBuf;

use super::{DependencyGraph, Edge, Resolver};
use crate::types::FileRecord;

/// Builds the graph over `records`, nodes in record order.
///
/// Several statements importing the same file collapse into one edge whose
/// weight is the sum of their imported-name counts.
#[must_use]
pub fn build(records: &[FileRecord], resolver: &Resolver) -> DependencyGraph {
    let nodes = records.iter().map(|r| r.path.clone()).collect();
    DependencyGraph::new(nodes, build_edges(records, resolver))
}

fn build_edges(records: &[FileRecord], resolver: &Resolver) -> Vec<Edge> {
    let mut edges: Vec<Edge> = Vec::new();
    let mut slot: HashMap<(usize, PathBuf), usize> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        for decl in &record.imports {
            let Some(target) = resolver.resolve(record, decl) else {
                continue;
            };
            let at = *slot.entry((i, target.clone())).or_insert_with(|| {
                edges.push(Edge {
                    from: record.path.clone(),
                    to: target,
                    symbols: Vec::new(),
                    weight: 0,
                });
                edges.len() - 1
            });
            if let Some(edge) = edges.get_mut(at) {
                merge(edge, decl.imported_names());
                edge.weight += decl.weight();
            }
        }
    }
    edges
}

fn merge<'a>(edge: &mut Edge, names: impl Iterator<Item = &'a str>) {
    for name in names {
        if !edge.symbols.iter().any(|s| s == name) {
            edge.symbols.push(name.to_string());
        }
    }
}
