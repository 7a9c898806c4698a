//! The file-level dependency graph and the passes that read it.

pub mod builder;
pub mod cycles;
pub mod resolver;
pub mod summary;
pub mod trace;
pub mod unused;

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use builder::build;
pub use cycles::{detect_cycles, Cycle, Severity};
pub use resolver::{Resolved, Resolver};
pub use summary::ProjectSummary;
pub use trace::{Direction, TraceReport, TraceRequest, TracedFile};
pub use unused::{UnusedExport, UnusedImport, UnusedReport};

/// A resolved import relation: `from` imports `symbols` from `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Distinct names imported across every statement linking the pair.
    pub symbols: Vec<String>,
    /// Total imported-name count across those statements.
    pub weight: usize,
}

/// Files as nodes, resolved imports as edges.
///
/// Edges only ever connect two members of `nodes`; [`DependencyGraph::new`]
/// drops anything else.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    nodes: Vec<PathBuf>,
    edges: Vec<Edge>,
    #[serde(skip)]
    position: HashMap<PathBuf, usize>,
    #[serde(skip)]
    outgoing: Vec<Vec<usize>>,
    #[serde(skip)]
    incoming: Vec<Vec<usize>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new(nodes: Vec<PathBuf>, edges: Vec<Edge>) -> Self {
        let position: HashMap<PathBuf, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();

        let edges: Vec<Edge> = edges
            .into_iter()
            .filter(|e| position.contains_key(&e.from) && position.contains_key(&e.to))
            .collect();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for (i, edge) in edges.iter().enumerate() {
            if let (Some(&f), Some(&t)) = (position.get(&edge.from), position.get(&edge.to)) {
                outgoing[f].push(i);
                incoming[t].push(i);
            }
        }

        Self {
            nodes,
            edges,
            position,
            outgoing,
            incoming,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[PathBuf] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.position.contains_key(path)
    }

    pub(crate) fn index_of(&self, path: &Path) -> Option<usize> {
        self.position.get(path).copied()
    }

    /// Edges leaving `path` (what it imports).
    pub fn outgoing(&self, path: &Path) -> impl Iterator<Item = &Edge> {
        self.edge_list(path, &self.outgoing)
    }

    /// Edges arriving at `path` (who imports it).
    pub fn incoming(&self, path: &Path) -> impl Iterator<Item = &Edge> {
        self.edge_list(path, &self.incoming)
    }

    fn edge_list<'a>(&'a self, path: &Path, table: &'a [Vec<usize>]) -> impl Iterator<Item = &'a Edge> {
        self.index_of(path)
            .and_then(|i| table.get(i))
            .into_iter()
            .flatten()
            .filter_map(move |&e| self.edges.get(e))
    }

    /// Files that depend on `path`.
    #[must_use]
    pub fn dependents(&self, path: &Path) -> Vec<&Path> {
        self.incoming(path).map(|e| e.from.as_path()).collect()
    }

    #[must_use]
    pub fn fan_in(&self, path: &Path) -> usize {
        self.incoming(path).count()
    }

    #[must_use]
    pub fn fan_out(&self, path: &Path) -> usize {
        self.outgoing(path).count()
    }

    #[must_use]
    pub fn edge(&self, from: &Path, to: &Path) -> Option<&Edge> {
        self.outgoing(from).find(|e| e.to == to)
    }

    /// Neighbour node indices in edge order, for traversals.
    pub(crate) fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbours(node, &self.outgoing, |e| &e.to)
    }

    pub(crate) fn predecessors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbours(node, &self.incoming, |e| &e.from)
    }

    fn neighbours<'a>(
        &'a self,
        node: usize,
        table: &'a [Vec<usize>],
        end: fn(&Edge) -> &PathBuf,
    ) -> impl Iterator<Item = usize> + 'a {
        table
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(move |&e| self.edges.get(e))
            .filter_map(move |e| self.position.get(end(e)).copied())
    }
}
