// src/graph/cycles.rs
//! Cycle detection over the dependency graph.
//!
//! Depth-first search from every unvisited node with a recursion stack. A back
//! edge to a node on the stack records the stack slice from that node. This
//! finds the first cycle per back edge in DFS order; it is not a census of
//! every elementary cycle.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::DependencyGraph;
use crate::config::CycleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A closed walk: the last node imports the first. The first node is not repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub nodes: Vec<PathBuf>,
    /// Summed weight of the edges around the walk.
    pub weight: usize,
    pub severity: Severity,
}

impl Cycle {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn involves(&self, path: &Path) -> bool {
        self.nodes.iter().any(|n| n == path)
    }
}

/// Maps a cycle's length and weight to a severity.
#[must_use]
pub fn classify(len: usize, weight: usize, policy: &CycleConfig) -> Severity {
    if len <= 1 {
        return Severity::Low;
    }
    if len >= policy.high_length || weight >= policy.high_weight {
        return Severity::High;
    }
    if policy.low_weight_ceiling.is_some_and(|ceiling| weight <= ceiling) {
        return Severity::Low;
    }
    Severity::Medium
}

/// Detects cycles in `graph`. Each cycle appears once regardless of rotation.
#[must_use]
pub fn detect_cycles(graph: &DependencyGraph, policy: &CycleConfig) -> Vec<Cycle> {
    let count = graph.nodes().len();
    let mut state = DfsState {
        visited: vec![false; count],
        on_stack: vec![false; count],
        path_stack: Vec::new(),
        found: Vec::new(),
        seen: HashSet::new(),
    };

    for node in 0..count {
        if !state.visited[node] {
            dfs(node, graph, &mut state);
        }
    }

    state
        .found
        .into_iter()
        .map(|members| to_cycle(graph, &members, policy))
        .collect()
}

struct DfsState {
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    path_stack: Vec<usize>,
    found: Vec<Vec<usize>>,
    seen: HashSet<Vec<usize>>,
}

fn dfs(node: usize, graph: &DependencyGraph, state: &mut DfsState) {
    state.visited[node] = true;
    state.on_stack[node] = true;
    state.path_stack.push(node);

    let mut neighbours: Vec<usize> = graph.successors(node).collect();
    neighbours.sort_unstable();
    neighbours.dedup();
    for next in neighbours {
        visit_neighbour(next, graph, state);
    }

    state.on_stack[node] = false;
    state.path_stack.pop();
}

fn visit_neighbour(next: usize, graph: &DependencyGraph, state: &mut DfsState) {
    if !state.visited[next] {
        dfs(next, graph, state);
    } else if state.on_stack[next] {
        record_cycle(next, state);
    }
}

fn record_cycle(start: usize, state: &mut DfsState) {
    let Some(pos) = state.path_stack.iter().position(|&n| n == start) else {
        return;
    };
    let members = state.path_stack.get(pos..).unwrap_or_default().to_vec();
    if state.seen.insert(canonical_rotation(&members)) {
        state.found.push(members);
    }
}

/// The rotation starting at the smallest index, so `a,b,c` and `b,c,a` compare equal.
fn canonical_rotation(members: &[usize]) -> Vec<usize> {
    let start = members
        .iter()
        .enumerate()
        .min_by_key(|&(_, n)| *n)
        .map_or(0, |(i, _)| i);
    members[start..].iter().chain(&members[..start]).copied().collect()
}

fn to_cycle(graph: &DependencyGraph, members: &[usize], policy: &CycleConfig) -> Cycle {
    let nodes: Vec<PathBuf> = members
        .iter()
        .filter_map(|&i| graph.nodes().get(i).cloned())
        .collect();
    let weight = nodes
        .iter()
        .zip(nodes.iter().cycle().skip(1))
        .filter_map(|(from, to)| graph.edge(from, to))
        .map(|e| e.weight)
        .sum();
    Cycle {
        severity: classify(nodes.len(), weight, policy),
        nodes,
        weight,
    }
}
