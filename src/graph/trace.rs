// src/graph/trace.rs
//! Bounded-depth reachability from one file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{Cycle, DependencyGraph, UnusedReport};
use crate::error::{RefguardError, Result};
use crate::index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// What the target imports, transitively.
    Forward,
    /// What imports the target, transitively.
    Backward,
    #[default]
    Both,
}

impl FromStr for Direction {
    type Err = RefguardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            "both" => Ok(Self::Both),
            other => Err(RefguardError::Resolution(format!(
                "unknown direction '{other}' (expected forward, backward or both)"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Both => "both",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRequest {
    pub target_file: PathBuf,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub include_unused: bool,
}

fn default_depth() -> usize {
    3
}

impl TraceRequest {
    #[must_use]
    pub fn new(target_file: impl Into<PathBuf>, direction: Direction, max_depth: usize) -> Self {
        Self {
            target_file: target_file.into(),
            direction,
            max_depth,
            include_unused: false,
        }
    }

    #[must_use]
    pub fn with_unused(mut self, include: bool) -> Self {
        self.include_unused = include;
        self
    }
}

/// A file reached by the traversal, at its shortest hop count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracedFile {
    pub path: PathBuf,
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceReport {
    pub target: PathBuf,
    pub direction: Direction,
    pub max_depth: usize,
    /// False when the target exists but is outside the analyzed set.
    pub in_graph: bool,
    pub forward: Vec<TracedFile>,
    pub backward: Vec<TracedFile>,
    /// Files reached in both directions.
    pub shared: Vec<PathBuf>,
    /// Distinct files reached, excluding the target.
    pub total_files_affected: usize,
    /// Cycles touching the target or any reached file.
    pub cycles: Vec<Cycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unused: Option<UnusedReport>,
}

impl TraceReport {
    /// Every file in scope of the trace, target first.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.target)
            .chain(self.forward.iter().map(|f| &f.path))
            .chain(self.backward.iter().map(|f| &f.path))
    }
}

/// Traces `request.target_file` through `graph`.
///
/// # Errors
/// `NotFound` if the target does not exist on disk, `Resolution` if
/// `max_depth` is zero. Both are raised before any traversal.
pub fn trace(graph: &DependencyGraph, cycles: &[Cycle], request: &TraceRequest) -> Result<TraceReport> {
    let target = index::canonical(&request.target_file)?;
    if request.max_depth == 0 {
        return Err(RefguardError::Resolution("maxDepth must be at least 1".into()));
    }

    let start = graph.index_of(&target);
    let walk = |dir: Direction| -> Vec<TracedFile> {
        let wanted = request.direction == dir || request.direction == Direction::Both;
        match start {
            Some(node) if wanted => bfs(graph, node, request.max_depth, dir),
            _ => Vec::new(),
        }
    };
    let forward = walk(Direction::Forward);
    let backward = walk(Direction::Backward);

    let ahead: BTreeSet<&PathBuf> = forward.iter().map(|f| &f.path).collect();
    let behind: BTreeSet<&PathBuf> = backward.iter().map(|f| &f.path).collect();
    let shared: Vec<PathBuf> = ahead.intersection(&behind).map(|p| (*p).clone()).collect();
    let total_files_affected = ahead.union(&behind).count();

    let in_scope = |c: &&Cycle| {
        c.involves(&target) || c.nodes.iter().any(|n| ahead.contains(n) || behind.contains(n))
    };
    let cycles = if start.is_some() {
        cycles.iter().filter(in_scope).cloned().collect()
    } else {
        Vec::new()
    };

    Ok(TraceReport {
        in_graph: start.is_some(),
        target,
        direction: request.direction,
        max_depth: request.max_depth,
        forward,
        backward,
        shared,
        total_files_affected,
        cycles,
        unused: None,
    })
}

/// Breadth-first, so each file is reported at its shortest depth.
fn bfs(graph: &DependencyGraph, start: usize, max_depth: usize, dir: Direction) -> Vec<TracedFile> {
    let mut seen = vec![false; graph.nodes().len()];
    seen[start] = true;
    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut out = Vec::new();

    while let Some((node, depth)) = queue.pop_front() {
        if depth == max_depth {
            continue;
        }
        let next: Vec<usize> = match dir {
            Direction::Backward => graph.predecessors(node).collect(),
            _ => graph.successors(node).collect(),
        };
        for n in next {
            if seen[n] {
                continue;
            }
            seen[n] = true;
            if let Some(path) = graph.nodes().get(n) {
                out.push(TracedFile {
                    path: path.clone(),
                    depth: depth + 1,
                });
            }
            queue.push_back((n, depth + 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use std::fs;

    /// A chain a -> b -> c -> d on disk, so targets canonicalize.
    fn chain() -> (tempfile::TempDir, DependencyGraph, Vec<PathBuf>) {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let files: Vec<PathBuf> = ["a.ts", "b.ts", "c.ts", "d.ts", "lone.ts"]
            .iter()
            .map(|f| {
                let p = root.join(f);
                fs::write(&p, "").unwrap();
                p
            })
            .collect();
        let edges = files
            .windows(2)
            .take(3)
            .map(|w| Edge {
                from: w[0].clone(),
                to: w[1].clone(),
                symbols: vec!["x".into()],
                weight: 1,
            })
            .collect();
        (dir, DependencyGraph::new(files.clone(), edges), files)
    }

    #[test]
    fn depth_bounds_forward_reach() {
        let (_dir, graph, files) = chain();
        let one = trace(&graph, &[], &TraceRequest::new(&files[0], Direction::Forward, 1)).unwrap();
        assert_eq!(one.forward, vec![TracedFile { path: files[1].clone(), depth: 1 }]);
        assert!(one.backward.is_empty());

        let mut previous = 0;
        for depth in 1..=4 {
            let report = trace(&graph, &[], &TraceRequest::new(&files[0], Direction::Forward, depth)).unwrap();
            assert!(report.forward.iter().all(|f| f.depth <= depth));
            assert!(report.total_files_affected >= previous);
            previous = report.total_files_affected;
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn both_directions_union_and_count() {
        let (_dir, graph, files) = chain();
        let report = trace(&graph, &[], &TraceRequest::new(&files[1], Direction::Both, 5)).unwrap();
        assert_eq!(report.backward.len(), 1);
        assert_eq!(report.forward.len(), 2);
        assert_eq!(report.total_files_affected, 3);
        assert!(report.shared.is_empty());
    }

    #[test]
    fn isolated_file_affects_nothing() {
        let (_dir, graph, files) = chain();
        let report = trace(&graph, &[], &TraceRequest::new(&files[4], Direction::Both, 2)).unwrap();
        assert!(report.in_graph);
        assert_eq!(report.total_files_affected, 0);
        assert!(report.cycles.is_empty());
    }

    #[test]
    fn missing_target_and_zero_depth_fail_early() {
        let (_dir, graph, files) = chain();
        let missing = files[0].with_file_name("nope.ts");
        let err = trace(&graph, &[], &TraceRequest::new(missing, Direction::Both, 2)).unwrap_err();
        assert!(err.is_not_found());

        let err = trace(&graph, &[], &TraceRequest::new(&files[0], Direction::Both, 0)).unwrap_err();
        assert!(matches!(err, RefguardError::Resolution(_)));
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("Forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
