//! One analysis run over a project, and the caller-owned context holding the last run.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::graph::{
    self, summary, unused, Cycle, DependencyGraph, ProjectSummary, Resolver, TraceReport,
    TraceRequest, UnusedReport,
};
use crate::index::{self, IndexOptions};
use crate::safety::{self, ComplexityMetrics, CouplingStats, CoverageSummary, SafetyScore};
use crate::types::FileRecord;

/// Records, graph and cycles from one indexing pass. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProjectAnalysis {
    root: PathBuf,
    records: Vec<FileRecord>,
    resolver: Resolver,
    graph: DependencyGraph,
    cycles: Vec<Cycle>,
}

impl ProjectAnalysis {
    /// Indexes `target` and builds its graph.
    ///
    /// # Errors
    /// Propagates indexing failures; no partial analysis is returned.
    pub fn run(target: &Path, include_tests: bool, config: &Config) -> Result<Self> {
        let options = IndexOptions::new(include_tests).with_config(&config.index);
        let records = index::index(target, &options)?;
        let root = index::canonical(target)?;
        let root = if root.is_file() {
            root.parent().map_or_else(|| root.clone(), Path::to_path_buf)
        } else {
            root
        };
        Ok(Self::from_records(root, records, config))
    }

    /// Builds the graph over records that were indexed elsewhere.
    #[must_use]
    pub fn from_records(root: PathBuf, records: Vec<FileRecord>, config: &Config) -> Self {
        let resolver = Resolver::new(&records, config.index.extensions.as_deref());
        let graph = graph::build(&records, &resolver);
        let cycles = graph::detect_cycles(&graph, &config.cycles);
        Self {
            root,
            records,
            resolver,
            graph,
            cycles,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    #[must_use]
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    #[must_use]
    pub fn record(&self, path: &Path) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    #[must_use]
    pub fn summary(&self) -> ProjectSummary {
        summary::summarize(&self.records, &self.graph, &self.cycles)
    }

    #[must_use]
    pub fn unused(&self) -> UnusedReport {
        unused::detect(&self.records, &self.resolver)
    }

    /// Bounded trace from one file, with unused findings for the traced files when asked.
    ///
    /// # Errors
    /// `NotFound` for a missing target, `Resolution` for a zero depth.
    pub fn trace(&self, request: &TraceRequest) -> Result<TraceReport> {
        let mut report = graph::trace::trace(&self.graph, &self.cycles, request)?;
        if request.include_unused {
            let scope: Vec<PathBuf> = report.files().cloned().collect();
            report.unused = Some(self.unused().restricted_to(&scope));
        }
        Ok(report)
    }

    /// Safety score from the coverage found under the root.
    #[must_use]
    pub fn score(&self, config: &Config) -> SafetyScore {
        let coverage = safety::coverage::load(&self.root, &self.records, &config.index.exclude_dirs);
        self.score_with(coverage, config)
    }

    #[must_use]
    pub fn score_with(&self, coverage: CoverageSummary, config: &Config) -> SafetyScore {
        let rules = &config.rules;
        safety::score(
            coverage,
            ComplexityMetrics::from_records(&self.records, rules.complexity_threshold),
            CouplingStats::from_graph(&self.graph, &self.records, rules.hub_threshold),
            rules,
        )
    }
}

/// Holds the most recent analysis for a caller. Nothing is shared between contexts.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    config: Config,
    last: Option<ProjectAnalysis>,
}

impl AnalysisContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, last: None }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs a fresh analysis and keeps it as the latest. A failed run leaves
    /// the previous analysis in place.
    ///
    /// # Errors
    /// Propagates indexing failures.
    pub fn analyze(&mut self, target: &Path, include_tests: bool) -> Result<&ProjectAnalysis> {
        let analysis = ProjectAnalysis::run(target, include_tests, &self.config)?;
        Ok(self.last.insert(analysis))
    }

    #[must_use]
    pub fn last(&self) -> Option<&ProjectAnalysis> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
