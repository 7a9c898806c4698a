// src/cli/handlers.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::ProjectAnalysis;
use crate::apply::{self, ExecutionRequest};
use crate::config::Config;
use crate::exit::RefguardExit;
use crate::graph::{Direction, TraceRequest};
use crate::index::{self, IndexOptions};
use crate::project;
use crate::reporting;
use crate::safety::CoverageSummary;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The directory holding `target`, or `target` itself.
fn base_dir(target: &Path) -> Result<PathBuf> {
    let canonical = index::canonical(target)?;
    Ok(if canonical.is_file() {
        canonical.parent().map_or_else(|| canonical.clone(), Path::to_path_buf)
    } else {
        canonical
    })
}

fn load_config(root: &Path) -> Result<Config> {
    Ok(Config::load(root)?)
}

/// Handles the index command.
///
/// # Errors
/// Returns error if the path is missing or indexing fails.
pub fn handle_index(path: &Path, include_tests: bool, json: bool) -> Result<RefguardExit> {
    let config = load_config(&base_dir(path)?)?;
    let options = IndexOptions::new(include_tests).with_config(&config.index);
    let records = index::index(path, &options)?;
    if json {
        print_json(&records)?;
    } else {
        reporting::print_records(&records);
    }
    Ok(RefguardExit::Success)
}

/// Handles the graph command.
///
/// # Errors
/// Returns error if the root is missing or indexing fails.
pub fn handle_graph(root: &Path, include_tests: bool, json: bool) -> Result<RefguardExit> {
    let config = load_config(&base_dir(root)?)?;
    let analysis = ProjectAnalysis::run(root, include_tests, &config)?;
    let summary = analysis.summary();
    if json {
        #[derive(Serialize)]
        struct GraphOutput<'a> {
            summary: &'a crate::graph::ProjectSummary,
            graph: &'a crate::graph::DependencyGraph,
        }
        print_json(&GraphOutput {
            summary: &summary,
            graph: analysis.graph(),
        })?;
    } else {
        reporting::print_summary(&summary, analysis.root());
    }
    Ok(RefguardExit::Success)
}

/// Handles the trace command.
///
/// # Errors
/// Returns error if the file or root is missing, or analysis fails.
pub fn handle_trace(
    file: &Path,
    direction: Direction,
    depth: usize,
    include_unused: bool,
    root: Option<&Path>,
    json: bool,
) -> Result<RefguardExit> {
    let target = index::canonical(file)?;
    let root = match root {
        Some(r) => index::canonical(r)?,
        None => detect_root(&target)?,
    };
    let config = load_config(&root)?;
    let analysis = ProjectAnalysis::run(&root, true, &config)?;
    let request = TraceRequest::new(target, direction, depth).with_unused(include_unused);
    let report = analysis.trace(&request)?;
    if json {
        print_json(&report)?;
    } else {
        reporting::print_trace(&report, analysis.root());
    }
    Ok(RefguardExit::Success)
}

fn detect_root(target: &Path) -> Result<PathBuf> {
    let start = base_dir(target)?;
    Ok(project::find_root(&start).unwrap_or(start))
}

/// Handles the score command.
///
/// # Errors
/// Returns error if the root is missing or indexing fails.
pub fn handle_score(root: &Path, coverage: Option<f64>, json: bool) -> Result<RefguardExit> {
    let config = load_config(&base_dir(root)?)?;
    let analysis = ProjectAnalysis::run(root, false, &config)?;
    let score = match coverage {
        Some(pct) => analysis.score_with(CoverageSummary::provided(pct), &config),
        None => analysis.score(&config),
    };
    if json {
        print_json(&score)?;
    } else {
        reporting::print_score(&score);
    }
    Ok(RefguardExit::Success)
}

/// Handles the execute command.
///
/// # Errors
/// Returns error if the request file cannot be read, the root is missing,
/// or another execution holds the lock.
pub fn handle_execute(request_path: &Path, root: &Path, json: bool) -> Result<RefguardExit> {
    let raw = fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read request {}", request_path.display()))?;
    let request = ExecutionRequest::from_json(&raw)?;
    let root = index::canonical(root)?;
    let config = load_config(&root)?;

    let result = apply::execute_in(&root, &request, &config)?;
    if json {
        print_json(&result)?;
    } else {
        reporting::print_execution(&result);
    }
    Ok(RefguardExit::from_success(result.success))
}
