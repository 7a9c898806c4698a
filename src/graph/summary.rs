// src/graph/summary.rs
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Cycle, DependencyGraph};
use crate::types::FileRecord;

/// Project-wide aggregate over one analysis run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub file_count: usize,
    pub edge_count: usize,
    pub average_complexity: f64,
    pub max_complexity: usize,
    pub total_lines: usize,
    pub total_exported_symbols: usize,
    pub files_by_language: BTreeMap<String, usize>,
    pub cycles: Vec<Cycle>,
}

#[must_use]
pub fn summarize(records: &[FileRecord], graph: &DependencyGraph, cycles: &[Cycle]) -> ProjectSummary {
    let total_complexity: usize = records.iter().map(|r| r.complexity).sum();
    let average_complexity = if records.is_empty() {
        0.0
    } else {
        total_complexity as f64 / records.len() as f64
    };

    let mut files_by_language = BTreeMap::new();
    for record in records {
        *files_by_language.entry(record.language.to_string()).or_insert(0) += 1;
    }

    ProjectSummary {
        file_count: graph.nodes().len(),
        edge_count: graph.edges().len(),
        average_complexity,
        max_complexity: records.iter().map(|r| r.complexity).max().unwrap_or(0),
        total_lines: records.iter().map(|r| r.line_count).sum(),
        total_exported_symbols: records.iter().map(|r| r.exported_symbols().count()).sum(),
        files_by_language,
        cycles: cycles.to_vec(),
    }
}
