//! Refactor-risk scoring: coverage, complexity and coupling folded into 0..=100.

pub mod coverage;

use serde::Serialize;
use std::path::PathBuf;

use crate::config::RuleConfig;
use crate::graph::DependencyGraph;
use crate::types::FileRecord;

pub use coverage::{CoverageSource, CoverageSummary};

/// Coverage shortfall costs this many points per missing percent.
const COVERAGE_WEIGHT: f64 = 0.3;
/// Points per unit of average complexity above the threshold.
const AVERAGE_WEIGHT: f64 = 2.0;
/// Points per file above the threshold.
const FILE_PENALTY: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    pub threshold: usize,
    pub average: f64,
    pub max: usize,
    /// Relative paths of files above `threshold`, most complex first.
    pub over_threshold: Vec<PathBuf>,
}

impl ComplexityMetrics {
    #[must_use]
    pub fn from_records(records: &[FileRecord], threshold: usize) -> Self {
        let average = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.complexity).sum::<usize>() as f64 / records.len() as f64
        };
        let mut over: Vec<&FileRecord> = records.iter().filter(|r| r.complexity > threshold).collect();
        over.sort_by(|a, b| b.complexity.cmp(&a.complexity));
        Self {
            threshold,
            average,
            max: records.iter().map(|r| r.complexity).max().unwrap_or(0),
            over_threshold: over.into_iter().map(|r| r.relative_path.clone()).collect(),
        }
    }
}

/// Fan-in / fan-out extremes. Informational; hubs never move the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingStats {
    pub max_fan_in: usize,
    pub max_fan_out: usize,
    /// `(relative path, fan-in)` for files at or above the hub threshold.
    pub hubs: Vec<(PathBuf, usize)>,
}

impl CouplingStats {
    #[must_use]
    pub fn from_graph(graph: &DependencyGraph, records: &[FileRecord], hub_threshold: usize) -> Self {
        let mut stats = Self::default();
        for record in records {
            let fan_in = graph.fan_in(&record.path);
            stats.max_fan_in = stats.max_fan_in.max(fan_in);
            stats.max_fan_out = stats.max_fan_out.max(graph.fan_out(&record.path));
            if hub_threshold > 0 && fan_in >= hub_threshold {
                stats.hubs.push((record.relative_path.clone(), fan_in));
            }
        }
        stats.hubs.sort_by(|a, b| b.1.cmp(&a.1));
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyScore {
    /// Always within 0..=100.
    pub score: f64,
    pub coverage: CoverageSummary,
    pub complexity_metrics: ComplexityMetrics,
    pub coupling: CouplingStats,
    pub recommendations: Vec<String>,
}

/// Scores a change set. Pure: the same inputs always give the same score.
#[must_use]
pub fn score(
    coverage: CoverageSummary,
    complexity: ComplexityMetrics,
    coupling: CouplingStats,
    rules: &RuleConfig,
) -> SafetyScore {
    let threshold = rules.complexity_threshold as f64;
    let mut value = 100.0;
    value -= (100.0 - coverage.percentage.clamp(0.0, 100.0)) * COVERAGE_WEIGHT;
    if complexity.average > threshold {
        value -= (complexity.average - threshold) * AVERAGE_WEIGHT;
    }
    value -= complexity.over_threshold.len() as f64 * FILE_PENALTY;
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };

    let recommendations = recommend(value, &coverage, &complexity, &coupling, rules);
    SafetyScore {
        score: value,
        coverage,
        complexity_metrics: complexity,
        coupling,
        recommendations,
    }
}

/// Shown when a list of files is cut short.
const LISTED_FILES: usize = 5;

fn recommend(
    value: f64,
    coverage: &CoverageSummary,
    complexity: &ComplexityMetrics,
    coupling: &CouplingStats,
    rules: &RuleConfig,
) -> Vec<String> {
    let mut out = Vec::new();

    if value < rules.caution_score {
        out.push(format!(
            "Safety score {value:.0} is below {:.0}: raise test coverage or reduce complexity before refactoring.",
            rules.caution_score
        ));
    }
    if !complexity.over_threshold.is_empty() {
        let names: Vec<String> = complexity
            .over_threshold
            .iter()
            .take(LISTED_FILES)
            .map(|p| p.display().to_string())
            .collect();
        let more = complexity.over_threshold.len().saturating_sub(LISTED_FILES);
        let tail = if more > 0 { format!(" (+{more} more)") } else { String::new() };
        out.push(format!(
            "Prioritize {} file(s) above complexity {}: {}{tail}.",
            complexity.over_threshold.len(),
            complexity.threshold,
            names.join(", ")
        ));
    }
    if coverage.percentage < rules.low_coverage {
        out.push(format!(
            "Coverage is {:.1}%: add tests for the affected files first.",
            coverage.percentage
        ));
    }
    if out.is_empty() {
        out.push("Safe to proceed.".to_string());
    }
    for (hub, fan_in) in coupling.hubs.iter().take(LISTED_FILES) {
        out.push(format!(
            "{} is imported by {fan_in} files: change its interface last.",
            hub.display()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::record;

    fn metrics(average: f64, over: usize) -> ComplexityMetrics {
        ComplexityMetrics {
            threshold: 10,
            average,
            max: 0,
            over_threshold: (0..over).map(|i| PathBuf::from(format!("f{i}.ts"))).collect(),
        }
    }

    fn run(cov: f64, average: f64, over: usize) -> SafetyScore {
        score(
            CoverageSummary::provided(cov),
            metrics(average, over),
            CouplingStats::default(),
            &RuleConfig::default(),
        )
    }

    #[test]
    fn perfect_project_scores_100() {
        let s = run(100.0, 3.0, 0);
        assert!((s.score - 100.0).abs() < f64::EPSILON);
        assert_eq!(s.recommendations, vec!["Safe to proceed."]);
    }

    #[test]
    fn penalties_add_up() {
        // 100 - 50*0.3 - (12-10)*2 - 2*2 = 77
        let s = run(50.0, 12.0, 2);
        assert!((s.score - 77.0).abs() < 1e-9);
        assert_eq!(s.recommendations.len(), 1);
        assert!(s.recommendations[0].starts_with("Prioritize 2 file(s)"));
    }

    #[test]
    fn score_is_clamped_for_extreme_inputs() {
        for (cov, avg, over) in [(0.0, 1000.0, 500), (-20.0, 0.0, 0), (250.0, 0.0, 0), (0.0, f64::MAX, 0)] {
            let s = run(cov, avg, over);
            assert!((0.0..=100.0).contains(&s.score), "{cov} {avg} {over} -> {}", s.score);
        }
        let worst = run(0.0, 1000.0, 500);
        assert!(worst.score.abs() < f64::EPSILON);
        assert_eq!(worst.recommendations.len(), 3);
    }

    #[test]
    fn hubs_recommend_without_scoring() {
        let coupling = CouplingStats {
            max_fan_in: 7,
            max_fan_out: 1,
            hubs: vec![(PathBuf::from("src/core.ts"), 7)],
        };
        let s = score(CoverageSummary::provided(100.0), metrics(1.0, 0), coupling, &RuleConfig::default());
        assert!((s.score - 100.0).abs() < f64::EPSILON);
        assert_eq!(s.recommendations.len(), 2);
        assert!(s.recommendations[1].contains("src/core.ts"));
    }

    #[test]
    fn metrics_from_records() {
        let mut a = record("a.ts", &[]);
        a.complexity = 15;
        let mut b = record("b.ts", &[]);
        b.complexity = 25;
        let c = record("c.ts", &[]);
        let m = ComplexityMetrics::from_records(&[a, b, c], 10);
        assert_eq!(m.max, 25);
        assert_eq!(m.over_threshold, vec![PathBuf::from("b.ts"), PathBuf::from("a.ts")]);
        assert!((m.average - 41.0 / 3.0).abs() < 1e-9);
    }
}
