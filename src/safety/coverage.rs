// src/safety/coverage.rs
//! Test-coverage figures from existing reports, or an estimate from test-file names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::index::discovery;
use crate::types::FileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageSource {
    /// `coverage/coverage-summary.json` (Istanbul / nyc / jest).
    Istanbul,
    /// `coverage.json` from coverage.py.
    CoveragePy,
    /// Share of source files with a matching test file.
    Estimated,
    /// Supplied by the caller.
    Provided,
}

impl fmt::Display for CoverageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Istanbul => "istanbul",
            Self::CoveragePy => "coverage.py",
            Self::Estimated => "estimated from test files",
            Self::Provided => "provided",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    /// 0..=100.
    pub percentage: f64,
    pub source: CoverageSource,
}

impl CoverageSummary {
    #[must_use]
    pub fn provided(percentage: f64) -> Self {
        Self {
            percentage: percentage.clamp(0.0, 100.0),
            source: CoverageSource::Provided,
        }
    }
}

#[derive(Deserialize)]
struct IstanbulSummary {
    total: IstanbulTotal,
}

#[derive(Deserialize)]
struct IstanbulTotal {
    lines: IstanbulMetric,
}

#[derive(Deserialize)]
struct IstanbulMetric {
    pct: f64,
}

#[derive(Deserialize)]
struct CoveragePyReport {
    totals: CoveragePyTotals,
}

#[derive(Deserialize)]
struct CoveragePyTotals {
    percent_covered: f64,
}

/// Best available coverage figure for the project at `root`.
#[must_use]
pub fn load(root: &Path, records: &[FileRecord], exclude_dirs: &[String]) -> CoverageSummary {
    if let Some(pct) = read_istanbul(root) {
        return summary(pct, CoverageSource::Istanbul);
    }
    if let Some(pct) = read_coverage_py(root) {
        return summary(pct, CoverageSource::CoveragePy);
    }
    estimate(root, records, exclude_dirs)
}

fn summary(pct: f64, source: CoverageSource) -> CoverageSummary {
    CoverageSummary {
        percentage: pct.clamp(0.0, 100.0),
        source,
    }
}

fn read_istanbul(root: &Path) -> Option<f64> {
    let content = std::fs::read_to_string(root.join("coverage/coverage-summary.json")).ok()?;
    let raw: IstanbulSummary = serde_json::from_str(&content).ok()?;
    Some(raw.total.lines.pct)
}

fn read_coverage_py(root: &Path) -> Option<f64> {
    let content = std::fs::read_to_string(root.join("coverage.json")).ok()?;
    let raw: CoveragePyReport = serde_json::from_str(&content).ok()?;
    Some(raw.totals.percent_covered)
}

/// Percentage of non-test records whose stem has a test file somewhere under `root`.
///
/// Test files are found with a fresh walk, so the estimate holds even when
/// `records` were indexed without tests. No source files counts as fully covered.
/// A failed walk leaves the estimate without test files.
#[must_use]
pub fn estimate(root: &Path, records: &[FileRecord], exclude_dirs: &[String]) -> CoverageSummary {
    let found = discovery::walk(root, exclude_dirs).unwrap_or_default();
    let tested: HashSet<String> = found
        .iter()
        .filter(|f| f.is_test)
        .filter_map(|f| f.relative.file_name().and_then(|n| n.to_str()).map(tested_stem))
        .collect();

    let sources: Vec<&FileRecord> = records.iter().filter(|r| !r.is_test_file).collect();
    if sources.is_empty() {
        return summary(100.0, CoverageSource::Estimated);
    }
    let covered = sources
        .iter()
        .filter(|r| {
            r.path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| tested.contains(stem))
        })
        .count();
    summary(
        covered as f64 * 100.0 / sources.len() as f64,
        CoverageSource::Estimated,
    )
}

/// `a.test.ts` -> `a`, `test_models.py` -> `models`, `server_test.go` -> `server`.
fn tested_stem(file_name: &str) -> String {
    let base = file_name.split('.').next().unwrap_or(file_name);
    let base = base.strip_prefix("test_").unwrap_or(base);
    let base = base.strip_suffix("_test").unwrap_or(base);
    base.to_string()
}
