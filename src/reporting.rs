// src/reporting.rs
//! Terminal rendering for command results.

use colored::Colorize;
use std::fmt::Write;
use std::path::Path;

use crate::apply::{ExecutionResult, ValidationStatus};
use crate::graph::{Cycle, ProjectSummary, Severity, TraceReport, TracedFile, UnusedReport};
use crate::safety::SafetyScore;
use crate::types::{CommandResult, FileRecord};

fn rel<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    let label = severity.to_string().to_uppercase();
    match severity {
        Severity::High => label.red().bold(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.dimmed(),
    }
}

pub fn print_records(records: &[FileRecord]) {
    print!("{}", render_records(records));
}

#[must_use]
pub fn render_records(records: &[FileRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{} {} ({} lines, complexity {}{})",
            "•".cyan(),
            record.relative_path.display(),
            record.line_count,
            record.complexity,
            if record.is_test_file { ", test" } else { "" }
        );
        for symbol in &record.symbols {
            let marker = if symbol.is_exported { "export " } else { "" };
            let _ = writeln!(
                out,
                "    {marker}{:?} {} [{}-{}]",
                symbol.kind, symbol.name, symbol.start_line, symbol.end_line
            );
        }
        for import in &record.imports {
            let _ = writeln!(out, "    {} {}", "import".dimmed(), import.source_specifier);
        }
    }
    let _ = writeln!(out, "{} file(s) indexed", records.len());
    out
}

pub fn print_summary(summary: &ProjectSummary, root: &Path) {
    print!("{}", render_summary(summary, root));
}

#[must_use]
pub fn render_summary(summary: &ProjectSummary, root: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Dependency graph".bold());
    let _ = writeln!(out, "  Files:            {}", summary.file_count);
    let _ = writeln!(out, "  Edges:            {}", summary.edge_count);
    let _ = writeln!(out, "  Lines:            {}", summary.total_lines);
    let _ = writeln!(out, "  Exported symbols: {}", summary.total_exported_symbols);
    let _ = writeln!(
        out,
        "  Complexity:       avg {:.1}, max {}",
        summary.average_complexity, summary.max_complexity
    );
    for (lang, count) in &summary.files_by_language {
        let _ = writeln!(out, "  {lang:<17} {count}");
    }
    write_cycles(&mut out, &summary.cycles, root);
    out
}

fn write_cycles(out: &mut String, cycles: &[Cycle], root: &Path) {
    if cycles.is_empty() {
        let _ = writeln!(out, "{}", "No cycles.".green());
        return;
    }
    let _ = writeln!(out, "{}", format!("{} cycle(s):", cycles.len()).yellow());
    for cycle in cycles {
        let mut walk: Vec<String> = cycle.nodes.iter().map(|n| rel(n, root).to_string()).collect();
        if let Some(first) = walk.first().cloned() {
            walk.push(first);
        }
        let _ = writeln!(
            out,
            "  [{}] {} (weight {})",
            severity_label(cycle.severity),
            walk.join(" -> "),
            cycle.weight
        );
    }
}

pub fn print_trace(report: &TraceReport, root: &Path) {
    print!("{}", render_trace(report, root));
}

#[must_use]
pub fn render_trace(report: &TraceReport, root: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({}, depth {})",
        "Trace".bold(),
        rel(&report.target, root),
        report.direction,
        report.max_depth
    );
    if !report.in_graph {
        let _ = writeln!(out, "  {}", "File is outside the analyzed set.".dimmed());
    }
    write_traced(&mut out, "Depends on", &report.forward, root);
    write_traced(&mut out, "Used by", &report.backward, root);
    if !report.shared.is_empty() {
        let _ = writeln!(out, "  Both directions: {}", report.shared.len());
    }
    let _ = writeln!(out, "  Total Files Affected: {}", report.total_files_affected);
    write_cycles(&mut out, &report.cycles, root);
    if let Some(unused) = &report.unused {
        write_unused(&mut out, unused, root);
    }
    out
}

fn write_traced(out: &mut String, title: &str, files: &[TracedFile], root: &Path) {
    if files.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {title}:");
    for file in files {
        let indent = "  ".repeat(file.depth);
        let _ = writeln!(out, "  {indent}{} {}", rel(&file.path, root), format!("({})", file.depth).dimmed());
    }
}

fn write_unused(out: &mut String, unused: &UnusedReport, root: &Path) {
    if unused.is_empty() {
        let _ = writeln!(out, "{}", "No unused imports or exports.".green());
        return;
    }
    for import in &unused.imports {
        let _ = writeln!(
            out,
            "  {} {}:{} '{}' from {}",
            "unused import".yellow(),
            rel(&import.file, root),
            import.line,
            import.name,
            import.specifier
        );
    }
    for export in &unused.exports {
        let _ = writeln!(
            out,
            "  {} {}:{} '{}'",
            "unused export".yellow(),
            rel(&export.file, root),
            export.line,
            export.name
        );
    }
}

pub fn print_score(score: &SafetyScore) {
    print!("{}", render_score(score));
}

#[must_use]
pub fn render_score(score: &SafetyScore) -> String {
    let mut out = String::new();
    let value = format!("{:.0}/100", score.score);
    let value = if score.score >= 80.0 {
        value.green().bold()
    } else if score.score >= 50.0 {
        value.yellow().bold()
    } else {
        value.red().bold()
    };
    let _ = writeln!(out, "{} {value}", "Safety score:".bold());
    let _ = writeln!(
        out,
        "  Coverage:   {:.1}% ({})",
        score.coverage.percentage, score.coverage.source
    );
    let metrics = &score.complexity_metrics;
    let _ = writeln!(
        out,
        "  Complexity: avg {:.1}, max {}, {} file(s) above {}",
        metrics.average,
        metrics.max,
        metrics.over_threshold.len(),
        metrics.threshold
    );
    let _ = writeln!(
        out,
        "  Coupling:   max fan-in {}, max fan-out {}",
        score.coupling.max_fan_in, score.coupling.max_fan_out
    );
    for rec in &score.recommendations {
        let _ = writeln!(out, "  {} {rec}", "→".cyan());
    }
    out
}

pub fn print_execution(result: &ExecutionResult) {
    print!("{}", render_execution(result));
}

/// States outcome, attempt, landed count and rollback outcome on every path.
#[must_use]
pub fn render_execution(result: &ExecutionResult) -> String {
    let mut out = String::new();
    let headline = if result.success {
        "✓ Execution committed".green().bold()
    } else {
        "✗ Execution failed".red().bold()
    };
    let _ = writeln!(out, "{headline}: {}", result.description);
    let _ = writeln!(
        out,
        "  Changes applied: {}/{}",
        result.applied_change_count, result.requested_change_count
    );
    match &result.checkpoint_id {
        Some(id) => {
            let _ = writeln!(out, "  Checkpoint:      {id}");
        }
        None => {
            let _ = writeln!(out, "  Checkpoint:      none");
        }
    }
    let validation = match result.validation {
        ValidationStatus::Passed => "passed".green(),
        ValidationStatus::Failed => "failed".red(),
        ValidationStatus::Skipped => "skipped".dimmed(),
    };
    let _ = writeln!(out, "  Validation:      {validation}");
    for gate in &result.gates {
        let mark = if gate.passed { "✓".green() } else { "✗".red() };
        let _ = writeln!(out, "    {mark} {} ({}ms)", gate.gate, gate.duration_ms);
        for command in gate.commands.iter().filter(|c| !c.passed()) {
            write_failed_command(&mut out, command);
        }
    }

    if result.success {
        return out;
    }
    let rollback = if result.rolled_back {
        "rolled back".green()
    } else if result.rollback_error.is_some() {
        "rollback FAILED, working tree may hold partial changes".red().bold()
    } else {
        "not attempted, changes left in place".yellow()
    };
    let _ = writeln!(out, "  Rollback:        {rollback}");
    if let Some(err) = &result.rollback_error {
        let _ = writeln!(out, "    {err}");
    }
    if let Some(err) = &result.error {
        let _ = writeln!(out, "  Error:           {err}");
    }
    out
}

fn write_failed_command(out: &mut String, command: &CommandResult) {
    let status = if command.is_timeout() {
        "timed out".to_string()
    } else {
        format!("exit {}", command.exit_code())
    };
    let errors = command.error_count();
    let errors = if errors == 0 { String::new() } else { format!(", {errors} error line(s)") };
    let _ = writeln!(out, "      $ {} ({status}{errors})", command.command());
    let output = command.output();
    let tail: Vec<&str> = output.lines().rev().take(10).collect();
    for line in tail.into_iter().rev() {
        let _ = writeln!(out, "        {}", line.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{CheckpointId, ExecutionRequest, FileChange};
    use std::path::PathBuf;

    #[test]
    fn failed_execution_states_rollback_and_error() {
        colored::control::set_override(false);
        let request = ExecutionRequest::new("rename", vec![FileChange::update("a.ts", "x")]);
        let mut result = ExecutionResult::rejected(&request, "Validation failed: tests".into());
        result.checkpoint_id = Some(CheckpointId::new("abc123"));
        result.applied_change_count = 1;
        result.rolled_back = true;

        let text = render_execution(&result);
        assert!(text.contains("Execution failed: rename"));
        assert!(text.contains("Changes applied: 1/1"));
        assert!(text.contains("abc123"));
        assert!(text.contains("rolled back"));
        assert!(text.contains("Validation failed: tests"));
    }

    #[test]
    fn failed_gate_lists_command_status_and_error_count() {
        use crate::verification::{GateKind, GateReport};

        colored::control::set_override(false);
        let request = ExecutionRequest::new("retype", vec![FileChange::update("a.ts", "x")]);
        let mut result = ExecutionResult::rejected(&request, "Validation failed: type-check".into());
        let failing = CommandResult::new(
            "npx tsc --noEmit".into(),
            2,
            "error TS2304: Cannot find name 'x'.\nerror TS2552: typo".into(),
            String::new(),
            40,
        );
        let passing = CommandResult::new("npx eslint .".into(), 0, "clean".into(), String::new(), 10);
        result.gates = vec![
            GateReport::from_commands(GateKind::TypeCheck, vec![failing], 40),
            GateReport::from_commands(GateKind::Lint, vec![passing], 10),
        ];

        let text = render_execution(&result);
        assert!(text.contains("$ npx tsc --noEmit (exit 2, 2 error line(s))"), "{text}");
        assert!(text.contains("Cannot find name"));
        assert!(!text.contains("$ npx eslint"));
    }

    #[test]
    fn cycles_render_as_closed_walks() {
        colored::control::set_override(false);
        let root = PathBuf::from("/proj");
        let cycle = Cycle {
            nodes: vec![root.join("a.ts"), root.join("b.ts")],
            weight: 2,
            severity: Severity::Medium,
        };
        let mut out = String::new();
        write_cycles(&mut out, &[cycle], &root);
        assert!(out.contains("[MEDIUM] a.ts -> b.ts -> a.ts (weight 2)"), "{out}");
    }
}
