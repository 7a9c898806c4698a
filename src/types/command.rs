//! Captured outcome of one external gate command.

use serde::Serialize;

/// Result of an external command execution.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// The command that was executed (display form).
    command: String,
    /// Whether the command succeeded (exit code 0, no timeout).
    passed: bool,
    /// Process exit code (-1 if unavailable: spawn failure, signal, timeout).
    exit_code: i32,
    stdout: String,
    stderr: String,
    /// The command was killed after exceeding its time budget.
    timed_out: bool,
    duration_ms: u64,
}

impl CommandResult {
    #[must_use]
    pub fn new(
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            command,
            passed: exit_code == 0,
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            duration_ms,
        }
    }

    /// A command killed on timeout. Always a failure.
    #[must_use]
    pub fn timed_out(command: String, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            command,
            passed: false,
            exit_code: -1,
            stdout,
            stderr,
            timed_out: true,
            duration_ms,
        }
    }

    /// A command that could not be started at all.
    #[must_use]
    pub fn failed_to_start(command: String, reason: String) -> Self {
        Self::new(command, -1, String::new(), reason, 0)
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    /// Combined stdout and stderr output.
    #[must_use]
    pub fn output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Count error lines in output.
    #[must_use]
    pub fn error_count(&self) -> usize {
        count_matching_lines(&self.output(), |lower| {
            lower.contains("error:") || lower.contains("error[") || lower.starts_with("error")
        })
    }
}

/// Counts lines in `text` where `predicate` matches the lowercased line.
fn count_matching_lines(text: &str, predicate: impl Fn(&str) -> bool) -> usize {
    text.lines()
        .filter(|line| predicate(&line.to_lowercase()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_follows_exit_code() {
        let ok = CommandResult::new("npm test".into(), 0, "ok\n".into(), String::new(), 5);
        assert!(ok.passed());
        let bad = CommandResult::new("npm test".into(), 1, String::new(), String::new(), 5);
        assert!(!bad.passed());
        assert_eq!(bad.exit_code(), 1);
    }

    #[test]
    fn timeout_is_failure_even_with_clean_output() {
        let r = CommandResult::timed_out("sleep 100".into(), String::new(), String::new(), 1000);
        assert!(!r.passed());
        assert!(r.is_timeout());
        assert_eq!(r.exit_code(), -1);
    }

    #[test]
    fn failed_to_start_keeps_reason_in_stderr() {
        let r = CommandResult::failed_to_start("nope".into(), "Failed to execute: missing".into());
        assert!(!r.passed());
        assert!(r.stderr().contains("missing"));
    }

    #[test]
    fn output_combines_stdout_and_stderr() {
        let r = CommandResult::new("cmd".into(), 0, "out".into(), "err".into(), 0);
        let combined = r.output();
        assert!(combined.starts_with("out"));
        assert!(combined.ends_with("err"));
    }

    #[test]
    fn error_count_scans_combined_output() {
        let r = CommandResult::new(
            "tsc".into(),
            2,
            "error TS2304: Cannot find name\nsrc/a.ts ok".into(),
            "error: another".into(),
            0,
        );
        assert_eq!(r.error_count(), 2);
    }
}
