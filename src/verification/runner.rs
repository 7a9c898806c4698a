//! Command execution with output capture and a per-command time limit.

use crate::types::CommandResult;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs every command in order and returns their results plus total wall time.
///
/// A failing command does not stop the rest; the gate fails if any did.
#[must_use]
pub fn run_commands(repo_root: &Path, commands: &[String], timeout: Duration) -> (Vec<CommandResult>, u64) {
    let start = Instant::now();
    let results = commands
        .iter()
        .map(|cmd| run_single_command(repo_root, cmd, timeout))
        .collect();
    (results, elapsed_ms(start))
}

/// Runs a single command string and captures stdout/stderr separately.
///
/// Uses POSIX shell-style quoting rules via `shell_words::split` so that
/// commands like `cargo clippy -- -D "some flag"` are parsed correctly.
fn run_single_command(repo_root: &Path, cmd_str: &str, timeout: Duration) -> CommandResult {
    let start = Instant::now();

    let parts = match shell_words::split(cmd_str) {
        Ok(p) => p,
        Err(e) => {
            return CommandResult::failed_to_start(
                cmd_str.to_string(),
                format!("Failed to parse command: {e}"),
            );
        }
    };

    let Some((program, args)) = parts.split_first() else {
        return CommandResult::failed_to_start(cmd_str.to_string(), "Empty command".to_string());
    };

    let mut child = match Command::new(program)
        .args(args)
        .current_dir(repo_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return CommandResult::failed_to_start(cmd_str.to_string(), format!("Failed to execute: {e}"));
        }
    };

    let deadline = start + timeout;
    let stdout_acc = Arc::new(Mutex::new(String::new()));
    let stderr_acc = Arc::new(Mutex::new(String::new()));
    let (done_tx, done_rx) = mpsc::channel();
    let readers = [
        child.stdout.take().map(|s| spawn_stream_reader(s, Arc::clone(&stdout_acc), done_tx.clone())),
        child.stderr.take().map(|s| spawn_stream_reader(s, Arc::clone(&stderr_acc), done_tx.clone())),
    ];
    drop(done_tx);
    let reader_count = readers.iter().flatten().count();

    // Grandchildren that inherited the pipes can keep them open after the
    // child exits. Readers still running at the deadline are abandoned.
    let waited = wait_until(&mut child, deadline);
    let drained = matches!(waited, Ok(Some(_))) && await_readers(&done_rx, reader_count, deadline);

    let stdout = snapshot(&stdout_acc);
    let stderr = snapshot(&stderr_acc);
    let duration_ms = elapsed_ms(start);

    match waited {
        Ok(Some(_)) if !drained => {
            CommandResult::timed_out(cmd_str.to_string(), stdout, stderr, duration_ms)
        }
        Ok(Some(status)) => CommandResult::new(
            cmd_str.to_string(),
            status.code().unwrap_or(-1),
            stdout,
            stderr,
            duration_ms,
        ),
        Ok(None) => CommandResult::timed_out(cmd_str.to_string(), stdout, stderr, duration_ms),
        Err(e) => CommandResult::new(
            cmd_str.to_string(),
            -1,
            stdout,
            format!("{stderr}Failed to wait: {e}"),
            duration_ms,
        ),
    }
}

/// `Ok(None)` means the deadline passed and the child was killed.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// True once `count` readers reported end of stream before `deadline`.
fn await_readers(done: &Receiver<()>, count: usize, deadline: Instant) -> bool {
    (0..count).all(|_| {
        let remaining = deadline.saturating_duration_since(Instant::now());
        done.recv_timeout(remaining).is_ok()
    })
}

fn spawn_stream_reader<R: Read + Send + 'static>(
    input: R,
    acc: Arc<Mutex<String>>,
    done: Sender<()>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(input);
        for line in reader.lines().map_while(Result::ok) {
            if let Ok(mut guard) = acc.lock() {
                guard.push_str(&line);
                guard.push('\n');
            }
        }
        let _ = done.send(());
    })
}

fn snapshot(acc: &Arc<Mutex<String>>) -> String {
    acc.lock().map(|g| g.clone()).unwrap_or_default()
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
