// src/apply/lock.rs
//! Run-level lock so two executions never interleave on one project root.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crate::config::STATE_DIR;
use crate::error::{RefguardError, Result};

pub const LOCK_FILE: &str = "execute.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A lock file with no readable pid is abandoned once it is this old.
const UNREADABLE_GRACE: Duration = Duration::from_secs(10);

/// Held for the whole execution. Dropping it releases the lock.
#[derive(Debug)]
pub struct ExecutionLock {
    path: PathBuf,
}

impl ExecutionLock {
    /// Takes the lock for `root`, waiting up to `wait` for a holder to finish.
    ///
    /// # Errors
    /// `RefguardError::Locked` when the wait runs out, `Io` if the lock file
    /// cannot be created for another reason.
    pub fn acquire(root: &Path, wait: Duration) -> Result<Self> {
        let dir = root.join(STATE_DIR);
        fs::create_dir_all(&dir).map_err(|e| RefguardError::io(e, &dir))?;
        let path = dir.join(LOCK_FILE);
        let deadline = Instant::now() + wait;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        match fs::remove_file(&path) {
                            Ok(()) => continue,
                            Err(e) if e.kind() == ErrorKind::NotFound => continue,
                            Err(e) => return Err(RefguardError::io(e, &path)),
                        }
                    }
                    if Instant::now() >= deadline {
                        return Err(RefguardError::Locked { path });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(RefguardError::io(e, &path)),
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True when the holder recorded in `path` can no longer release it.
fn is_stale(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    match content.trim().parse::<u32>() {
        Ok(pid) => !pid_alive(pid),
        // The holder writes its pid right after creating the file.
        Err(_) => fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age >= UNREADABLE_GRACE),
    }
}

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // SAFETY: signal 0 only probes for existence.
    let result = unsafe { libc::kill(raw, 0) };
    if result == 0 {
        return true;
    }
    // EPERM: the process exists under another user.
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn pid_alive(pid: u32) -> bool {
    pid != 0
}

impl Drop for ExecutionLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_holder_times_out_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let first = ExecutionLock::acquire(dir.path(), Duration::ZERO).unwrap();
        assert!(first.path().exists());

        let err = ExecutionLock::acquire(dir.path(), Duration::from_millis(150)).unwrap_err();
        assert!(matches!(err, RefguardError::Locked { .. }));

        drop(first);
        let again = ExecutionLock::acquire(dir.path(), Duration::ZERO).unwrap();
        drop(again);
        assert!(!dir.path().join(STATE_DIR).join(LOCK_FILE).exists());
    }

    fn plant(root: &Path, content: &str) -> PathBuf {
        let dir = root.join(STATE_DIR);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(LOCK_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn lock_left_by_dead_process_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(dir.path(), "4000000\n");

        let lock = ExecutionLock::acquire(dir.path(), Duration::ZERO).unwrap();
        let holder = fs::read_to_string(&path).unwrap();
        assert_eq!(holder.trim(), std::process::id().to_string());
        drop(lock);
    }

    #[test]
    fn lock_held_by_live_process_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        plant(dir.path(), &format!("{}\n", std::process::id()));
        let err = ExecutionLock::acquire(dir.path(), Duration::ZERO).unwrap_err();
        assert!(matches!(err, RefguardError::Locked { .. }));
    }

    #[test]
    fn unreadable_lock_is_reclaimed_only_after_grace() {
        let dir = tempfile::tempdir().unwrap();
        let path = plant(dir.path(), "");
        assert!(ExecutionLock::acquire(dir.path(), Duration::ZERO).is_err());

        let old = SystemTime::now() - UNREADABLE_GRACE - Duration::from_secs(1);
        fs::File::options().write(true).open(&path).unwrap().set_modified(old).unwrap();
        assert!(ExecutionLock::acquire(dir.path(), Duration::ZERO).is_ok());
    }

    #[test]
    fn waiter_gets_the_lock_once_released() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let held = ExecutionLock::acquire(&root, Duration::ZERO).unwrap();
        let waiter = thread::spawn(move || ExecutionLock::acquire(&root, Duration::from_secs(5)).is_ok());
        thread::sleep(Duration::from_millis(200));
        drop(held);
        assert!(waiter.join().unwrap());
    }
}
