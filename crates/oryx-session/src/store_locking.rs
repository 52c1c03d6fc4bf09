//! Lock-file helpers guarding a session read-modify-write cycle.
//!
//! One lock file per state file, held only for the duration of a single
//! mutation. This removes lost updates between overlapping mutations of the
//! same file, not ordering between overlapping pipeline invocations.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub(crate) struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub(crate) fn acquire_lock(
    path: &Path,
    timeout: Duration,
    stale_after: Duration,
) -> Result<LockGuard> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create lock directory {}", parent.display()))?;
    }

    let started = SystemTime::now();
    loop {
        match OpenOptions::new().create_new(true).write(true).open(path) {
            Ok(mut file) => {
                // Owner pid, for post-mortem inspection of abandoned locks.
                let _ = writeln!(file, "{}", std::process::id());
                return Ok(LockGuard {
                    path: path.to_path_buf(),
                });
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
                if stale_after > Duration::ZERO
                    && lock_age(path).is_some_and(|age| age >= stale_after)
                    && fs::remove_file(path).is_ok()
                {
                    continue;
                }
                let waited = SystemTime::now().duration_since(started).unwrap_or_default();
                if waited >= timeout {
                    bail!("timed out acquiring lock {}", path.display());
                }
                std::thread::sleep(LOCK_POLL_INTERVAL);
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to acquire lock {}", path.display()));
            }
        }
    }
}

fn lock_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}
