//! Single-instance run lock.
//!
//! The external scheduler is the authority on serialized execution: a new run
//! only starts after the previous one has fully terminated, and queued starts
//! wait instead of being canceled. The lock file models that contract locally
//! so an overlapping start fails fast instead of racing the previous run for
//! the port and the reserved domain.
//!
//! A run killed at the outer ceiling never drops its lock, so a lock file
//! whose recorded pid is no longer alive is treated as stale and reclaimed;
//! fail-fast applies only to a live holder.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::SupervisorError;

/// Held for the whole run; the file disappears on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Create the lock file, failing if a live run already holds it. A lock
    /// left behind by a dead process is removed and re-acquired.
    pub fn acquire(path: &Path) -> Result<Self, SupervisorError> {
        match Self::try_create(path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if Self::holder_alive(path) {
                    warn!(path = %path.display(), "lock file held by a live run");
                    return Err(SupervisorError::LockHeld {
                        path: path.to_path_buf(),
                    });
                }

                warn!(path = %path.display(), "removing stale lock left by a dead run");
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(SupervisorError::Lock(e)),
                }

                // One retry; losing it means another acquirer got in first.
                match Self::try_create(path) {
                    Ok(lock) => Ok(lock),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                        Err(SupervisorError::LockHeld {
                            path: path.to_path_buf(),
                        })
                    }
                    Err(e) => Err(SupervisorError::Lock(e)),
                }
            }
            Err(e) => Err(SupervisorError::Lock(e)),
        }
    }

    fn try_create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        // Pid identifies the holder for staleness checks and inspection.
        let _ = write!(file, "{}", std::process::id());
        debug!(path = %path.display(), "run lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Whether the pid recorded in the lock file is still running. An
    /// unreadable or garbled file counts as dead.
    fn holder_alive(path: &Path) -> bool {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return false;
        };
        let Ok(pid) = contents.trim().parse::<u32>() else {
            return false;
        };
        process_exists(pid)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove run lock");
        }
    }
}

/// Check if a process exists.
fn process_exists(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // kill with signal 0 probes liveness without signaling.
        unsafe { libc::kill(pid as i32, 0) == 0 }
    }
    #[cfg(not(unix))]
    {
        // No cheap probe available; assume the holder is alive and let the
        // operator clean up by hand.
        let _ = pid;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.lock");

        // The first lock records our own (live) pid.
        let _lock = RunLock::acquire(&path).unwrap();
        let err = RunLock::acquire(&path).unwrap_err();
        assert!(matches!(err, SupervisorError::LockHeld { .. }));
    }

    #[test]
    fn drop_releases_the_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.lock");

        {
            let _lock = RunLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());

        let _relock = RunLock::acquire(&path).unwrap();
    }

    #[test]
    fn lock_file_records_pid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.lock");

        let _lock = RunLock::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, std::process::id().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn stale_lock_from_a_dead_run_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.lock");

        // A short-lived child gives us a pid that is certainly dead.
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let dead_pid = child.id();
        child.wait().unwrap();

        std::fs::write(&path, dead_pid.to_string()).unwrap();

        let lock = RunLock::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(contents, std::process::id().to_string());
    }

    #[test]
    fn garbled_lock_file_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.lock");
        std::fs::write(&path, "not-a-pid").unwrap();

        let _lock = RunLock::acquire(&path).unwrap();
    }
}
