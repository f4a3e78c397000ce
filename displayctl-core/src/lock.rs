//! Single-instance lock keyed by process id.
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another instance is already running (pid {0})")]
    AlreadyRunning(u32),

    #[error("I/O error while accessing {path:?}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Lock file holding our pid. Removed when dropped.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Lock location next to the state file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("displayctl/app.lock"))
    }

    /// Take the lock by atomically creating the file. A leftover lock whose
    /// recorded pid is no longer alive (or that holds garbage) is treated as
    /// stale: it is removed and creation is retried once.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<LockFile, LockError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| LockError::Io {
                source: err,
                path: parent.to_path_buf(),
            })?;
        }

        for attempt in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(std::process::id().to_string().as_bytes())
                        .map_err(|err| LockError::Io {
                            source: err,
                            path: path.clone(),
                        })?;
                    return Ok(LockFile { path });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    let holder = fs::read_to_string(&path)
                        .ok()
                        .and_then(|raw| raw.trim().parse::<u32>().ok());
                    match holder {
                        Some(pid) if pid != std::process::id() && process_alive(pid) => {
                            return Err(LockError::AlreadyRunning(pid));
                        }
                        _ if attempt == 0 => {
                            log::warn!("removing stale lock file {path:?}");
                            let _ = fs::remove_file(&path);
                        }
                        // The file reappeared between removal and recreation;
                        // another instance won the race.
                        _ => return Err(LockError::AlreadyRunning(holder.unwrap_or(0))),
                    }
                }
                Err(err) => {
                    return Err(LockError::Io {
                        source: err,
                        path: path.clone(),
                    });
                }
            }
        }
        unreachable!("lock acquisition loop always returns")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(test)]
mod tests {
    use super::{LockError, LockFile};
    use std::fs;
    use std::path::PathBuf;

    fn scratch_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("displayctl-lock-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("app.lock")
    }

    #[test]
    fn second_acquire_reports_the_holder() {
        let path = scratch_path("double");
        let _lock = LockFile::acquire(&path).unwrap();

        // Simulate a second process: the file records a live pid other than
        // the would-be acquirer's. Overwrite with a known-alive pid (pid 1).
        fs::write(&path, "1").unwrap();
        match LockFile::acquire(&path) {
            Err(LockError::AlreadyRunning(pid)) => assert_eq!(pid, 1),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
    }

    #[test]
    fn drop_releases_the_lock() {
        let path = scratch_path("release");
        {
            let _lock = LockFile::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
        let _lock = LockFile::acquire(&path).unwrap();
    }

    #[test]
    fn stale_or_garbage_lock_is_replaced() {
        let path = scratch_path("stale");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not-a-pid").unwrap();

        let lock = LockFile::acquire(&path).unwrap();
        let recorded: u32 = fs::read_to_string(lock.path()).unwrap().trim().parse().unwrap();
        assert_eq!(recorded, std::process::id());
    }

    #[test]
    fn lock_held_by_a_dead_process_is_replaced() {
        let path = scratch_path("dead");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        // A reaped child's pid is no longer alive.
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let dead_pid = child.id();
        child.wait().unwrap();
        fs::write(&path, dead_pid.to_string()).unwrap();

        let lock = LockFile::acquire(&path).unwrap();
        let recorded: u32 = fs::read_to_string(lock.path()).unwrap().trim().parse().unwrap();
        assert_eq!(recorded, std::process::id());
    }
}
