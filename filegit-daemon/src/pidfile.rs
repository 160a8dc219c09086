//! Daemon identity via `daemon.pid`.
//!
//! The file carries the daemon's pid and is held under an exclusive `flock`
//! for the daemon's lifetime. The lock, not the recorded pid, decides who owns
//! it: a pid left behind by a dead process is simply overwritten.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Holds `daemon.pid` for the lifetime of the daemon and removes it on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

impl PidFile {
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open pid file {:?}", path))?;

        if !try_flock_exclusive(&file)? {
            match read_pid(path) {
                Ok(Some(pid)) => anyhow::bail!("Daemon already running (PID: {})", pid),
                _ => anyhow::bail!("Daemon already running (pid file {:?} is locked)", path),
            }
        }

        if let Ok(Some(pid)) = read_pid(path) {
            warn!("Replacing stale pid file for PID {}", pid);
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(std::process::id().to_string().as_bytes())?;
        file.sync_all()?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove pid file {:?}: {}", self.path, e);
        }
    }
}

/// Pid recorded in the file, or `None` if there is no file or it is empty.
///
/// Only positive values that fit a `pid_t` are accepted; `0` and negative
/// pids address process groups when signalled.
pub fn read_pid(path: &Path) -> Result<Option<i32>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context("Failed to read pid file"),
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    match text.parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(Some(pid)),
        _ => anyhow::bail!("Malformed pid file {:?}: {:?}", path, text),
    }
}

#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(unix)]
pub fn is_alive(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if pid <= 0 {
        return false;
    }
    // Signal 0 checks existence without delivering anything.
    match kill(Pid::from_raw(pid), None) {
        Ok(_) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

#[cfg(not(unix))]
pub fn is_alive(pid: i32) -> bool {
    pid > 0
}

/// Asks the daemon to shut down gracefully.
#[cfg(unix)]
pub fn terminate(pid: i32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if pid <= 0 {
        anyhow::bail!("Refusing to signal PID {}", pid);
    }
    kill(Pid::from_raw(pid), Signal::SIGTERM)
        .with_context(|| format!("Failed to signal PID {}", pid))
}

#[cfg(not(unix))]
pub fn terminate(pid: i32) -> Result<()> {
    anyhow::bail!("Stopping PID {} is only supported on unix", pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_writes_and_drop_removes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daemon.pid");

        {
            let _pid_file = PidFile::acquire(&path).unwrap();
            assert_eq!(
                read_pid(&path).unwrap(),
                Some(std::process::id() as i32)
            );
        }

        assert!(!path.exists());
        assert_eq!(read_pid(&path).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_held_lock_blocks_second_acquire() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daemon.pid");

        let first = PidFile::acquire(&path).unwrap();
        let second = PidFile::acquire(&path);

        let err = second.unwrap_err().to_string();
        assert!(err.contains("already running"), "{}", err);
        drop(first);

        assert!(PidFile::acquire(&path).is_ok());
    }

    #[test]
    fn test_unlocked_pid_file_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daemon.pid");
        // Recorded pid is live (it is ours) but nothing holds the lock.
        std::fs::write(&path, std::process::id().to_string()).unwrap();

        let _pid_file = PidFile::acquire(&path).unwrap();
        assert_eq!(
            read_pid(&path).unwrap(),
            Some(std::process::id() as i32)
        );
    }

    #[test]
    fn test_out_of_range_pids_are_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daemon.pid");

        for text in ["4294967295", "0", "-1", "not a pid"] {
            std::fs::write(&path, text).unwrap();
            assert!(read_pid(&path).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_malformed_pid_file_does_not_block_acquire() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daemon.pid");
        std::fs::write(&path, "0").unwrap();

        let _pid_file = PidFile::acquire(&path).unwrap();
        assert_eq!(
            read_pid(&path).unwrap(),
            Some(std::process::id() as i32)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_positive_pids_never_signalled() {
        assert!(!is_alive(0));
        assert!(!is_alive(-1));
        assert!(terminate(0).is_err());
        assert!(terminate(-1).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dead_pid_is_not_alive() {
        // At the kernel's pid_max ceiling, so no process can hold it.
        assert!(!is_alive(4_194_304));
    }
}
