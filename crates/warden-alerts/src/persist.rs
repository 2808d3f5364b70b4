//! Locked read-modify-write access to JSON state files.
//!
//! Several `warden` processes may share a data directory. Every access takes
//! an advisory lock on a `<file>.lock` sidecar, re-reads the file under that
//! lock, and writes replacements to a temporary sibling that is renamed into
//! place. Readers take the lock shared, writers exclusive.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{AlertError, Result};

/// A state file guarded by an advisory lock.
#[derive(Debug, Clone)]
pub(crate) struct LockedFile {
    path: PathBuf,
    lock_path: PathBuf,
}

impl LockedFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        Self { path, lock_path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `op` on the current content under a shared lock.
    ///
    /// `op` receives `None` for a missing or blank file.
    pub(crate) fn read<T>(&self, op: impl FnOnce(Option<&str>) -> Result<T>) -> Result<T> {
        let mut lock = fd_lock::RwLock::new(self.open_lock()?);
        let _guard = lock.read().map_err(|e| self.unavailable("lock", &e))?;
        let raw = self.read_raw()?;
        op(raw.as_deref())
    }

    /// Runs `op` on the current content under an exclusive lock and writes
    /// the bytes it returns, if any, before releasing the lock.
    pub(crate) fn update<T>(
        &self,
        op: impl FnOnce(Option<&str>) -> Result<(T, Option<Vec<u8>>)>,
    ) -> Result<T> {
        let mut lock = fd_lock::RwLock::new(self.open_lock()?);
        let _guard = lock.write().map_err(|e| self.unavailable("lock", &e))?;
        let raw = self.read_raw()?;
        let (value, replacement) = op(raw.as_deref())?;
        if let Some(bytes) = replacement {
            write_atomic(&self.path, &bytes).map_err(|e| self.unavailable("write", &e))?;
        }
        Ok(value)
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable("create directory for", &e))?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| self.unavailable("open lock for", &e))
    }

    fn read_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.unavailable("read", &e)),
        }
    }

    fn unavailable(&self, action: &str, err: &io::Error) -> AlertError {
        AlertError::StoreUnavailable {
            reason: format!("cannot {action} {}: {err}", self.path.display()),
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = sibling(path, ".tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn counter(file: &LockedFile) -> u64 {
        file.read(|raw| Ok(raw.map_or(0, |r| r.trim().parse().unwrap())))
            .unwrap()
    }

    fn increment(file: &LockedFile) {
        file.update(|raw| {
            let n: u64 = raw.map_or(0, |r| r.trim().parse().unwrap());
            Ok(((), Some((n + 1).to_string().into_bytes())))
        })
        .unwrap();
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let file = LockedFile::new(dir.path().join("state.json"));
        assert!(file.read(|raw| Ok(raw.is_none())).unwrap());
    }

    #[test]
    fn update_without_bytes_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let file = LockedFile::new(dir.path().join("state.json"));
        file.update(|_| Ok(((), None))).unwrap();
        assert!(!file.path().exists());
    }

    #[test]
    fn update_creates_parents_and_cleans_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("state.json");
        let file = LockedFile::new(&path);
        increment(&file);
        assert!(path.exists());
        assert!(!sibling(&path, ".tmp").exists());
        assert_eq!(counter(&file), 1);
    }

    #[test]
    fn concurrent_handles_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let path = Arc::new(dir.path().join("state.json"));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = Arc::clone(&path);
                thread::spawn(move || {
                    let file = LockedFile::new(path.as_path());
                    for _ in 0..25 {
                        increment(&file);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter(&LockedFile::new(path.as_path())), 100);
    }
}
