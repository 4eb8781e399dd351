use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_fd_lock::{LockWrite, RwLockWriteGuard};
use tokio::sync::OwnedMutexGuard;

use crate::error::RetrieveError;

/// Default suffix appended to the base workspace before `libs`.
pub const DEFAULT_WORKSPACE_SUFFIX: &str = "@";

/// The scratch directory used for `library` under `workspace`:
/// `<workspace><suffix>libs/<library>`.
pub fn lease_directory(workspace: &Path, suffix: &str, library: &str) -> PathBuf {
    let mut scratch = OsString::from(workspace.as_os_str());
    scratch.push(suffix);
    scratch.push("libs");
    PathBuf::from(scratch).join(library)
}

/// The advisory lock file guarding `directory`, kept beside it so that
/// clearing the directory leaves the lock in place.
pub fn lock_file_path(directory: &Path) -> PathBuf {
    let mut lock = directory.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

type LockTable = Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>;

/// Hands out exclusive leases on directories.
///
/// Two acquisitions of the same directory never overlap: the second waits
/// until the first lease is released. Different directories never wait on
/// each other. Clones share the same lock table.
///
/// Within a process, waiters queue on an in-memory mutex. Across processes,
/// the holder also keeps a write lock on the directory's lock file.
#[derive(Clone, Default)]
pub struct LeaseManager {
    locks: LockTable,
}

impl LeaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive ownership of `directory`.
    ///
    /// Dropping the returned future before it completes abandons the wait
    /// without taking the lease.
    pub async fn acquire(&self, directory: impl Into<PathBuf>) -> Result<Lease, RetrieveError> {
        let path = directory.into();
        let lock = self.lock_for(&path);

        tracing::debug!(path = %path.display(), "waiting for workspace lease");
        let guard = lock.lock_owned().await;

        // From here on, an early return drops the lease and frees the table.
        let mut lease = Lease {
            path,
            guard: Some(guard),
            file: None,
            locks: Arc::clone(&self.locks),
        };
        lease.file = Some(lock_directory(&lease.path).await?);
        tracing::debug!(path = %lease.path.display(), "workspace lease acquired");

        Ok(lease)
    }

    /// Whether a lease on `directory` is currently held through this manager.
    pub fn is_leased(&self, directory: &Path) -> bool {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .get(directory)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }
}

async fn lock_directory(
    directory: &Path,
) -> Result<RwLockWriteGuard<tokio::fs::File>, RetrieveError> {
    let lock_path = lock_file_path(directory);
    if let Some(parent) = lock_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RetrieveError::filesystem(parent, e))?;
    }

    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .read(true)
        .truncate(false)
        .create(true)
        .open(&lock_path)
        .await
        .map_err(|e| RetrieveError::filesystem(&lock_path, e))?;

    file.lock_write()
        .await
        .map_err(|e| RetrieveError::filesystem(&lock_path, e.error))
}

/// Exclusive ownership of a directory, released on [`Lease::release`] or
/// when dropped.
pub struct Lease {
    path: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
    file: Option<RwLockWriteGuard<tokio::fs::File>>,
    locks: LockTable,
}

impl Lease {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Empty the leased directory, leaving it in place.
    ///
    /// Whatever an earlier holder left behind is gone afterwards.
    pub fn clear(&self) -> Result<(), RetrieveError> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(RetrieveError::filesystem(&self.path, e)),
        }
        std::fs::create_dir_all(&self.path).map_err(|e| RetrieveError::filesystem(&self.path, e))
    }

    /// Give the directory back. Calling it again is a no-op.
    pub fn release(&mut self) {
        drop(self.file.take());
        let Some(guard) = self.guard.take() else {
            return;
        };
        drop(guard);
        tracing::debug!(path = %self.path.display(), "workspace lease released");

        // Forget the lock once nobody holds or waits for it.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.path)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.path);
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("path", &self.path)
            .field("held", &self.is_held())
            .finish()
    }
}
