//! Advisory locks on lock files via `flock(2)`
//!
//! Every orchestrator process pointed at the same lock directory contends for the
//! same `<lock_dir>/<name>.lock`. The kernel drops the lock if the holder dies, so a
//! crashed process never leaves a stale lock behind.

use crate::error::{Result, RoundError};
use crate::traits::{AdvisoryLock, LockLease};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileAdvisoryLock {
    lock_dir: PathBuf,
}

impl FileAdvisoryLock {
    pub fn new(lock_dir: impl Into<PathBuf>) -> Result<Self> {
        let lock_dir = lock_dir.into();
        std::fs::create_dir_all(&lock_dir).map_err(|e| {
            RoundError::lock(format!("Cannot create lock dir {:?}: {}", lock_dir, e))
        })?;
        Ok(Self { lock_dir })
    }

    pub fn lock_path(&self, name: &str) -> PathBuf {
        self.lock_dir.join(format!("{}.lock", name))
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }
}

#[async_trait]
impl AdvisoryLock for FileAdvisoryLock {
    async fn try_acquire(&self, name: &str) -> Result<Option<LockLease>> {
        let path = self.lock_path(name);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| RoundError::lock(format!("Cannot open {:?}: {}", path, e)))?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => {
                debug!("Acquired {:?}", path);
                Ok(Some(LockLease::new(name, move || drop(flock))))
            }
            Err((_, Errno::EWOULDBLOCK)) => Ok(None),
            Err((_, errno)) => Err(RoundError::lock(format!(
                "flock on {:?} failed: {}",
                path, errno
            ))),
        }
    }
}
