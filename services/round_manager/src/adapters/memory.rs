//! In-process state store and advisory lock
//!
//! Suitable for a single orchestrator process and for tests; markers do not survive
//! a restart.

use crate::error::Result;
use crate::traits::{AdvisoryLock, LockLease, StateStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Named locks shared by every clone of the same instance
#[derive(Debug, Default, Clone)]
pub struct MemoryAdvisoryLock {
    held: Arc<Mutex<HashSet<String>>>,
}

impl MemoryAdvisoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.held.lock().contains(name)
    }
}

#[async_trait]
impl AdvisoryLock for MemoryAdvisoryLock {
    async fn try_acquire(&self, name: &str) -> Result<Option<LockLease>> {
        if !self.held.lock().insert(name.to_string()) {
            return Ok(None);
        }

        let held = self.held.clone();
        let key = name.to_string();
        Ok(Some(LockLease::new(name, move || {
            held.lock().remove(&key);
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_overwrites() {
        let store = MemoryStateStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "a").await.unwrap();
        store.set("k", "b").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_dropped() {
        let lock = MemoryAdvisoryLock::new();
        let other = lock.clone();

        let lease = lock.try_acquire("round-creation").await.unwrap();
        assert!(lease.is_some());
        assert!(other.try_acquire("round-creation").await.unwrap().is_none());
        // Different names do not contend
        assert!(other.try_acquire("another").await.unwrap().is_some());

        drop(lease);
        assert!(!lock.is_held("round-creation"));
        assert!(other.try_acquire("round-creation").await.unwrap().is_some());
    }
}
