//! Per-branch serialization (§4.1, §5). Grounded on the teacher's
//! `SessionLockMap` (`crates/gateway/src/runtime/session_lock.rs`):
//! one `Semaphore(1)` per key, acquired for the duration of a mutation.
//! `delete_last_message` additionally needs a non-blocking `try_acquire`
//! so a branch busy with an in-flight round surfaces `Busy` immediately
//! (§4.1: "the other must either retry or ... surface `Busy`") instead of
//! queuing behind the Runner's round.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Default)]
pub struct BranchLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl BranchLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn sem_for(&self, branch_id: &str) -> Arc<Semaphore> {
        let mut locks = self.locks.lock();
        locks
            .entry(branch_id.to_owned())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone()
    }

    /// Block until the branch lock is free, then hold it.
    pub async fn acquire(&self, branch_id: &str) -> OwnedSemaphorePermit {
        self.sem_for(branch_id)
            .acquire_owned()
            .await
            .expect("semaphore is never closed")
    }

    /// Non-blocking acquire: `None` means another writer currently holds
    /// the branch lock.
    pub fn try_acquire(&self, branch_id: &str) -> Option<OwnedSemaphorePermit> {
        self.sem_for(branch_id).try_acquire_owned().ok()
    }

    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, sem| sem.available_permits() == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn try_acquire_fails_while_held() {
        let map = BranchLockMap::new();
        let _permit = map.acquire("b1").await;
        assert!(map.try_acquire("b1").is_none());
    }

    #[tokio::test]
    async fn try_acquire_succeeds_after_release() {
        let map = BranchLockMap::new();
        {
            let _permit = map.acquire("b1").await;
        }
        assert!(map.try_acquire("b1").is_some());
    }

    #[tokio::test]
    async fn different_branches_are_independent() {
        let map = BranchLockMap::new();
        let _p1 = map.acquire("b1").await;
        assert!(map.try_acquire("b2").is_some());
    }
}
