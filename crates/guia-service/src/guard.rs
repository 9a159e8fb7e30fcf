//! Per-user in-flight reading guard.
//!
//! Only one reading per user may be in generation at a time: a second
//! request while the first is still waiting on the oracle is almost
//! always a double tap, and serving it would double-charge. The guard
//! hands out at most one [`InflightPermit`] per user; the permit releases
//! its slot on drop, so every handler exit path (success, error, panic
//! unwind) frees it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use guia_core::UserId;

/// Tracks which users currently have a reading in generation.
#[derive(Debug, Clone, Default)]
pub struct InflightGuard {
    active: Arc<Mutex<HashSet<UserId>>>,
}

impl InflightGuard {
    /// Create an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to reserve the single reading slot for `user_id`.
    ///
    /// Returns `None` when a permit for this user is already live.
    #[must_use]
    pub fn acquire(&self, user_id: UserId) -> Option<InflightPermit> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.insert(user_id) {
            Some(InflightPermit {
                user_id,
                active: Arc::clone(&self.active),
            })
        } else {
            None
        }
    }
}

/// Holds a user's reading slot until dropped.
#[derive(Debug)]
pub struct InflightPermit {
    user_id: UserId,
    active: Arc<Mutex<HashSet<UserId>>>,
}

impl Drop for InflightPermit {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.remove(&self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_user_fails() {
        let guard = InflightGuard::new();
        let user = UserId::generate();

        let permit = guard.acquire(user);
        assert!(permit.is_some());
        assert!(guard.acquire(user).is_none());
    }

    #[test]
    fn drop_releases_the_slot() {
        let guard = InflightGuard::new();
        let user = UserId::generate();

        let permit = guard.acquire(user);
        drop(permit);
        assert!(guard.acquire(user).is_some());
    }

    #[test]
    fn users_do_not_block_each_other() {
        let guard = InflightGuard::new();
        let _a = guard.acquire(UserId::generate());
        let b = guard.acquire(UserId::generate());
        assert!(b.is_some());
    }
}
