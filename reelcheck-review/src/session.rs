//! Per-caller submission state
//!
//! Each user owns one in-flight flag. The HTTP layer hands the caller's flag to
//! a request-scoped orchestrator, so two sessions of the same user share it
//! while different users never block each other.

use reelcheck_common::UserId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Set while a submission for the owning caller is running
#[derive(Debug, Clone, Default)]
pub struct InFlightFlag(Arc<AtomicBool>);

impl InFlightFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Whether any handle or guard besides this one refers to the flag
    fn is_referenced_elsewhere(&self) -> bool {
        Arc::strong_count(&self.0) > 1
    }

    /// Claim the flag; `None` if it is already held
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(&self.0)))
    }
}

/// Clears the flag when dropped, on success, error or cancellation alike
#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// In-flight flags keyed by user
///
/// Entries live only while a request holds the user's flag. Unreferenced
/// entries are pruned whenever a new user is added, so the map is bounded by
/// the number of concurrent callers rather than every user ever seen.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    flags: Arc<RwLock<HashMap<UserId, InFlightFlag>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The caller's flag, created on first use
    pub async fn in_flight_for(&self, user: &UserId) -> InFlightFlag {
        if let Some(flag) = self.flags.read().await.get(user) {
            return flag.clone();
        }

        let mut flags = self.flags.write().await;
        if !flags.contains_key(user) {
            // Safe under the write lock: nobody can clone an entry meanwhile
            flags.retain(|_, flag| flag.is_referenced_elsewhere());
        }
        flags.entry(user.clone()).or_default().clone()
    }

    /// Number of users currently holding an entry
    pub async fn tracked_users(&self) -> usize {
        self.flags.read().await.len()
    }

    /// Number of users with a submission currently running
    pub async fn active_submissions(&self) -> usize {
        self.flags
            .read()
            .await
            .values()
            .filter(|flag| flag.is_set())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_acquire_and_release() {
        let flag = InFlightFlag::new();
        assert!(!flag.is_set());

        let guard = flag.try_acquire().expect("first acquire succeeds");
        assert!(flag.is_set());
        assert!(flag.try_acquire().is_none(), "second acquire must fail");

        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_registry_shares_flag_per_user() {
        let registry = SessionRegistry::new();
        let alice = UserId::new("alice").unwrap();
        let bob = UserId::new("bob").unwrap();

        let first = registry.in_flight_for(&alice).await;
        let second = registry.in_flight_for(&alice).await;
        let other = registry.in_flight_for(&bob).await;

        let _guard = first.try_acquire().unwrap();
        assert!(second.is_set(), "same user shares one flag");
        assert!(!other.is_set(), "different users are independent");
        assert!(other.try_acquire().is_some());
        assert_eq!(registry.active_submissions().await, 1);
    }

    #[tokio::test]
    async fn test_registry_prunes_unreferenced_flags() {
        let registry = SessionRegistry::new();

        let alice = registry.in_flight_for(&UserId::new("alice").unwrap()).await;
        drop(registry.in_flight_for(&UserId::new("bob").unwrap()).await);
        assert_eq!(registry.tracked_users().await, 2);

        // Adding carol drops bob (unreferenced) but keeps alice (still held)
        let _carol = registry.in_flight_for(&UserId::new("carol").unwrap()).await;
        assert_eq!(registry.tracked_users().await, 2);

        let alice_again = registry.in_flight_for(&UserId::new("alice").unwrap()).await;
        let _guard = alice.try_acquire().unwrap();
        assert!(alice_again.is_set(), "held flag must survive pruning");
    }
}
