//! Per-user serialization of cart access.

use std::collections::HashMap;
use std::sync::Arc;

use common::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per user, created on demand.
///
/// Entries nobody holds or waits on are pruned on the next acquisition.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    slots: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

/// Proof that the holder owns a user's cart until dropped.
#[derive(Debug)]
pub struct UserLockGuard {
    user_id: UserId,
    _guard: OwnedMutexGuard<()>,
}

impl UserLockGuard {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `user_id`'s cart.
    pub async fn lock(&self, user_id: UserId) -> UserLockGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(user_id).or_default().clone()
        };

        UserLockGuard {
            user_id,
            _guard: slot.lock_owned().await,
        }
    }

    /// Number of users currently tracked.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = UserLocks::new();
        let user = UserId::new();
        let guard = locks.lock(user).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.lock(user).await.user_id() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        assert_eq!(contender.await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.lock(UserId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(UserId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_slots_are_pruned() {
        let locks = UserLocks::new();
        drop(locks.lock(UserId::new()).await);
        drop(locks.lock(UserId::new()).await);
        // The second acquisition pruned the first slot.
        assert_eq!(locks.len().await, 1);
    }
}
