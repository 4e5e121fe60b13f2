use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

/// Registry of per-user async mutexes. Every mutation of a user's state runs
/// while holding that user's guard; different users never contend.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `user_id`
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        self.user_lock(user_id).await.lock_owned().await
    }

    /// Number of users that have been locked at least once
    pub async fn tracked_users(&self) -> usize {
        self.locks.read().await.len()
    }

    async fn user_lock(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.locks.read().await;
            if let Some(lock) = guard.get(user_id) {
                return lock.clone();
            }
        }

        let mut guard = self.locks.write().await;
        guard
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.lock("alice").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("alice").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let locks = UserLocks::new();
        let _alice = locks.lock("alice").await;

        let bob = tokio::time::timeout(Duration::from_millis(100), locks.lock("bob")).await;
        assert!(bob.is_ok());
        assert_eq!(locks.tracked_users().await, 2);
    }
}
