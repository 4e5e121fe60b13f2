use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::executor::ActionExecutor;
use super::models::ActionKind;
use crate::storage::UserLocks;

/// Runs delayed trigger actions on tokio timers.
///
/// The wait happens without the user's lock; the lock is taken only to
/// execute, so a delayed action never blocks other work for that user.
pub struct ActionScheduler {
    executor: Arc<ActionExecutor>,
    locks: Arc<UserLocks>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ActionScheduler {
    pub fn new(executor: Arc<ActionExecutor>, locks: Arc<UserLocks>) -> Self {
        Self {
            executor,
            locks,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn schedule(&self, user_id: &str, trigger_id: &str, action: ActionKind, delay: Duration) {
        let executor = self.executor.clone();
        let locks = self.locks.clone();
        let user_id = user_id.to_string();
        let trigger_id = trigger_id.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let _guard = locks.lock(&user_id).await;
            match executor.execute(&user_id, &trigger_id, &action).await {
                Ok(()) => {
                    info!(
                        user_id = %user_id,
                        trigger_id = %trigger_id,
                        action = action.name(),
                        "Delayed trigger action executed"
                    );
                    if let Err(e) = executor.settle(&user_id).await {
                        warn!(user_id = %user_id, "Achievement refresh after delayed action failed: {}", e);
                    }
                }
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        trigger_id = %trigger_id,
                        action = action.name(),
                        "Delayed trigger action failed: {}",
                        e
                    );
                }
            }
        });

        let mut tasks = self.tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Delayed actions that have not run yet
    pub async fn pending(&self) -> usize {
        let tasks = self.tasks.lock().await;
        tasks.iter().filter(|task| !task.is_finished()).count()
    }

    /// Drops every delayed action that has not run yet
    pub async fn abort_all(&self) {
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}
