use tokio::sync::broadcast;
use tracing::debug;

use super::events::Notification;

/// Broadcast channel for user notifications
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Creates a bus that buffers up to `capacity` notifications per lagging receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to every current subscriber
    pub fn emit(&self, notification: Notification) {
        let user_id = notification.user_id.clone();
        let kind = notification.kind_name();

        match self.sender.send(notification) {
            Ok(receiver_count) => {
                debug!(
                    user_id = %user_id,
                    kind,
                    receivers = receiver_count,
                    "Notification emitted"
                );
            }
            Err(_) => {
                debug!(user_id = %user_id, kind, "Notification emitted with no receivers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(256)
    }
}
