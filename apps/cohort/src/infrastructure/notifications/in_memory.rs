use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::NotificationError;
use crate::domain::notification::Notification;
use crate::domain::repositories::NotificationRepository;

/// Keeps delivered notifications in memory for inspection
#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    sent: Mutex<Vec<Notification>>,
    offline: AtomicBool,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, oldest first
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Makes every following delivery fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery(format!(
                "transport offline, dropped '{}'",
                notification.subject
            )));
        }

        self.sent
            .lock()
            .map_err(|_| NotificationError::Delivery("outbox lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationKind;
    use uuid::Uuid;

    fn notification() -> Notification {
        Notification {
            kind: NotificationKind::TeamMonitoring,
            team_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            subject: "Team Owls needs monitoring".to_string(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn records_sent_notifications() {
        let outbox = InMemoryNotificationRepository::new();
        outbox.send(notification()).await.unwrap();
        assert_eq!(outbox.sent().len(), 1);
    }

    #[tokio::test]
    async fn offline_outbox_fails_delivery() {
        let outbox = InMemoryNotificationRepository::new();
        outbox.set_offline(true);

        let err = outbox.send(notification()).await.unwrap_err();

        assert!(matches!(err, NotificationError::Delivery(_)));
        assert!(outbox.sent().is_empty());
    }
}
