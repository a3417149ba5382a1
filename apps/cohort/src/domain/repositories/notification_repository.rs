use async_trait::async_trait;

use crate::domain::errors::NotificationError;
use crate::domain::notification::Notification;

/// Outbound transport for rendered notifications (mail, chat, queue...)
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}
