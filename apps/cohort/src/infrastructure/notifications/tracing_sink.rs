use async_trait::async_trait;
use tracing::info;

use crate::domain::errors::NotificationError;
use crate::domain::notification::Notification;
use crate::domain::repositories::NotificationRepository;

/// Delivers notifications to the log
///
/// Stands in for the mail and chat integrations, which live outside this service.
#[derive(Debug, Default, Clone)]
pub struct TracingNotificationRepository;

impl TracingNotificationRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationRepository for TracingNotificationRepository {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            target: "notifications",
            kind = ?notification.kind,
            team_id = %notification.team_id,
            member_id = %notification.member_id,
            subject = %notification.subject,
            "{}",
            notification.body
        );
        Ok(())
    }
}
