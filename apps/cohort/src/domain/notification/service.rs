use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::events::NotificationEvent;
use crate::domain::errors::NotificationError;
use crate::domain::member::Member;
use crate::domain::repositories::NotificationRepository;
use crate::domain::team::Team;

/// Tells mentors about composition changes
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// `trigger` is the member whose arrival made the team split
    async fn notify_team_split(
        &self,
        original_team: &Team,
        new_team: &Team,
        trigger: &Member,
    ) -> Result<(), NotificationError>;

    async fn notify_team_merge(
        &self,
        destination: &Team,
        moved_member: &Member,
    ) -> Result<(), NotificationError>;

    async fn notify_team_monitoring(
        &self,
        team: &Team,
        removed_member: &Member,
    ) -> Result<(), NotificationError>;

    async fn notify_merge_failure(
        &self,
        team: &Team,
        stranded_member: &Member,
    ) -> Result<(), NotificationError>;
}

/// Renders events into human-readable messages and hands them to a transport
pub struct MessageNotificationService {
    repository: Arc<dyn NotificationRepository>,
}

impl MessageNotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    async fn dispatch(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        let notification = event.into_notification();
        debug!(
            kind = ?notification.kind,
            team_id = %notification.team_id,
            member_id = %notification.member_id,
            "dispatching notification"
        );
        self.repository.send(notification).await
    }
}

#[async_trait]
impl NotificationService for MessageNotificationService {
    async fn notify_team_split(
        &self,
        original_team: &Team,
        new_team: &Team,
        trigger: &Member,
    ) -> Result<(), NotificationError> {
        self.dispatch(NotificationEvent::TeamSplit {
            original_team: original_team.clone(),
            new_team: new_team.clone(),
            trigger: trigger.clone(),
        })
        .await
    }

    async fn notify_team_merge(
        &self,
        destination: &Team,
        moved_member: &Member,
    ) -> Result<(), NotificationError> {
        self.dispatch(NotificationEvent::TeamMerge {
            destination: destination.clone(),
            moved_member: moved_member.clone(),
        })
        .await
    }

    async fn notify_team_monitoring(
        &self,
        team: &Team,
        removed_member: &Member,
    ) -> Result<(), NotificationError> {
        self.dispatch(NotificationEvent::TeamMonitoring {
            team: team.clone(),
            removed_member: removed_member.clone(),
        })
        .await
    }

    async fn notify_merge_failure(
        &self,
        team: &Team,
        stranded_member: &Member,
    ) -> Result<(), NotificationError> {
        self.dispatch(NotificationEvent::MergeFailure {
            team: team.clone(),
            stranded_member: stranded_member.clone(),
        })
        .await
    }
}
