use thiserror::Error;

use crate::domain::errors::{DomainError, NotificationError, RepositoryError};

/// Failure of a team use case
///
/// `Notification` means the structural change was already saved and only
/// the message could not be delivered; callers may retry the delivery.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Changes saved but notification failed: {0}")]
    Notification(#[from] NotificationError),
}

impl OrchestrationError {
    /// Whether retrying the delivery alone could succeed
    pub fn is_notification_failure(&self) -> bool {
        matches!(self, OrchestrationError::Notification(_))
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_failures_are_distinct() {
        let err: OrchestrationError =
            NotificationError::Delivery("timeout".to_string()).into();
        assert!(err.is_notification_failure());
        assert_eq!(
            err.to_string(),
            "Changes saved but notification failed: Notification delivery failed: timeout"
        );

        let err: OrchestrationError = DomainError::NoEligibleTeam.into();
        assert!(!err.is_notification_failure());
        assert_eq!(err.to_string(), "No eligible team available");
    }
}
