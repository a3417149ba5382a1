// Notification domain module
// Events worth telling mentors about and the service that renders them

pub mod events;
pub mod service;

use serde::Serialize;
use uuid::Uuid;

pub use events::{NotificationEvent, NotificationKind};
pub use service::{MessageNotificationService, NotificationService};

/// A rendered, human-readable notification ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Team the notification is about
    pub team_id: Uuid,
    /// Member whose change triggered it
    pub member_id: Uuid,
    pub subject: String,
    pub body: String,
}
