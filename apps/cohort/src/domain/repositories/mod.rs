// Repository ports
// Implemented by the infrastructure layer

pub mod member_repository;
pub mod notification_repository;
pub mod roster_changes;
pub mod team_repository;

pub use member_repository::MemberRepository;
pub use notification_repository::NotificationRepository;
pub use roster_changes::{RosterChange, RosterChangeSet};
pub use team_repository::TeamRepository;
