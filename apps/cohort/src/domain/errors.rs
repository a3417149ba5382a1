use thiserror::Error;
use uuid::Uuid;

use super::member::EnrollmentStatus;

/// Errors raised by entities, value objects and the composition domain service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid member name: {0}")]
    InvalidMemberName(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid team name: {0}")]
    InvalidTeamName(String),

    #[error("Invalid enrollment status: {0}")]
    InvalidStatus(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },

    #[error("Member {0} is not active and cannot join a team")]
    IneligibleMember(Uuid),

    #[error("Member {0} is already in the team")]
    DuplicateMember(Uuid),

    #[error("Member {member_id} already belongs to team {team_id}")]
    MemberAlreadyAssigned { member_id: Uuid, team_id: Uuid },

    #[error("Member {member_id} is not in team {team_id}")]
    MemberNotInTeam { team_id: Uuid, member_id: Uuid },

    #[error("Invalid team size: {0} (must be 2-4 members)")]
    InvalidTeamSize(usize),

    #[error("No eligible team available")]
    NoEligibleTeam,
}

impl DomainError {
    /// True for errors caused by malformed input rather than a broken invariant
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidMemberName(_)
                | DomainError::InvalidEmail(_)
                | DomainError::InvalidTeamName(_)
                | DomainError::InvalidStatus(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Errors reported by repository implementations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Team name already taken: {0}")]
    NameCollision(String),

    /// Stored state no longer matches what a pending change was planned against
    #[error("{entity} {id} was changed concurrently")]
    Conflict { entity: &'static str, id: Uuid },

    #[error("Stored data is invalid: {0}")]
    Corrupted(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl RepositoryError {
    pub fn team_not_found(id: Uuid) -> Self {
        RepositoryError::NotFound { entity: "Team", id }
    }

    pub fn member_not_found(id: Uuid) -> Self {
        RepositoryError::NotFound { entity: "Member", id }
    }

    pub fn team_conflict(id: Uuid) -> Self {
        RepositoryError::Conflict { entity: "Team", id }
    }

    pub fn member_conflict(id: Uuid) -> Self {
        RepositoryError::Conflict { entity: "Member", id }
    }
}

impl From<DomainError> for RepositoryError {
    fn from(err: DomainError) -> Self {
        RepositoryError::Corrupted(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised while delivering a notification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}
