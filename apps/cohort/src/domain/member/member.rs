use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{Email, EnrollmentStatus, MemberName};
use crate::domain::errors::{DomainError, DomainResult};

/// A learner enrolled in the mentoring program
///
/// Identity is the generated id; two members are equal if and only if
/// their ids are equal. Members are never deleted, only their enrollment
/// status changes.
///
/// # Example
/// ```
/// use cohort_teams::domain::member::{Email, EnrollmentStatus, Member, MemberName};
///
/// let mut member = Member::new(
///     MemberName::new("Grace").unwrap(),
///     Email::new("grace@example.com").unwrap(),
///     EnrollmentStatus::Active,
/// );
///
/// assert!(member.can_join());
/// member.transition_to(EnrollmentStatus::OnLeave).unwrap();
/// assert!(!member.can_join());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    id: Uuid,
    name: MemberName,
    email: Email,
    status: EnrollmentStatus,
    created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(name: MemberName, email: Email, status: EnrollmentStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            status,
            created_at: Utc::now(),
        }
    }

    /// Moves the member to `target`, returning the previous status
    ///
    /// The member is left unchanged when the transition table forbids it.
    pub fn transition_to(&mut self, target: EnrollmentStatus) -> DomainResult<EnrollmentStatus> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: target,
            });
        }

        let previous = self.status;
        self.status = target;
        Ok(previous)
    }

    /// Whether the member may join or remain on a team
    pub fn can_join(&self) -> bool {
        self.status.is_active()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &MemberName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstructs a Member from persistence layer data
    ///
    /// Only to be used by repository implementations.
    pub fn from_persistence(
        id: Uuid,
        name: MemberName,
        email: Email,
        status: EnrollmentStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            status,
            created_at,
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: EnrollmentStatus) -> Member {
        Member::new(
            MemberName::new("Linus").unwrap(),
            Email::new("linus@example.com").unwrap(),
            status,
        )
    }

    #[test]
    fn new_member_gets_unique_id() {
        let a = member(EnrollmentStatus::Active);
        let b = member(EnrollmentStatus::Active);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn equality_is_by_id_only() {
        let a = member(EnrollmentStatus::Active);
        let mut b = a.clone();
        b.transition_to(EnrollmentStatus::Withdrawn).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn active_to_withdrawn_allowed() {
        let mut m = member(EnrollmentStatus::Active);
        let previous = m.transition_to(EnrollmentStatus::Withdrawn).unwrap();
        assert_eq!(previous, EnrollmentStatus::Active);
        assert_eq!(m.status(), EnrollmentStatus::Withdrawn);
    }

    #[test]
    fn withdrawn_to_on_leave_denied_and_member_unchanged() {
        let mut m = member(EnrollmentStatus::Withdrawn);
        let err = m.transition_to(EnrollmentStatus::OnLeave).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: EnrollmentStatus::Withdrawn,
                to: EnrollmentStatus::OnLeave,
            }
        );
        assert_eq!(m.status(), EnrollmentStatus::Withdrawn);
    }

    #[test]
    fn only_active_members_can_join() {
        assert!(member(EnrollmentStatus::Active).can_join());
        assert!(!member(EnrollmentStatus::OnLeave).can_join());
        assert!(!member(EnrollmentStatus::Withdrawn).can_join());
    }
}
