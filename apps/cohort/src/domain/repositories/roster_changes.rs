use uuid::Uuid;

use crate::domain::member::EnrollmentStatus;
use crate::domain::team::Team;

/// A single structural write to the roster
#[derive(Debug, Clone)]
pub enum RosterChange {
    /// Insert a team with its members, as `TeamRepository::create` does
    CreateTeam(Team),
    DeleteTeam(Uuid),
    AddMember { team_id: Uuid, member_id: Uuid },
    RemoveMember { team_id: Uuid, member_id: Uuid },
    /// Move a member from `from` to `to`; fails if the stored status is not `from`
    SetStatus {
        member_id: Uuid,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },
}

/// Writes of one use case, applied all together or not at all
///
/// Each expectation records the member list a team had when the use case
/// read it. Committing fails with `RepositoryError::Conflict` if any of
/// those teams changed in the meantime.
#[derive(Debug, Clone, Default)]
pub struct RosterChangeSet {
    expectations: Vec<(Uuid, Vec<Uuid>)>,
    changes: Vec<RosterChange>,
}

impl RosterChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `team` to still be stored with exactly its current members
    pub fn expect_members(&mut self, team: &Team) {
        if self.expectations.iter().any(|(id, _)| *id == team.id()) {
            return;
        }
        self.expectations.push((team.id(), team.member_ids()));
    }

    pub fn push(&mut self, change: RosterChange) {
        self.changes.push(change);
    }

    pub fn expectations(&self) -> &[(Uuid, Vec<Uuid>)] {
        &self.expectations
    }

    pub fn changes(&self) -> &[RosterChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{Email, Member, MemberName};
    use crate::domain::team::TeamName;

    fn team() -> Team {
        let members = ["ada", "alan"]
            .iter()
            .map(|name| {
                Member::new(
                    MemberName::new(*name).unwrap(),
                    Email::new(format!("{}@example.com", name)).unwrap(),
                    EnrollmentStatus::Active,
                )
            })
            .collect();
        Team::new(TeamName::new("Owls").unwrap(), members).unwrap()
    }

    #[test]
    fn first_expectation_per_team_wins() {
        let mut team = team();
        let mut changes = RosterChangeSet::new();

        changes.expect_members(&team);
        let first = team.member_ids()[0];
        team.delete_member(first).unwrap();
        changes.expect_members(&team);

        assert_eq!(changes.expectations().len(), 1);
        assert_eq!(changes.expectations()[0].1.len(), 2);
        assert!(changes.is_empty());
    }

    #[test]
    fn changes_keep_their_order() {
        let team = team();
        let mut changes = RosterChangeSet::new();

        changes.push(RosterChange::CreateTeam(team.clone()));
        changes.push(RosterChange::DeleteTeam(team.id()));

        assert!(matches!(changes.changes()[0], RosterChange::CreateTeam(_)));
        assert!(matches!(changes.changes()[1], RosterChange::DeleteTeam(_)));
    }
}
