use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::selection::TeamSelector;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::member::Member;
use crate::domain::team::{Team, TeamComposition, TeamCompositionResult, TeamRedistributionResult};

/// Business rules for growing, shrinking and re-balancing teams
///
/// Every operation works on in-memory aggregates and performs no I/O. The
/// only source of non-determinism is the injected [`TeamSelector`], used to
/// break ties between equally small teams.
#[derive(Clone)]
pub struct TeamCompositionDomainService {
    selector: Arc<dyn TeamSelector>,
}

impl TeamCompositionDomainService {
    pub fn new(selector: Arc<dyn TeamSelector>) -> Self {
        Self { selector }
    }

    /// Adds a member and splits the team if it reached five members
    ///
    /// The first half (by join order) stays, the rest move to a new team.
    pub fn add_member_with_composition(
        &self,
        mut team: Team,
        member: Member,
    ) -> DomainResult<TeamCompositionResult> {
        team.add_member(member)?;

        let composition = match team.split()? {
            Some(new_team) => {
                debug!(
                    team_id = %team.id(),
                    new_team_id = %new_team.id(),
                    "team split after reaching capacity"
                );
                let moved_members = new_team.members().to_vec();
                TeamComposition::Split {
                    original_team: team,
                    new_team,
                    moved_members,
                }
            }
            None => TeamComposition::NoChange { team },
        };

        Ok(TeamCompositionResult::new(composition))
    }

    /// Removes a member and re-homes the last one left behind, if any
    ///
    /// `roster` is every team known to the caller; the team being shrunk is
    /// ignored if it appears there. Having nowhere to move the solo member
    /// is reported in the result, not as an error. A team left with nobody
    /// is reported as emptied.
    pub fn execute_redistribution(
        &self,
        mut team: Team,
        member_id: Uuid,
        roster: &[Team],
    ) -> DomainResult<TeamRedistributionResult> {
        let removed = team.delete_member(member_id)?;
        if team.is_empty() {
            return Ok(TeamRedistributionResult::emptied(team, removed));
        }
        let monitoring = team.needs_monitoring();

        if !team.needs_redistribution() {
            return Ok(if monitoring {
                TeamRedistributionResult::needs_monitoring(team, removed)
            } else {
                TeamRedistributionResult::normal(team, removed)
            });
        }

        let candidates: Vec<&Team> = roster
            .iter()
            .filter(|candidate| candidate.id() != team.id() && candidate.can_accept_new_member())
            .collect();

        let Some(destination) = self.pick_smallest(&candidates) else {
            let stranded = team.members()[0].clone();
            debug!(team_id = %team.id(), member_id = %stranded.id(), "no team can take solo member");
            return Ok(TeamRedistributionResult::merge_failure(
                team, removed, stranded, monitoring,
            ));
        };

        let mut destination = destination.clone();
        let moved_members = destination.absorb(&mut team)?;
        let composition = TeamComposition::Merge {
            original_team: destination,
            dissolved_team: team,
            moved_members,
        };

        Ok(if monitoring {
            TeamRedistributionResult::needs_monitoring_and_merge(composition, removed)
        } else {
            TeamRedistributionResult::merged(composition, removed)
        })
    }

    /// Places a member who is back to active into the smallest open team
    ///
    /// Falls back to every non-empty team when none has room, in which case
    /// the chosen team splits.
    pub fn assign_member_to_team(
        &self,
        member: Member,
        roster: &[Team],
    ) -> DomainResult<TeamCompositionResult> {
        let open: Vec<&Team> = roster.iter().filter(|t| t.can_accept_new_member()).collect();
        let eligible = if open.is_empty() {
            roster.iter().filter(|t| !t.is_empty()).collect()
        } else {
            open
        };

        let team = self
            .pick_smallest(&eligible)
            .ok_or(DomainError::NoEligibleTeam)?
            .clone();

        self.add_member_with_composition(team, member)
    }

    fn pick_smallest<'a>(&self, candidates: &[&'a Team]) -> Option<&'a Team> {
        let min = candidates.iter().map(|t| t.size()).min()?;
        let smallest: Vec<&'a Team> = candidates
            .iter()
            .copied()
            .filter(|t| t.size() == min)
            .collect();

        let index = self.selector.pick(smallest.len()).min(smallest.len() - 1);
        Some(smallest[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{Email, EnrollmentStatus, MemberName};
    use crate::domain::services::selection::RandomTeamSelector;
    use crate::domain::team::{CompositionKind, TeamName};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always picks the same index
    struct FixedSelector(usize);

    impl TeamSelector for FixedSelector {
        fn pick(&self, _candidates: usize) -> usize {
            self.0
        }
    }

    /// Records how many candidates it was offered
    #[derive(Default)]
    struct CountingSelector(AtomicUsize);

    impl TeamSelector for CountingSelector {
        fn pick(&self, candidates: usize) -> usize {
            self.0.store(candidates, Ordering::SeqCst);
            candidates - 1
        }
    }

    fn service() -> TeamCompositionDomainService {
        TeamCompositionDomainService::new(Arc::new(FixedSelector(0)))
    }

    fn member(name: &str) -> Member {
        Member::new(
            MemberName::new(name).unwrap(),
            Email::new(format!("{}@example.com", name)).unwrap(),
            EnrollmentStatus::Active,
        )
    }

    fn team(name: &str, size: usize) -> Team {
        let members = (1..=size).map(|i| member(&format!("{}{}", name, i))).collect();
        Team::from_persistence(Uuid::new_v4(), TeamName::new(name).unwrap(), members, Utc::now())
    }

    #[test]
    fn add_member_without_split() {
        let t = team("Owls", 3);
        let newcomer = member("new");

        let result = service().add_member_with_composition(t.clone(), newcomer.clone()).unwrap();

        assert!(!result.requires_split());
        let composition = result.composition();
        assert_eq!(composition.kind(), CompositionKind::NoChange);
        assert_eq!(composition.original_team().size(), 4);
        assert!(composition.original_team().contains(newcomer.id()));
    }

    #[test]
    fn fifth_member_splits_two_and_three() {
        let t = team("Owls", 4);
        let ids = t.member_ids();
        let m5 = member("m5");

        let result = service().add_member_with_composition(t, m5.clone()).unwrap();

        assert!(result.requires_split());
        let composition = result.composition();
        let original = composition.original_team();
        let new_team = composition.new_team().unwrap();
        assert_eq!(original.member_ids(), ids[..2].to_vec());
        assert_eq!(new_team.member_ids(), vec![ids[2], ids[3], m5.id()]);
        assert_eq!(new_team.name().as_str(), "OwlsSplit");
        assert_eq!(composition.moved_members().len(), 3);
    }

    #[test]
    fn add_duplicate_member_fails() {
        let t = team("Owls", 3);
        let existing = t.members()[0].clone();

        let err = service().add_member_with_composition(t, existing.clone()).unwrap_err();

        assert_eq!(err, DomainError::DuplicateMember(existing.id()));
    }

    #[test]
    fn removal_from_four_is_normal() {
        let t = team("Owls", 4);
        let gone = t.member_ids()[0];

        let result = service().execute_redistribution(t, gone, &[]).unwrap();

        assert!(!result.requires_monitoring());
        assert!(!result.requires_merge());
        assert!(!result.merge_failure_occurred());
        assert_eq!(result.removed_member().id(), gone);
        assert_eq!(result.composition().original_team().size(), 3);
    }

    #[test]
    fn removal_to_two_needs_monitoring_only() {
        let t = team("Owls", 3);
        let gone = t.member_ids()[2];

        let result = service().execute_redistribution(t, gone, &[]).unwrap();

        assert!(result.requires_monitoring());
        assert!(!result.requires_merge());
        assert_eq!(result.composition().kind(), CompositionKind::NoChange);
    }

    #[test]
    fn removal_of_unknown_member_fails() {
        let t = team("Owls", 3);
        let err = service().execute_redistribution(t, Uuid::new_v4(), &[]).unwrap_err();
        assert!(matches!(err, DomainError::MemberNotInTeam { .. }));
    }

    #[test]
    fn solo_member_merges_into_three_member_team() {
        let t = team("Owls", 2);
        let solo = t.member_ids()[0];
        let gone = t.member_ids()[1];
        let u = team("Bees", 3);
        let roster = vec![t.clone(), u.clone()];

        let result = service().execute_redistribution(t.clone(), gone, &roster).unwrap();

        assert!(result.requires_merge());
        assert!(result.requires_monitoring());
        let composition = result.composition();
        assert_eq!(composition.kind(), CompositionKind::Merge);
        assert_eq!(composition.original_team().id(), u.id());
        assert_eq!(composition.original_team().size(), 4);
        assert!(composition.original_team().contains(solo));
        assert_eq!(composition.dissolved_team().unwrap().id(), t.id());
        assert_eq!(composition.dissolved_team().unwrap().size(), 0);
        assert_eq!(composition.moved_members()[0].id(), solo);
    }

    #[test]
    fn merge_fails_without_other_teams() {
        let t = team("Owls", 2);
        let solo = t.member_ids()[0];
        let gone = t.member_ids()[1];

        let result = service().execute_redistribution(t.clone(), gone, &[t.clone()]).unwrap();

        assert!(result.merge_failure_occurred());
        assert!(!result.requires_merge());
        assert_eq!(result.stranded_member().unwrap().id(), solo);
        assert_eq!(result.removed_member().id(), gone);
        assert_eq!(result.composition().original_team().member_ids(), vec![solo]);
    }

    #[test]
    fn merge_fails_when_other_teams_are_full() {
        let t = team("Owls", 2);
        let gone = t.member_ids()[1];
        let full = team("Bees", 4);

        let result = service().execute_redistribution(t, gone, &[full]).unwrap();

        assert!(result.merge_failure_occurred());
    }

    #[test]
    fn merge_picks_among_smallest_only() {
        let selector = Arc::new(CountingSelector::default());
        let service = TeamCompositionDomainService::new(selector.clone());
        let t = team("Owls", 2);
        let gone = t.member_ids()[1];
        let roster = vec![team("Bees", 3), team("Ants", 2), team("Cats", 2), team("Dogs", 4)];

        let result = service.execute_redistribution(t, gone, &roster).unwrap();

        assert_eq!(selector.0.load(Ordering::SeqCst), 2);
        let destination = result.composition().original_team();
        assert_eq!(destination.id(), roster[2].id());
        assert_eq!(destination.size(), 3);
    }

    #[test]
    fn seeded_merge_always_lands_in_minimal_team() {
        for seed in 0..25 {
            let service = TeamCompositionDomainService::new(Arc::new(RandomTeamSelector::seeded(seed)));
            let t = team("Owls", 2);
            let gone = t.member_ids()[1];
            let roster = vec![team("Bees", 2), team("Ants", 3), team("Cats", 2)];
            let minimal = [roster[0].id(), roster[2].id()];

            let result = service.execute_redistribution(t, gone, &roster).unwrap();

            let destination = result.composition().original_team();
            assert!(minimal.contains(&destination.id()), "seed {}", seed);
            assert_eq!(destination.size(), 3);
        }
    }

    #[test]
    fn reassign_to_empty_roster_fails() {
        let err = service().assign_member_to_team(member("back"), &[]).unwrap_err();
        assert_eq!(err, DomainError::NoEligibleTeam);
    }

    #[test]
    fn removing_last_member_empties_team() {
        let mut t = team("Owls", 2);
        let first = t.member_ids()[0];
        t.delete_member(first).unwrap();
        let last = t.member_ids()[0];

        let result = service()
            .execute_redistribution(t, last, &[team("Bees", 3)])
            .unwrap();

        assert!(result.team_emptied());
        assert!(!result.requires_monitoring());
        assert!(!result.requires_merge());
        assert!(!result.merge_failure_occurred());
        assert!(result.composition().original_team().is_empty());
    }

    #[test]
    fn empty_teams_never_receive_members() {
        let shell = Team::from_persistence(
            Uuid::new_v4(),
            TeamName::new("Shell").unwrap(),
            Vec::new(),
            Utc::now(),
        );
        let bees = team("Bees", 3);

        let result = service()
            .assign_member_to_team(member("back"), &[shell.clone(), bees.clone()])
            .unwrap();
        assert_eq!(result.composition().original_team().id(), bees.id());

        let t = team("Owls", 2);
        let gone = t.member_ids()[1];
        let result = service()
            .execute_redistribution(t, gone, &[shell.clone(), bees.clone()])
            .unwrap();
        assert_eq!(result.composition().original_team().id(), bees.id());

        let err = service()
            .assign_member_to_team(member("back"), &[shell])
            .unwrap_err();
        assert_eq!(err, DomainError::NoEligibleTeam);
    }

    #[test]
    fn reassign_prefers_smallest_open_team() {
        let roster = vec![team("Bees", 3), team("Ants", 2), team("Dogs", 4)];
        let back = member("back");

        let result = service().assign_member_to_team(back.clone(), &roster).unwrap();

        assert!(!result.requires_split());
        let team = result.composition().original_team();
        assert_eq!(team.id(), roster[1].id());
        assert_eq!(team.size(), 3);
        assert!(team.contains(back.id()));
    }

    #[test]
    fn reassign_splits_when_every_team_is_full() {
        let roster = vec![team("Bees", 4), team("Dogs", 4)];
        let back = member("back");

        let result = service().assign_member_to_team(back.clone(), &roster).unwrap();

        assert!(result.requires_split());
        let composition = result.composition();
        assert_eq!(composition.original_team().id(), roster[0].id());
        assert_eq!(composition.original_team().size(), 2);
        assert!(composition.new_team().unwrap().contains(back.id()));
    }
}
