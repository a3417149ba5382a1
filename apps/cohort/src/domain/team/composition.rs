use serde::Serialize;

use super::team::Team;
use crate::domain::member::Member;

/// Classification of a composition outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    NoChange,
    Split,
    Merge,
}

/// What changed when a team's membership was mutated
///
/// `original_team` is the team handed back to the caller: the remaining half
/// after a split, the enlarged destination after a merge.
#[derive(Debug, Clone)]
pub enum TeamComposition {
    NoChange {
        team: Team,
    },
    Split {
        original_team: Team,
        new_team: Team,
        moved_members: Vec<Member>,
    },
    Merge {
        original_team: Team,
        /// Emptied source team, to be deleted
        dissolved_team: Team,
        moved_members: Vec<Member>,
    },
}

impl TeamComposition {
    pub fn kind(&self) -> CompositionKind {
        match self {
            TeamComposition::NoChange { .. } => CompositionKind::NoChange,
            TeamComposition::Split { .. } => CompositionKind::Split,
            TeamComposition::Merge { .. } => CompositionKind::Merge,
        }
    }

    pub fn original_team(&self) -> &Team {
        match self {
            TeamComposition::NoChange { team } => team,
            TeamComposition::Split { original_team, .. } => original_team,
            TeamComposition::Merge { original_team, .. } => original_team,
        }
    }

    pub fn new_team(&self) -> Option<&Team> {
        match self {
            TeamComposition::Split { new_team, .. } => Some(new_team),
            _ => None,
        }
    }

    pub fn dissolved_team(&self) -> Option<&Team> {
        match self {
            TeamComposition::Merge { dissolved_team, .. } => Some(dissolved_team),
            _ => None,
        }
    }

    pub fn moved_members(&self) -> &[Member] {
        match self {
            TeamComposition::NoChange { .. } => &[],
            TeamComposition::Split { moved_members, .. } => moved_members,
            TeamComposition::Merge { moved_members, .. } => moved_members,
        }
    }

    pub fn into_original_team(self) -> Team {
        match self {
            TeamComposition::NoChange { team } => team,
            TeamComposition::Split { original_team, .. } => original_team,
            TeamComposition::Merge { original_team, .. } => original_team,
        }
    }
}

/// Outcome of adding a member to a team
#[derive(Debug, Clone)]
pub struct TeamCompositionResult {
    composition: TeamComposition,
}

impl TeamCompositionResult {
    pub fn new(composition: TeamComposition) -> Self {
        Self { composition }
    }

    pub fn requires_split(&self) -> bool {
        self.composition.kind() == CompositionKind::Split
    }

    pub fn composition(&self) -> &TeamComposition {
        &self.composition
    }

    pub fn into_composition(self) -> TeamComposition {
        self.composition
    }
}

/// Structural follow-up to removing a member
#[derive(Debug, Clone)]
pub enum RedistributionOutcome {
    /// Team kept its shape
    Unchanged,
    /// The solo member moved into another team
    Merged,
    /// The solo member had nowhere to go
    MergeFailed { stranded_member: Member },
    /// The last member left; the team should be deleted
    Emptied,
}

/// Outcome of removing a member from a team
///
/// Monitoring is independent of the structural outcome; a merge and a merge
/// failure can never both be reported.
#[derive(Debug, Clone)]
pub struct TeamRedistributionResult {
    composition: TeamComposition,
    removed_member: Member,
    requires_monitoring: bool,
    outcome: RedistributionOutcome,
}

impl TeamRedistributionResult {
    pub fn normal(team: Team, removed_member: Member) -> Self {
        Self {
            composition: TeamComposition::NoChange { team },
            removed_member,
            requires_monitoring: false,
            outcome: RedistributionOutcome::Unchanged,
        }
    }

    pub fn needs_monitoring(team: Team, removed_member: Member) -> Self {
        Self {
            requires_monitoring: true,
            ..Self::normal(team, removed_member)
        }
    }

    pub fn merged(composition: TeamComposition, removed_member: Member) -> Self {
        Self {
            composition,
            removed_member,
            requires_monitoring: false,
            outcome: RedistributionOutcome::Merged,
        }
    }

    pub fn needs_monitoring_and_merge(composition: TeamComposition, removed_member: Member) -> Self {
        Self {
            requires_monitoring: true,
            ..Self::merged(composition, removed_member)
        }
    }

    pub fn merge_failure(
        team: Team,
        removed_member: Member,
        stranded_member: Member,
        requires_monitoring: bool,
    ) -> Self {
        Self {
            composition: TeamComposition::NoChange { team },
            removed_member,
            requires_monitoring,
            outcome: RedistributionOutcome::MergeFailed { stranded_member },
        }
    }

    /// The team lost its last member
    pub fn emptied(team: Team, removed_member: Member) -> Self {
        Self {
            outcome: RedistributionOutcome::Emptied,
            ..Self::normal(team, removed_member)
        }
    }

    pub fn composition(&self) -> &TeamComposition {
        &self.composition
    }

    /// Member whose removal triggered this result
    pub fn removed_member(&self) -> &Member {
        &self.removed_member
    }

    pub fn outcome(&self) -> &RedistributionOutcome {
        &self.outcome
    }

    pub fn requires_monitoring(&self) -> bool {
        self.requires_monitoring
    }

    pub fn requires_merge(&self) -> bool {
        matches!(self.outcome, RedistributionOutcome::Merged)
    }

    pub fn merge_failure_occurred(&self) -> bool {
        matches!(self.outcome, RedistributionOutcome::MergeFailed { .. })
    }

    pub fn team_emptied(&self) -> bool {
        matches!(self.outcome, RedistributionOutcome::Emptied)
    }

    /// Remaining solo member when no team could take them
    pub fn stranded_member(&self) -> Option<&Member> {
        match &self.outcome {
            RedistributionOutcome::MergeFailed { stranded_member } => Some(stranded_member),
            _ => None,
        }
    }

    pub fn into_composition(self) -> TeamComposition {
        self.composition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{Email, EnrollmentStatus, MemberName};
    use crate::domain::team::TeamName;

    fn member(name: &str) -> Member {
        Member::new(
            MemberName::new(name).unwrap(),
            Email::new(format!("{}@example.com", name)).unwrap(),
            EnrollmentStatus::Active,
        )
    }

    fn team() -> Team {
        Team::new(TeamName::new("Owls").unwrap(), vec![member("a"), member("b")]).unwrap()
    }

    #[test]
    fn no_change_composition() {
        let t = team();
        let composition = TeamComposition::NoChange { team: t.clone() };

        assert_eq!(composition.kind(), CompositionKind::NoChange);
        assert_eq!(composition.original_team().id(), t.id());
        assert!(composition.new_team().is_none());
        assert!(composition.moved_members().is_empty());
        assert!(!TeamCompositionResult::new(composition).requires_split());
    }

    #[test]
    fn split_result_requires_split() {
        let original = team();
        let new_team = team();
        let moved = new_team.members().to_vec();
        let result = TeamCompositionResult::new(TeamComposition::Split {
            original_team: original,
            new_team: new_team.clone(),
            moved_members: moved,
        });

        assert!(result.requires_split());
        assert_eq!(result.composition().new_team().unwrap().id(), new_team.id());
        assert_eq!(result.composition().moved_members().len(), 2);
    }

    #[test]
    fn redistribution_flags() {
        let removed = member("gone");

        let normal = TeamRedistributionResult::normal(team(), removed.clone());
        assert!(!normal.requires_monitoring());
        assert!(!normal.requires_merge());
        assert!(!normal.merge_failure_occurred());

        let watched = TeamRedistributionResult::needs_monitoring(team(), removed.clone());
        assert!(watched.requires_monitoring());
        assert!(!watched.requires_merge());

        let stranded = member("solo");
        let failed =
            TeamRedistributionResult::merge_failure(team(), removed.clone(), stranded.clone(), true);
        assert!(failed.merge_failure_occurred());
        assert!(!failed.requires_merge());
        assert_eq!(failed.stranded_member().unwrap().id(), stranded.id());
        assert_eq!(failed.removed_member().id(), removed.id());
    }

    #[test]
    fn emptied_team_needs_no_follow_up() {
        let result = TeamRedistributionResult::emptied(team(), member("last"));

        assert!(result.team_emptied());
        assert!(!result.requires_monitoring());
        assert!(!result.requires_merge());
        assert!(result.stranded_member().is_none());
    }

    #[test]
    fn merged_with_monitoring() {
        let composition = TeamComposition::Merge {
            original_team: team(),
            dissolved_team: team(),
            moved_members: vec![member("solo")],
        };
        let result = TeamRedistributionResult::needs_monitoring_and_merge(composition, member("gone"));

        assert!(result.requires_merge());
        assert!(result.requires_monitoring());
        assert!(!result.merge_failure_occurred());
        assert!(result.composition().dissolved_team().is_some());
    }
}
