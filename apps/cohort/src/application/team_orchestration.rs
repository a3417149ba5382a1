use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::errors::OrchestrationResult;
use crate::domain::errors::DomainError;
use crate::domain::member::{Email, EnrollmentStatus, Member, MemberName};
use crate::domain::notification::NotificationService;
use crate::domain::repositories::{MemberRepository, RosterChange, RosterChangeSet, TeamRepository};
use crate::domain::services::TeamCompositionDomainService;
use crate::domain::team::{Team, TeamComposition, TeamName, TeamRedistributionResult};

/// Result of an enrollment status change
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub member_id: Uuid,
    pub previous: EnrollmentStatus,
    pub current: EnrollmentStatus,
    /// Team the member left or joined, as it stands afterwards
    #[serde(skip)]
    pub team: Option<Team>,
}

/// Team use cases
///
/// Each use case loads aggregates, runs exactly one domain operation, commits
/// all of its writes as one [`RosterChangeSet`] and only then emits
/// notifications. The commit is rejected if a team it was planned against
/// changed in the meantime, which also covers other processes sharing the
/// database. Within the process all use cases run under one composition
/// lock: split, merge and "smallest team" choices read the whole roster
/// before writing to it.
pub struct TeamOrchestrationService {
    teams: Arc<dyn TeamRepository>,
    members: Arc<dyn MemberRepository>,
    notifier: Arc<dyn NotificationService>,
    composition: TeamCompositionDomainService,
    lock: Mutex<()>,
}

impl TeamOrchestrationService {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        members: Arc<dyn MemberRepository>,
        notifier: Arc<dyn NotificationService>,
        composition: TeamCompositionDomainService,
    ) -> Self {
        Self {
            teams,
            members,
            notifier,
            composition,
            lock: Mutex::new(()),
        }
    }

    /// Enrolls a new member in the program
    #[instrument(skip(self, name, email))]
    pub async fn register_member(
        &self,
        name: MemberName,
        email: Email,
        status: EnrollmentStatus,
    ) -> OrchestrationResult<Member> {
        let member = Member::new(name, email, status);
        self.members.save(&member).await?;

        info!(member_id = %member.id(), "member registered");
        Ok(member)
    }

    /// Forms a team out of unassigned members
    #[instrument(skip(self, member_ids), fields(team_name = %name))]
    pub async fn create_team(&self, name: TeamName, member_ids: &[Uuid]) -> OrchestrationResult<Team> {
        let _guard = self.lock.lock().await;

        let mut members = Vec::with_capacity(member_ids.len());
        for member_id in member_ids {
            self.ensure_unassigned(*member_id, None).await?;
            members.push(self.members.get(*member_id).await?);
        }

        let team = Team::new(name, members)?;
        self.teams.create(&team).await?;

        info!(team_id = %team.id(), size = team.size(), "team created");
        Ok(team)
    }

    /// Adds a member to a team, splitting it if it reaches five members
    #[instrument(skip(self))]
    pub async fn add_member(&self, team_id: Uuid, member_id: Uuid) -> OrchestrationResult<Team> {
        let _guard = self.lock.lock().await;

        let team = self.teams.get(team_id).await?;
        let member = self.members.get(member_id).await?;
        self.ensure_unassigned(member_id, Some(team_id)).await?;

        let mut changes = RosterChangeSet::new();
        changes.expect_members(&team);
        let persisted = team.member_ids();
        let composition = self
            .composition
            .add_member_with_composition(team, member.clone())?
            .into_composition();
        stage_addition(&mut changes, &composition, &persisted, &member);

        self.teams.commit(&changes).await?;
        self.announce_addition(&composition, &member).await?;
        Ok(composition.into_original_team())
    }

    /// Removes a member from a team and re-homes whoever is left alone
    ///
    /// Returns the team the caller should look at next: the shrunk team, or
    /// the team that absorbed its last member. A team whose last member
    /// leaves is deleted and returned empty.
    ///
    /// Notices go out in a fixed order: merge, then monitoring, then merge
    /// failure. A team dissolved by a merge gets no monitoring notice since
    /// it no longer exists.
    #[instrument(skip(self))]
    pub async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> OrchestrationResult<Team> {
        let _guard = self.lock.lock().await;

        let mut changes = RosterChangeSet::new();
        let result = self.plan_removal(&mut changes, team_id, member_id).await?;

        self.teams.commit(&changes).await?;
        self.announce_removal(&result).await?;
        Ok(result.into_composition().into_original_team())
    }

    /// Places a member who came back to active into the smallest team
    #[instrument(skip(self))]
    pub async fn reassign_member(&self, member_id: Uuid) -> OrchestrationResult<Team> {
        let _guard = self.lock.lock().await;

        let member = self.members.get(member_id).await?;
        let mut changes = RosterChangeSet::new();
        let composition = self.plan_reassignment(&mut changes, &member).await?;

        self.teams.commit(&changes).await?;
        self.announce_addition(&composition, &member).await?;
        Ok(composition.into_original_team())
    }

    /// Applies an enrollment status change and its effect on team membership
    ///
    /// Leaving `Active` removes the member from their team; coming back to
    /// `Active` assigns them to one. The status and the team changes are
    /// committed together, so a failed reassignment keeps the old status.
    #[instrument(skip(self))]
    pub async fn change_member_status(
        &self,
        member_id: Uuid,
        target: EnrollmentStatus,
    ) -> OrchestrationResult<StatusChange> {
        let _guard = self.lock.lock().await;

        let mut member = self.members.get(member_id).await?;
        let previous = member.transition_to(target)?;

        let mut changes = RosterChangeSet::new();
        let effect = if previous.is_active() {
            match self.teams.find_by_member(member_id).await? {
                Some(team) => MembershipEffect::Left(
                    self.plan_removal(&mut changes, team.id(), member_id).await?,
                ),
                None => MembershipEffect::Unassigned,
            }
        } else if target.is_active() {
            MembershipEffect::Joined(self.plan_reassignment(&mut changes, &member).await?)
        } else {
            MembershipEffect::Unassigned
        };
        changes.push(RosterChange::SetStatus {
            member_id,
            from: previous,
            to: target,
        });

        self.teams.commit(&changes).await?;
        info!(%previous, current = %target, "member status changed");

        let team = match effect {
            MembershipEffect::Left(result) => {
                self.announce_removal(&result).await?;
                Some(result.into_composition().into_original_team())
            }
            MembershipEffect::Joined(composition) => {
                self.announce_addition(&composition, &member).await?;
                Some(composition.into_original_team())
            }
            MembershipEffect::Unassigned => None,
        };

        Ok(StatusChange {
            member_id,
            previous,
            current: target,
            team,
        })
    }

    async fn plan_removal(
        &self,
        changes: &mut RosterChangeSet,
        team_id: Uuid,
        member_id: Uuid,
    ) -> OrchestrationResult<TeamRedistributionResult> {
        let team = self.teams.get(team_id).await?;
        let roster = self.teams.get_all().await?;
        changes.expect_members(&team);

        let result = self.composition.execute_redistribution(team, member_id, &roster)?;

        changes.push(RosterChange::RemoveMember { team_id, member_id });
        if let TeamComposition::Merge {
            original_team: destination,
            dissolved_team,
            moved_members,
        } = result.composition()
        {
            if let Some(stored) = roster.iter().find(|t| t.id() == destination.id()) {
                changes.expect_members(stored);
            }
            for moved in moved_members {
                changes.push(RosterChange::AddMember {
                    team_id: destination.id(),
                    member_id: moved.id(),
                });
            }
            changes.push(RosterChange::DeleteTeam(dissolved_team.id()));
        } else if result.team_emptied() {
            changes.push(RosterChange::DeleteTeam(team_id));
        }

        Ok(result)
    }

    async fn plan_reassignment(
        &self,
        changes: &mut RosterChangeSet,
        member: &Member,
    ) -> OrchestrationResult<TeamComposition> {
        self.ensure_unassigned(member.id(), None).await?;

        let roster = self.teams.get_all().await?;
        let composition = self
            .composition
            .assign_member_to_team(member.clone(), &roster)?
            .into_composition();

        let target_id = composition.original_team().id();
        let persisted = match roster.iter().find(|t| t.id() == target_id) {
            Some(stored) => {
                changes.expect_members(stored);
                stored.member_ids()
            }
            None => Vec::new(),
        };
        stage_addition(changes, &composition, &persisted, member);

        Ok(composition)
    }

    async fn announce_addition(
        &self,
        composition: &TeamComposition,
        member: &Member,
    ) -> OrchestrationResult<()> {
        match composition {
            TeamComposition::Split {
                original_team,
                new_team,
                ..
            } => {
                info!(
                    team_id = %original_team.id(),
                    new_team_id = %new_team.id(),
                    "team split"
                );
                self.notifier
                    .notify_team_split(original_team, new_team, member)
                    .await?;
            }
            other => {
                info!(team_id = %other.original_team().id(), member_id = %member.id(), "member added");
            }
        }
        Ok(())
    }

    async fn announce_removal(&self, result: &TeamRedistributionResult) -> OrchestrationResult<()> {
        let team = result.composition().original_team();

        if result.team_emptied() {
            info!(team_id = %team.id(), "empty team deleted");
            return Ok(());
        }

        if let Some(dissolved) = result.composition().dissolved_team() {
            info!(
                dissolved_team_id = %dissolved.id(),
                destination_team_id = %team.id(),
                "team merged"
            );
            for moved in result.composition().moved_members() {
                self.notifier.notify_team_merge(team, moved).await?;
            }
        } else if result.requires_monitoring() {
            self.notifier
                .notify_team_monitoring(team, result.removed_member())
                .await?;
        }
        if let Some(stranded) = result.stranded_member() {
            warn!(member_id = %stranded.id(), "no team can take the remaining member");
            self.notifier.notify_merge_failure(team, stranded).await?;
        }

        Ok(())
    }

    /// A member may sit on one team at a time; `allowed` is the team being joined
    async fn ensure_unassigned(&self, member_id: Uuid, allowed: Option<Uuid>) -> OrchestrationResult<()> {
        match self.teams.find_by_member(member_id).await? {
            Some(team) if Some(team.id()) != allowed => Err(DomainError::MemberAlreadyAssigned {
                member_id,
                team_id: team.id(),
            }
            .into()),
            _ => Ok(()),
        }
    }
}

/// How a status change moved the member between teams
enum MembershipEffect {
    Left(TeamRedistributionResult),
    Joined(TeamComposition),
    Unassigned,
}

/// Writes for adding `member` to a team whose stored members were `persisted`
fn stage_addition(
    changes: &mut RosterChangeSet,
    composition: &TeamComposition,
    persisted: &[Uuid],
    member: &Member,
) {
    match composition {
        TeamComposition::Split {
            original_team,
            new_team,
            ..
        } => {
            changes.push(RosterChange::CreateTeam(new_team.clone()));
            for moved in persisted.iter().filter(|id| !original_team.contains(**id)) {
                changes.push(RosterChange::RemoveMember {
                    team_id: original_team.id(),
                    member_id: *moved,
                });
            }
            if original_team.contains(member.id()) {
                changes.push(RosterChange::AddMember {
                    team_id: original_team.id(),
                    member_id: member.id(),
                });
            }
        }
        other => changes.push(RosterChange::AddMember {
            team_id: other.original_team().id(),
            member_id: member.id(),
        }),
    }
}
