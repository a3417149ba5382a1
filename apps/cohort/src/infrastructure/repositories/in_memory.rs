use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::member::{EnrollmentStatus, Member};
use crate::domain::repositories::{MemberRepository, RosterChange, RosterChangeSet, TeamRepository};
use crate::domain::team::{Team, TeamName};

/// Stored shape of a team: members are kept by id, like a join table
#[derive(Debug, Clone)]
struct TeamRecord {
    name: TeamName,
    member_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    sequence: u64,
}

/// In-memory storage for development and testing
///
/// Implements both [`TeamRepository`] and [`MemberRepository`] over shared
/// maps so teams always see current member data. Writes hold the gate
/// exclusively, so a commit is never observed half applied.
#[derive(Default)]
pub struct InMemoryStorage {
    members: DashMap<Uuid, Member>,
    teams: DashMap<Uuid, TeamRecord>,
    sequence: AtomicU64,
    gate: RwLock<()>,
}

/// Team records touched by a pending commit; `None` marks a deletion
type StagedTeams = HashMap<Uuid, Option<TeamRecord>>;

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn hydrate(&self, id: Uuid, record: TeamRecord) -> RepositoryResult<Team> {
        let members = record
            .member_ids
            .iter()
            .map(|member_id| {
                self.members
                    .get(member_id)
                    .map(|m| m.clone())
                    .ok_or_else(|| {
                        RepositoryError::Corrupted(format!(
                            "team {} references unknown member {}",
                            id, member_id
                        ))
                    })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Team::from_persistence(id, record.name, members, record.created_at))
    }

    fn ensure_member_exists(&self, member_id: Uuid) -> RepositoryResult<()> {
        if self.members.contains_key(&member_id) {
            Ok(())
        } else {
            Err(RepositoryError::member_not_found(member_id))
        }
    }

    /// Team record as it would look with `staged` applied
    fn staged_record(&self, staged: &StagedTeams, id: Uuid) -> Option<TeamRecord> {
        match staged.get(&id) {
            Some(record) => record.clone(),
            None => self.teams.get(&id).map(|r| r.clone()),
        }
    }

    fn stage_create(&self, staged: &mut StagedTeams, team: &Team) -> RepositoryResult<()> {
        let mut ids: Vec<Uuid> = self.teams.iter().map(|entry| *entry.key()).collect();
        ids.extend(staged.keys().copied());

        let taken = ids.into_iter().filter(|id| *id != team.id()).any(|id| {
            self.staged_record(staged, id)
                .map_or(false, |record| record.name == *team.name())
        });
        if taken {
            return Err(RepositoryError::NameCollision(team.name().to_string()));
        }
        for member in team.members() {
            self.ensure_member_exists(member.id())?;
        }

        let sequence = self
            .staged_record(staged, team.id())
            .map(|existing| existing.sequence)
            .unwrap_or_else(|| self.sequence.fetch_add(1, Ordering::SeqCst));

        staged.insert(
            team.id(),
            Some(TeamRecord {
                name: team.name().clone(),
                member_ids: team.member_ids(),
                created_at: team.created_at(),
                sequence,
            }),
        );
        Ok(())
    }

    fn stage_delete(&self, staged: &mut StagedTeams, team_id: Uuid) -> RepositoryResult<()> {
        self.staged_record(staged, team_id)
            .ok_or_else(|| RepositoryError::team_not_found(team_id))?;
        staged.insert(team_id, None);
        Ok(())
    }

    fn stage_add_member(
        &self,
        staged: &mut StagedTeams,
        team_id: Uuid,
        member_id: Uuid,
    ) -> RepositoryResult<()> {
        self.ensure_member_exists(member_id)?;

        let mut record = self
            .staged_record(staged, team_id)
            .ok_or_else(|| RepositoryError::team_not_found(team_id))?;
        if !record.member_ids.contains(&member_id) {
            record.member_ids.push(member_id);
        }
        staged.insert(team_id, Some(record));
        Ok(())
    }

    fn stage_remove_member(
        &self,
        staged: &mut StagedTeams,
        team_id: Uuid,
        member_id: Uuid,
    ) -> RepositoryResult<()> {
        let mut record = self
            .staged_record(staged, team_id)
            .ok_or_else(|| RepositoryError::team_not_found(team_id))?;

        let position = record
            .member_ids
            .iter()
            .position(|id| *id == member_id)
            .ok_or(RepositoryError::NotFound {
                entity: "Membership",
                id: member_id,
            })?;
        record.member_ids.remove(position);
        staged.insert(team_id, Some(record));
        Ok(())
    }

    fn publish(&self, staged: StagedTeams) {
        for (id, record) in staged {
            match record {
                Some(record) => {
                    self.teams.insert(id, record);
                }
                None => {
                    self.teams.remove(&id);
                }
            }
        }
    }

    /// Stages one change against a private copy, then publishes it
    fn apply_single<F>(&self, stage: F) -> RepositoryResult<()>
    where
        F: FnOnce(&mut StagedTeams) -> RepositoryResult<()>,
    {
        let _gate = self.write_gate();
        let mut staged = StagedTeams::new();
        stage(&mut staged)?;
        self.publish(staged);
        Ok(())
    }

    fn apply(&self, changes: &RosterChangeSet) -> RepositoryResult<()> {
        let _gate = self.write_gate();

        for (team_id, expected) in changes.expectations() {
            let current = self.teams.get(team_id).map(|r| r.member_ids.clone());
            if current.as_ref() != Some(expected) {
                return Err(RepositoryError::team_conflict(*team_id));
            }
        }

        let mut staged = StagedTeams::new();
        let mut statuses: Vec<(Uuid, EnrollmentStatus)> = Vec::new();

        for change in changes.changes() {
            match change {
                RosterChange::CreateTeam(team) => self.stage_create(&mut staged, team)?,
                RosterChange::DeleteTeam(team_id) => self.stage_delete(&mut staged, *team_id)?,
                RosterChange::AddMember { team_id, member_id } => {
                    self.stage_add_member(&mut staged, *team_id, *member_id)?
                }
                RosterChange::RemoveMember { team_id, member_id } => {
                    self.stage_remove_member(&mut staged, *team_id, *member_id)?
                }
                RosterChange::SetStatus {
                    member_id,
                    from,
                    to,
                } => {
                    let current = match statuses.iter().rev().find(|(id, _)| id == member_id) {
                        Some((_, status)) => *status,
                        None => self
                            .members
                            .get(member_id)
                            .map(|m| m.status())
                            .ok_or_else(|| RepositoryError::member_not_found(*member_id))?,
                    };
                    if current != *from {
                        return Err(RepositoryError::member_conflict(*member_id));
                    }
                    statuses.push((*member_id, *to));
                }
            }
        }

        self.publish(staged);
        for (member_id, status) in statuses {
            self.write_status(member_id, status)?;
        }
        Ok(())
    }

    fn write_status(&self, id: Uuid, status: EnrollmentStatus) -> RepositoryResult<()> {
        let mut member = self
            .members
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::member_not_found(id))?;

        let updated = Member::from_persistence(
            member.id(),
            member.name().clone(),
            member.email().clone(),
            status,
            member.created_at(),
        );
        *member = updated;
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryStorage {
    async fn get(&self, id: Uuid) -> RepositoryResult<Team> {
        let _gate = self.read_gate();
        let record = self
            .teams
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| RepositoryError::team_not_found(id))?;
        self.hydrate(id, record)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Team>> {
        let _gate = self.read_gate();
        let mut records: Vec<(Uuid, TeamRecord)> = self
            .teams
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        records.sort_by_key(|(_, record)| record.sequence);

        records
            .into_iter()
            .map(|(id, record)| self.hydrate(id, record))
            .collect()
    }

    async fn find_by_member(&self, member_id: Uuid) -> RepositoryResult<Option<Team>> {
        let _gate = self.read_gate();
        let found = self
            .teams
            .iter()
            .find(|entry| entry.value().member_ids.contains(&member_id))
            .map(|entry| (*entry.key(), entry.value().clone()));

        found.map(|(id, record)| self.hydrate(id, record)).transpose()
    }

    async fn create(&self, team: &Team) -> RepositoryResult<()> {
        self.apply_single(|staged| self.stage_create(staged, team))
    }

    async fn delete(&self, team: &Team) -> RepositoryResult<()> {
        self.apply_single(|staged| self.stage_delete(staged, team.id()))
    }

    async fn add_member(&self, team_id: Uuid, member_id: Uuid) -> RepositoryResult<()> {
        self.apply_single(|staged| self.stage_add_member(staged, team_id, member_id))
    }

    async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> RepositoryResult<()> {
        self.apply_single(|staged| self.stage_remove_member(staged, team_id, member_id))
    }

    async fn commit(&self, changes: &RosterChangeSet) -> RepositoryResult<()> {
        self.apply(changes)
    }
}

#[async_trait]
impl MemberRepository for InMemoryStorage {
    async fn get(&self, id: Uuid) -> RepositoryResult<Member> {
        let _gate = self.read_gate();
        self.members
            .get(&id)
            .map(|m| m.clone())
            .ok_or_else(|| RepositoryError::member_not_found(id))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Member>> {
        let _gate = self.read_gate();
        let mut members: Vec<Member> = self.members.iter().map(|m| m.value().clone()).collect();
        members.sort_by_key(|m| m.created_at());
        Ok(members)
    }

    async fn save(&self, member: &Member) -> RepositoryResult<()> {
        let _gate = self.write_gate();
        self.members.insert(member.id(), member.clone());
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: EnrollmentStatus) -> RepositoryResult<()> {
        let _gate = self.write_gate();
        self.write_status(id, status)
    }
}
