use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use super::postgres_member_repository::{database_error, MemberRow};
use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::member::{EnrollmentStatus, Member};
use crate::domain::repositories::{RosterChange, RosterChangeSet, TeamRepository};
use crate::domain::team::{Team, TeamName};

const TEAM_NAME_CONSTRAINT: &str = "teams_name_key";
const MEMBER_FOREIGN_KEY: &str = "team_members_member_id_fkey";

#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    team_id: Uuid,
    #[sqlx(flatten)]
    member: MemberRow,
}

/// PostgreSQL implementation of TeamRepository
///
/// Teams live in `teams`; membership and its order live in `team_members`.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a new PostgresTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_members(&self, team_id: Uuid) -> RepositoryResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.id, m.name, m.email, m.status, m.created_at
            FROM team_members tm
            JOIN members m ON m.id = tm.member_id
            WHERE tm.team_id = $1
            ORDER BY tm.position
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load team members", e))?;

        rows.into_iter().map(Member::try_from).collect()
    }

    async fn connection(&self) -> RepositoryResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| database_error("Failed to acquire connection", e))
    }

    fn to_team(row: TeamRow, members: Vec<Member>) -> RepositoryResult<Team> {
        Ok(Team::from_persistence(
            row.id,
            TeamName::new(row.name)?,
            members,
            row.created_at,
        ))
    }
}

fn map_create_error(team: &Team, err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(TEAM_NAME_CONSTRAINT) {
            return RepositoryError::NameCollision(team.name().to_string());
        }
    }
    database_error("Failed to create team", err)
}

async fn insert_team(conn: &mut PgConnection, team: &Team) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO teams (id, name, created_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(team.id())
    .bind(team.name().as_str())
    .bind(team.created_at())
    .execute(&mut *conn)
    .await
    .map_err(|e| map_create_error(team, e))?;

    sqlx::query("DELETE FROM team_members WHERE team_id = $1")
        .bind(team.id())
        .execute(&mut *conn)
        .await
        .map_err(|e| database_error("Failed to reset team members", e))?;

    for (position, member) in team.members().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, member_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(team.id())
        .bind(member.id())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_create_error(team, e))?;
    }

    Ok(())
}

async fn delete_team(conn: &mut PgConnection, team_id: Uuid) -> RepositoryResult<()> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(team_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| database_error("Failed to delete team", e))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::team_not_found(team_id));
    }

    Ok(())
}

async fn insert_membership(
    conn: &mut PgConnection,
    team_id: Uuid,
    member_id: Uuid,
) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO team_members (team_id, member_id, position)
        SELECT $1, $2, COALESCE(MAX(position) + 1, 0)
        FROM team_members
        WHERE team_id = $1
        ON CONFLICT (team_id, member_id) DO NOTHING
        "#,
    )
    .bind(team_id)
    .bind(member_id)
    .execute(&mut *conn)
    .await
    .map_err(|err| {
        if let sqlx::Error::Database(db) = &err {
            if db.is_foreign_key_violation() {
                return if db.constraint() == Some(MEMBER_FOREIGN_KEY) {
                    RepositoryError::member_not_found(member_id)
                } else {
                    RepositoryError::team_not_found(team_id)
                };
            }
        }
        database_error("Failed to add team member", err)
    })?;

    Ok(())
}

async fn delete_membership(
    conn: &mut PgConnection,
    team_id: Uuid,
    member_id: Uuid,
) -> RepositoryResult<()> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND member_id = $2")
        .bind(team_id)
        .bind(member_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| database_error("Failed to remove team member", e))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound {
            entity: "Membership",
            id: member_id,
        });
    }

    Ok(())
}

/// Locks the team row and checks its members are still `expected`
async fn check_expected_members(
    conn: &mut PgConnection,
    team_id: Uuid,
    expected: &[Uuid],
) -> RepositoryResult<()> {
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
        .bind(team_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| database_error("Failed to lock team", e))?;
    if locked.is_none() {
        return Err(RepositoryError::team_conflict(team_id));
    }

    let current: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT member_id FROM team_members
        WHERE team_id = $1
        ORDER BY position
        "#,
    )
    .bind(team_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| database_error("Failed to read team members", e))?;

    if current != expected {
        return Err(RepositoryError::team_conflict(team_id));
    }
    Ok(())
}

async fn set_status(
    conn: &mut PgConnection,
    member_id: Uuid,
    from: EnrollmentStatus,
    to: EnrollmentStatus,
) -> RepositoryResult<()> {
    let result = sqlx::query("UPDATE members SET status = $3 WHERE id = $1 AND status = $2")
        .bind(member_id)
        .bind(from)
        .bind(to)
        .execute(&mut *conn)
        .await
        .map_err(|e| database_error("Failed to update member status", e))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::member_conflict(member_id));
    }
    Ok(())
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get(&self, id: Uuid) -> RepositoryResult<Team> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, created_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to find team by id", e))?
        .ok_or_else(|| RepositoryError::team_not_found(id))?;

        let members = self.load_members(id).await?;
        Self::to_team(row, members)
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Team>> {
        let rows = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, created_at
            FROM teams
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list teams", e))?;

        let memberships = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT tm.team_id, m.id, m.name, m.email, m.status, m.created_at
            FROM team_members tm
            JOIN members m ON m.id = tm.member_id
            ORDER BY tm.team_id, tm.position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list team members", e))?;

        let mut by_team: HashMap<Uuid, Vec<Member>> = HashMap::new();
        for membership in memberships {
            by_team
                .entry(membership.team_id)
                .or_default()
                .push(Member::try_from(membership.member)?);
        }

        rows.into_iter()
            .map(|row| {
                let members = by_team.remove(&row.id).unwrap_or_default();
                Self::to_team(row, members)
            })
            .collect()
    }

    async fn find_by_member(&self, member_id: Uuid) -> RepositoryResult<Option<Team>> {
        let team_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT team_id FROM team_members WHERE member_id = $1 LIMIT 1
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to find team by member", e))?;

        match team_id {
            Some(id) => self.get(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn create(&self, team: &Team) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        insert_team(&mut tx, team).await?;

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit team", e))?;

        debug!(team_id = %team.id(), "team stored");
        Ok(())
    }

    async fn delete(&self, team: &Team) -> RepositoryResult<()> {
        let mut conn = self.connection().await?;
        delete_team(&mut conn, team.id()).await
    }

    async fn add_member(&self, team_id: Uuid, member_id: Uuid) -> RepositoryResult<()> {
        let mut conn = self.connection().await?;
        insert_membership(&mut conn, team_id, member_id).await
    }

    async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> RepositoryResult<()> {
        let mut conn = self.connection().await?;
        delete_membership(&mut conn, team_id, member_id).await
    }

    async fn commit(&self, changes: &RosterChangeSet) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        // lock in a stable order so two commits touching the same teams cannot deadlock
        let mut expectations: Vec<&(Uuid, Vec<Uuid>)> = changes.expectations().iter().collect();
        expectations.sort_by_key(|(team_id, _)| *team_id);
        for (team_id, expected) in expectations {
            check_expected_members(&mut tx, *team_id, expected).await?;
        }

        for change in changes.changes() {
            match change {
                RosterChange::CreateTeam(team) => insert_team(&mut tx, team).await?,
                RosterChange::DeleteTeam(team_id) => delete_team(&mut tx, *team_id).await?,
                RosterChange::AddMember { team_id, member_id } => {
                    insert_membership(&mut tx, *team_id, *member_id).await?
                }
                RosterChange::RemoveMember { team_id, member_id } => {
                    delete_membership(&mut tx, *team_id, *member_id).await?
                }
                RosterChange::SetStatus {
                    member_id,
                    from,
                    to,
                } => set_status(&mut tx, *member_id, *from, *to).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit roster changes", e))?;

        debug!(changes = changes.changes().len(), "roster changes committed");
        Ok(())
    }
}
