use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::member::{Email, EnrollmentStatus, Member, MemberName};
use crate::domain::repositories::MemberRepository;

/// Row shape of the `members` table
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MemberRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = RepositoryError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member::from_persistence(
            row.id,
            MemberName::new(row.name)?,
            Email::new(row.email)?,
            row.status,
            row.created_at,
        ))
    }
}

pub(crate) fn database_error(context: &str, err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(format!("{}: {}", context, err))
}

/// PostgreSQL implementation of MemberRepository
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn get(&self, id: Uuid) -> RepositoryResult<Member> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, name, email, status, created_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to find member by id", e))?;

        row.ok_or_else(|| RepositoryError::member_not_found(id))?
            .try_into()
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, name, email, status, created_at
            FROM members
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to list members", e))?;

        rows.into_iter().map(Member::try_from).collect()
    }

    async fn save(&self, member: &Member) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO members (id, name, email, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                status = EXCLUDED.status
            "#,
        )
        .bind(member.id())
        .bind(member.name().as_str())
        .bind(member.email().as_str())
        .bind(member.status())
        .bind(member.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to save member", e))?;

        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: EnrollmentStatus) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE members SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Failed to update member status", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::member_not_found(id));
        }

        Ok(())
    }
}
