use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::RepositoryResult;
use crate::domain::member::{EnrollmentStatus, Member};

/// Repository trait for Member entities
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find a member by ID, failing with `NotFound` if it does not exist
    async fn get(&self, id: Uuid) -> RepositoryResult<Member>;

    async fn get_all(&self) -> RepositoryResult<Vec<Member>>;

    /// Save a member (insert or update)
    async fn save(&self, member: &Member) -> RepositoryResult<()>;

    async fn update_status(&self, id: Uuid, status: EnrollmentStatus) -> RepositoryResult<()>;
}
