use async_trait::async_trait;
use uuid::Uuid;

use super::roster_changes::RosterChangeSet;
use crate::domain::errors::RepositoryResult;
use crate::domain::team::Team;

/// Repository trait for Team aggregate
///
/// Defines the contract for persisting and retrieving teams.
/// Implementations should handle database-specific details.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Find a team by its ID, failing with `NotFound` if it does not exist
    async fn get(&self, id: Uuid) -> RepositoryResult<Team>;

    /// Every team, oldest first
    async fn get_all(&self) -> RepositoryResult<Vec<Team>>;

    /// The team currently holding a member, if any
    async fn find_by_member(&self, member_id: Uuid) -> RepositoryResult<Option<Team>>;

    /// Insert a team together with its members
    ///
    /// Fails with `NameCollision` when another team already uses the name;
    /// creating an existing id again updates it.
    async fn create(&self, team: &Team) -> RepositoryResult<()>;

    /// Delete a team and its memberships
    async fn delete(&self, team: &Team) -> RepositoryResult<()>;

    /// Append a member to the end of a team
    async fn add_member(&self, team_id: Uuid, member_id: Uuid) -> RepositoryResult<()>;

    /// Remove a member from a team
    async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> RepositoryResult<()>;

    /// Apply a use case's writes atomically
    ///
    /// Checks every expectation first, then applies the changes in order.
    /// Nothing is written if any check or change fails. Enrollment status
    /// updates travel in the same set so a member's status and team always
    /// change together.
    async fn commit(&self, changes: &RosterChangeSet) -> RepositoryResult<()>;
}
