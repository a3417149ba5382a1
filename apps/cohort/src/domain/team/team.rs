use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{TeamName, MAX_TEAM_SIZE, MIN_TEAM_SIZE, SPLIT_THRESHOLD};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::member::Member;

/// Team aggregate root
///
/// A small group of learners working together with a mentor. The team owns
/// its ordered member list; order decides which members move when the team
/// splits.
///
/// # Invariants
/// - Size is within [2, 4] at construction
/// - Every member is active at the time they join
/// - A member appears at most once (by id)
///
/// After `add_member` or `delete_member` the size may briefly leave [2, 4];
/// `needs_splitting`, `needs_monitoring` and `needs_redistribution` tell the
/// caller which corrective action belongs to the same operation.
///
/// # Example
/// ```
/// use cohort_teams::domain::member::{Email, EnrollmentStatus, Member, MemberName};
/// use cohort_teams::domain::team::{Team, TeamName};
///
/// let member = |name: &str| {
///     Member::new(
///         MemberName::new(name).unwrap(),
///         Email::new(format!("{}@example.com", name)).unwrap(),
///         EnrollmentStatus::Active,
///     )
/// };
///
/// let team = Team::new(TeamName::new("Owls").unwrap(), vec![member("ada"), member("alan")])
///     .expect("valid team");
///
/// assert_eq!(team.size(), 2);
/// assert!(team.needs_monitoring());
/// assert!(team.can_accept_new_member());
/// ```
#[derive(Debug, Clone)]
pub struct Team {
    id: Uuid,
    name: TeamName,
    members: Vec<Member>,
    created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new Team aggregate
    ///
    /// # Business Rules Enforced
    /// - Between 2 and 4 members
    /// - All members are active
    /// - No member is listed twice
    pub fn new(name: TeamName, members: Vec<Member>) -> DomainResult<Self> {
        if members.len() < MIN_TEAM_SIZE || members.len() > MAX_TEAM_SIZE {
            return Err(DomainError::InvalidTeamSize(members.len()));
        }

        for (index, member) in members.iter().enumerate() {
            if !member.can_join() {
                return Err(DomainError::IneligibleMember(member.id()));
            }
            if members[..index].iter().any(|m| m.id() == member.id()) {
                return Err(DomainError::DuplicateMember(member.id()));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            members,
            created_at: Utc::now(),
        })
    }

    /// Appends a member at the end of the ordered list
    pub fn add_member(&mut self, member: Member) -> DomainResult<()> {
        self.check_can_add(&member)?;
        self.members.push(member);
        Ok(())
    }

    /// Removes a member, keeping the relative order of the others
    pub fn delete_member(&mut self, member_id: Uuid) -> DomainResult<Member> {
        let position = self
            .members
            .iter()
            .position(|m| m.id() == member_id)
            .ok_or(DomainError::MemberNotInTeam {
                team_id: self.id,
                member_id,
            })?;

        Ok(self.members.remove(position))
    }

    /// Splits an oversized team
    ///
    /// The first `size / 2` members stay; the rest form a new team named
    /// after this one with a `Split` suffix. Returns `None` when no split is
    /// needed. Nothing changes if the new team cannot be built.
    pub fn split(&mut self) -> DomainResult<Option<Team>> {
        if !self.needs_splitting() {
            return Ok(None);
        }

        let half = self.members.len() / 2;
        let new_team = Team::new(self.name.split_name()?, self.members[half..].to_vec())?;
        self.members.truncate(half);

        Ok(Some(new_team))
    }

    /// Moves every member of `source` into this team
    ///
    /// `source` is left empty and should be deleted by the caller. Either all
    /// members move or none do.
    pub fn absorb(&mut self, source: &mut Team) -> DomainResult<Vec<Member>> {
        for member in &source.members {
            self.check_can_add(member)?;
        }

        let moved = std::mem::take(&mut source.members);
        self.members.extend(moved.iter().cloned());
        Ok(moved)
    }

    fn check_can_add(&self, member: &Member) -> DomainResult<()> {
        if !member.can_join() {
            return Err(DomainError::IneligibleMember(member.id()));
        }
        if self.contains(member.id()) {
            return Err(DomainError::DuplicateMember(member.id()));
        }
        Ok(())
    }

    // ===== Size predicates =====

    /// Team has grown past the maximum and must be split
    pub fn needs_splitting(&self) -> bool {
        self.members.len() >= SPLIT_THRESHOLD
    }

    /// Team is small enough that a mentor should keep an eye on it
    pub fn needs_monitoring(&self) -> bool {
        self.members.len() <= MIN_TEAM_SIZE
    }

    /// Team is down to a single member who must move elsewhere
    pub fn needs_redistribution(&self) -> bool {
        self.members.len() == 1
    }

    /// Eligibility filter for merges and re-assignments
    ///
    /// An empty team is a shell awaiting deletion and takes nobody.
    pub fn can_accept_new_member(&self) -> bool {
        !self.is_empty() && self.members.len() < MAX_TEAM_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &TeamName {
        &self.name
    }

    /// Read-only view of the ordered member list
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, member_id: Uuid) -> bool {
        self.members.iter().any(|m| m.id() == member_id)
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(Member::id).collect()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Bypasses the size rules since stored teams may legitimately sit
    /// outside [2, 4] between a mutation and its corrective action.
    ///
    /// # Note
    /// Only to be used by repository implementations for data reconstruction.
    pub fn from_persistence(
        id: Uuid,
        name: TeamName,
        members: Vec<Member>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            members,
            created_at,
        }
    }
}
