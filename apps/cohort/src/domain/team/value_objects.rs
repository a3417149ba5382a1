use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Smallest team allowed at construction
pub const MIN_TEAM_SIZE: usize = 2;
/// Largest team allowed at construction
pub const MAX_TEAM_SIZE: usize = 4;
/// Size at which a team must be split
pub const SPLIT_THRESHOLD: usize = 5;
/// Maximum number of characters in a team name
pub const TEAM_NAME_MAX_LEN: usize = 20;

const SPLIT_SUFFIX: &str = "Split";

/// Name of a team
///
/// # Invariants
/// - Not empty
/// - Letters only
/// - At most 20 characters
///
/// Uniqueness across teams is enforced by the repository, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// # Example
    /// ```
    /// use cohort_teams::domain::team::TeamName;
    ///
    /// assert!(TeamName::new("Falcons").is_ok());
    /// assert!(TeamName::new("Team 7").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::InvalidTeamName(
                "name cannot be empty".to_string(),
            ));
        }
        if !name.chars().all(char::is_alphabetic) {
            return Err(DomainError::InvalidTeamName(format!(
                "'{}' must contain letters only",
                name
            )));
        }
        if name.chars().count() > TEAM_NAME_MAX_LEN {
            return Err(DomainError::InvalidTeamName(format!(
                "'{}' is longer than {} characters",
                name, TEAM_NAME_MAX_LEN
            )));
        }
        Ok(TeamName(name))
    }

    /// Name given to the team created when this team splits
    ///
    /// Fails rather than truncating when the suffixed name breaks the length rule.
    pub fn split_name(&self) -> DomainResult<TeamName> {
        TeamName::new(format!("{}{}", self.0, SPLIT_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TeamName::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_only() {
        assert!(TeamName::new("Owls").is_ok());
        assert!(TeamName::new("Équipe").is_ok());
        assert!(TeamName::new("Owls2").is_err());
        assert!(TeamName::new("Night Owls").is_err());
        assert!(TeamName::new("").is_err());
    }

    #[test]
    fn length_limit() {
        assert!(TeamName::new("a".repeat(20)).is_ok());
        assert!(TeamName::new("a".repeat(21)).is_err());
    }

    #[test]
    fn split_name_appends_suffix() {
        let name = TeamName::new("Owls").unwrap();
        assert_eq!(name.split_name().unwrap().as_str(), "OwlsSplit");
    }

    #[test]
    fn split_name_rejected_when_too_long() {
        let name = TeamName::new("Supercalifragilistic").unwrap();
        let err = name.split_name().unwrap_err();
        assert!(matches!(err, DomainError::InvalidTeamName(_)));
    }
}
