use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::{DomainError, DomainResult};

/// Maximum number of characters in a member name
pub const MEMBER_NAME_MAX_LEN: usize = 30;

/// Enrollment status of a member in the mentoring program
///
/// # Status Transitions
/// ```text
/// Active <---> OnLeave
///   |  ^         |
///   v  |         v
///  Withdrawn <---'
/// ```
/// Withdrawn members can only come back as Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Member is participating and may belong to a team
    Active,
    /// Member paused the program
    OnLeave,
    /// Member left the program
    Withdrawn,
}

impl EnrollmentStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Active -> OnLeave
    /// - Active -> Withdrawn
    /// - OnLeave -> Active
    /// - OnLeave -> Withdrawn
    /// - Withdrawn -> Active
    ///
    /// # Example
    /// ```
    /// use cohort_teams::domain::member::EnrollmentStatus;
    ///
    /// assert!(EnrollmentStatus::Active.can_transition_to(EnrollmentStatus::Withdrawn));
    /// assert!(!EnrollmentStatus::Withdrawn.can_transition_to(EnrollmentStatus::OnLeave));
    /// ```
    pub fn can_transition_to(&self, next: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        matches!(
            (self, next),
            (Active, OnLeave)
                | (Active, Withdrawn)
                | (OnLeave, Active)
                | (OnLeave, Withdrawn)
                | (Withdrawn, Active)
        )
    }

    /// Only active members may join or remain on a team
    pub fn is_active(&self) -> bool {
        matches!(self, EnrollmentStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::OnLeave => "on_leave",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "on_leave" => Ok(EnrollmentStatus::OnLeave),
            "withdrawn" => Ok(EnrollmentStatus::Withdrawn),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Display name of a member
///
/// # Invariants
/// - Not empty once surrounding whitespace is trimmed
/// - At most 30 characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberName(String);

impl MemberName {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidMemberName(
                "name cannot be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MEMBER_NAME_MAX_LEN {
            return Err(DomainError::InvalidMemberName(format!(
                "'{}' is longer than {} characters",
                trimmed, MEMBER_NAME_MAX_LEN
            )));
        }
        Ok(MemberName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MemberName::new(value)
    }
}

impl From<MemberName> for String {
    fn from(name: MemberName) -> Self {
        name.0
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email value object representing a valid email address
///
/// # Invariants
/// - Exactly one '@' character
/// - Non-empty local part and domain
/// - No whitespace
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use cohort_teams::domain::member::Email;
    ///
    /// let email = Email::new("mentee@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "mentee@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> DomainResult<Self> {
        let email = email.into();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(DomainError::InvalidEmail(email))
        }
    }

    fn is_valid(email: &str) -> bool {
        if email.chars().any(char::is_whitespace) {
            return false;
        }
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use EnrollmentStatus::*;
        assert!(Active.can_transition_to(OnLeave));
        assert!(Active.can_transition_to(Withdrawn));
        assert!(OnLeave.can_transition_to(Active));
        assert!(OnLeave.can_transition_to(Withdrawn));
        assert!(Withdrawn.can_transition_to(Active));
    }

    #[test]
    fn invalid_transition_withdrawn_to_on_leave() {
        assert!(!EnrollmentStatus::Withdrawn.can_transition_to(EnrollmentStatus::OnLeave));
    }

    #[test]
    fn self_transitions_are_denied() {
        for status in [
            EnrollmentStatus::Active,
            EnrollmentStatus::OnLeave,
            EnrollmentStatus::Withdrawn,
        ] {
            assert!(!status.can_transition_to(status), "{} -> {}", status, status);
        }
    }

    #[test]
    fn status_display_and_parse() {
        assert_eq!(EnrollmentStatus::OnLeave.to_string(), "on_leave");
        assert_eq!(
            "withdrawn".parse::<EnrollmentStatus>().unwrap(),
            EnrollmentStatus::Withdrawn
        );
        assert!("retired".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn status_serde_uses_snake_case() {
        let json = serde_json::to_string(&EnrollmentStatus::OnLeave).unwrap();
        assert_eq!(json, "\"on_leave\"");
    }

    #[test]
    fn member_name_is_trimmed() {
        let name = MemberName::new("  Ada Lovelace ").unwrap();
        assert_eq!(name.as_str(), "Ada Lovelace");
    }

    #[test]
    fn empty_member_name_fails() {
        assert!(MemberName::new("   ").is_err());
    }

    #[test]
    fn member_name_length_limit() {
        assert!(MemberName::new("a".repeat(30)).is_ok());
        assert!(MemberName::new("a".repeat(31)).is_err());
    }

    #[test]
    fn valid_email() {
        assert!(Email::new("test@example.com").is_ok());
        assert!(Email::new("a@b").is_ok());
    }

    #[test]
    fn invalid_emails() {
        assert!(Email::new("").is_err());
        assert!(Email::new("invalid").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("a@b@c").is_err());
        assert!(Email::new("a b@c.com").is_err());
    }

    #[test]
    fn email_deserialization_validates() {
        let result: Result<Email, _> = serde_json::from_str("\"not-an-email\"");
        assert!(result.is_err());
    }
}
