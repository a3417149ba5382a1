use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use super::Notification;
use crate::domain::member::Member;
use crate::domain::team::Team;

/// Type of a notification, used for routing by transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TeamSplit,
    TeamMerge,
    TeamMonitoring,
    MergeFailure,
}

/// Composition events that mentors need to hear about
///
/// Each variant holds snapshots of the affected teams taken right after the
/// structural change was persisted.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A team reached five members and was split in two
    TeamSplit {
        original_team: Team,
        new_team: Team,
        /// Member whose arrival caused the split
        trigger: Member,
    },
    /// The last member of a shrinking team moved into another team
    TeamMerge {
        destination: Team,
        moved_member: Member,
    },
    /// A team is down to two members or fewer
    TeamMonitoring {
        team: Team,
        removed_member: Member,
    },
    /// A solo member could not be moved anywhere
    MergeFailure {
        team: Team,
        stranded_member: Member,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationEvent::TeamSplit { .. } => NotificationKind::TeamSplit,
            NotificationEvent::TeamMerge { .. } => NotificationKind::TeamMerge,
            NotificationEvent::TeamMonitoring { .. } => NotificationKind::TeamMonitoring,
            NotificationEvent::MergeFailure { .. } => NotificationKind::MergeFailure,
        }
    }

    /// Returns the team_id for this event
    pub fn team_id(&self) -> Uuid {
        match self {
            NotificationEvent::TeamSplit { original_team, .. } => original_team.id(),
            NotificationEvent::TeamMerge { destination, .. } => destination.id(),
            NotificationEvent::TeamMonitoring { team, .. } => team.id(),
            NotificationEvent::MergeFailure { team, .. } => team.id(),
        }
    }

    /// Returns the id of the member who triggered this event
    pub fn member_id(&self) -> Uuid {
        match self {
            NotificationEvent::TeamSplit { trigger, .. } => trigger.id(),
            NotificationEvent::TeamMerge { moved_member, .. } => moved_member.id(),
            NotificationEvent::TeamMonitoring { removed_member, .. } => removed_member.id(),
            NotificationEvent::MergeFailure {
                stranded_member, ..
            } => stranded_member.id(),
        }
    }

    pub fn subject(&self) -> String {
        match self {
            NotificationEvent::TeamSplit { original_team, .. } => {
                format!("Team {} was split", original_team.name())
            }
            NotificationEvent::TeamMerge {
                destination,
                moved_member,
            } => format!(
                "{} moved into team {}",
                moved_member.name(),
                destination.name()
            ),
            NotificationEvent::TeamMonitoring { team, .. } => {
                format!("Team {} needs monitoring", team.name())
            }
            NotificationEvent::MergeFailure { team, .. } => {
                format!("Team {} could not be merged", team.name())
            }
        }
    }

    pub fn body(&self) -> String {
        let mut body = String::new();
        // writing into a String cannot fail
        let _ = self.write_body(&mut body);
        body
    }

    fn write_body(&self, out: &mut String) -> std::fmt::Result {
        match self {
            NotificationEvent::TeamSplit {
                original_team,
                new_team,
                trigger,
            } => {
                writeln!(
                    out,
                    "{} joined team {} ({}), which then had {} members and was split.",
                    describe(trigger),
                    original_team.name(),
                    original_team.id(),
                    original_team.size() + new_team.size()
                )?;
                write_team(out, original_team)?;
                write_team(out, new_team)
            }
            NotificationEvent::TeamMerge {
                destination,
                moved_member,
            } => {
                writeln!(
                    out,
                    "{} was the last member of their team and moved to team {} ({}).",
                    describe(moved_member),
                    destination.name(),
                    destination.id()
                )?;
                write_team(out, destination)
            }
            NotificationEvent::TeamMonitoring {
                team,
                removed_member,
            } => {
                writeln!(
                    out,
                    "{} left team {} ({}), which now has {} member(s) and needs monitoring.",
                    describe(removed_member),
                    team.name(),
                    team.id(),
                    team.size()
                )?;
                write_team(out, team)
            }
            NotificationEvent::MergeFailure {
                team,
                stranded_member,
            } => {
                writeln!(
                    out,
                    "{} is the only member left in team {} ({}) and no other team has room.",
                    describe(stranded_member),
                    team.name(),
                    team.id()
                )?;
                write_team(out, team)
            }
        }
    }

    pub fn into_notification(self) -> Notification {
        Notification {
            kind: self.kind(),
            team_id: self.team_id(),
            member_id: self.member_id(),
            subject: self.subject(),
            body: self.body(),
        }
    }
}

fn describe(member: &Member) -> String {
    format!("{} ({}) <{}>", member.name(), member.id(), member.email())
}

fn write_team(out: &mut String, team: &Team) -> std::fmt::Result {
    writeln!(out, "Members of {} ({}):", team.name(), team.id())?;
    for member in team.members() {
        writeln!(out, "  - {}", describe(member))?;
    }
    Ok(())
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

    fn team(name: &str, members: Vec<Member>) -> Team {
        Team::new(TeamName::new(name).unwrap(), members).unwrap()
    }

    #[test]
    fn monitoring_body_lists_full_roster() {
        let ada = member("ada");
        let alan = member("alan");
        let gone = member("gone");
        let event = NotificationEvent::TeamMonitoring {
            team: team("Owls", vec![ada.clone(), alan.clone()]),
            removed_member: gone.clone(),
        };

        let body = event.body();

        assert!(body.contains("gone"));
        assert!(body.contains(&gone.id().to_string()));
        for m in [&ada, &alan] {
            assert!(body.contains(&format!(
                "  - {} ({}) <{}>",
                m.name(),
                m.id(),
                m.email()
            )));
        }
        assert_eq!(event.subject(), "Team Owls needs monitoring");
    }

    #[test]
    fn merge_failure_names_stranded_member() {
        let solo = member("solo");
        let owls = Team::from_persistence(
            uuid::Uuid::new_v4(),
            TeamName::new("Owls").unwrap(),
            vec![solo.clone()],
            chrono::Utc::now(),
        );
        let event = NotificationEvent::MergeFailure {
            team: owls.clone(),
            stranded_member: solo.clone(),
        };

        let notification = event.into_notification();

        assert_eq!(notification.kind, NotificationKind::MergeFailure);
        assert_eq!(notification.team_id, owls.id());
        assert_eq!(notification.member_id, solo.id());
        assert!(notification.body.contains("solo@example.com"));
    }

    #[test]
    fn split_mentions_both_teams() {
        let trigger = member("m5");
        let event = NotificationEvent::TeamSplit {
            original_team: team("Owls", vec![member("m1"), member("m2")]),
            new_team: team("OwlsSplit", vec![member("m3"), member("m4"), trigger.clone()]),
            trigger,
        };

        let body = event.body();

        assert!(body.contains("had 5 members"));
        assert!(body.contains("Members of Owls ("));
        assert!(body.contains("Members of OwlsSplit ("));
        assert_eq!(event.kind(), NotificationKind::TeamSplit);
    }

    #[test]
    fn merge_subject_names_member_and_destination() {
        let solo = member("solo");
        let event = NotificationEvent::TeamMerge {
            destination: team("Bees", vec![member("b1"), member("b2"), solo.clone()]),
            moved_member: solo,
        };

        assert_eq!(event.subject(), "solo moved into team Bees");
    }
}
