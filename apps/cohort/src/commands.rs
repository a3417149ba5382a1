//! JSON command driver
//!
//! Stands in for the queue listener: one JSON object per line in, one JSON
//! object per line out.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::application::{OrchestrationResult, TeamOrchestrationService};
use crate::domain::member::{Email, EnrollmentStatus, Member, MemberName};
use crate::domain::team::{Team, TeamName};

/// A request to the team service
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum TeamCommand {
    RegisterMember {
        name: String,
        email: String,
        #[serde(default = "default_status")]
        status: EnrollmentStatus,
    },
    CreateTeam {
        name: String,
        member_ids: Vec<Uuid>,
    },
    AddMember {
        team_id: Uuid,
        member_id: Uuid,
    },
    RemoveMember {
        team_id: Uuid,
        member_id: Uuid,
    },
    ChangeStatus {
        member_id: Uuid,
        status: EnrollmentStatus,
    },
    ReassignMember {
        member_id: Uuid,
    },
}

fn default_status() -> EnrollmentStatus {
    EnrollmentStatus::Active
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: EnrollmentStatus,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id(),
            name: member.name().to_string(),
            email: member.email().to_string(),
            status: member.status(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<MemberResponse>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().to_string(),
            members: team.members().iter().map(MemberResponse::from).collect(),
        }
    }
}

/// Outcome of one command
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResponse {
    Member(MemberResponse),
    Team(TeamResponse),
    StatusChanged {
        member_id: Uuid,
        previous: EnrollmentStatus,
        current: EnrollmentStatus,
        team: Option<TeamResponse>,
    },
    Error {
        message: String,
        /// Changes were saved; only the notification was lost
        notification_failure: bool,
    },
}

/// Runs one command against the orchestration service
pub async fn dispatch(
    service: &TeamOrchestrationService,
    command: TeamCommand,
) -> OrchestrationResult<CommandResponse> {
    let response = match command {
        TeamCommand::RegisterMember {
            name,
            email,
            status,
        } => {
            let member = service
                .register_member(MemberName::new(name)?, Email::new(email)?, status)
                .await?;
            CommandResponse::Member(MemberResponse::from(&member))
        }
        TeamCommand::CreateTeam { name, member_ids } => {
            let team = service.create_team(TeamName::new(name)?, &member_ids).await?;
            CommandResponse::Team(TeamResponse::from(&team))
        }
        TeamCommand::AddMember { team_id, member_id } => {
            let team = service.add_member(team_id, member_id).await?;
            CommandResponse::Team(TeamResponse::from(&team))
        }
        TeamCommand::RemoveMember { team_id, member_id } => {
            let team = service.remove_member(team_id, member_id).await?;
            CommandResponse::Team(TeamResponse::from(&team))
        }
        TeamCommand::ChangeStatus { member_id, status } => {
            let change = service.change_member_status(member_id, status).await?;
            CommandResponse::StatusChanged {
                member_id: change.member_id,
                previous: change.previous,
                current: change.current,
                team: change.team.as_ref().map(TeamResponse::from),
            }
        }
        TeamCommand::ReassignMember { member_id } => {
            let team = service.reassign_member(member_id).await?;
            CommandResponse::Team(TeamResponse::from(&team))
        }
    };

    Ok(response)
}

/// Parses, runs and answers a single input line
pub async fn handle_line(service: &TeamOrchestrationService, line: &str) -> String {
    let response = match serde_json::from_str::<TeamCommand>(line) {
        Ok(command) => match dispatch(service, command).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "command failed");
                CommandResponse::Error {
                    message: err.to_string(),
                    notification_failure: err.is_notification_failure(),
                }
            }
        },
        Err(err) => CommandResponse::Error {
            message: format!("Invalid command: {}", err),
            notification_failure: false,
        },
    };

    serde_json::to_string(&response).unwrap_or_else(|err| {
        format!(
            r#"{{"result":"error","message":"Failed to encode response: {}","notification_failure":false}}"#,
            err
        )
    })
}
