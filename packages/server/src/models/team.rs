use chrono::{DateTime, Utc};
use common::TeamStatus;
use serde::{Deserialize, Serialize};

use super::shared::{validate_name, validate_text};
use crate::entity::{task_submission, team};
use crate::error::AppError;
use crate::utils::link::validate_web_link;

pub const MAX_TEAM_MEMBERS: usize = 10;
const MAX_NAME_CHARS: usize = 128;
const MAX_SUBMISSION_DESCRIPTION_BYTES: usize = 10_000;

/// Request body for registering a team.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    /// Unique team name (1-128 characters).
    #[schema(example = "Null Pointers")]
    pub name: String,
    #[schema(example = 1)]
    pub problem_statement_id: i32,
    /// Display names of the other members, leader excluded.
    #[serde(default)]
    #[schema(example = json!(["Ada", "Grace"]))]
    pub members: Vec<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct TeamListQuery {
    /// Filter by problem statement.
    pub problem_statement_id: Option<i32>,
    /// Filter by review status.
    pub status: Option<TeamStatus>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateTeamStatusRequest {
    pub status: TeamStatus,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Null Pointers")]
    pub name: String,
    pub members: Vec<String>,
    pub status: TeamStatus,
    pub leader_id: i32,
    pub problem_statement_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<team::Model> for TeamResponse {
    type Error = AppError;

    fn try_from(m: team::Model) -> Result<Self, Self::Error> {
        let members: Vec<String> = serde_json::from_value(m.members)
            .map_err(|e| AppError::Internal(format!("Corrupt members for team {}: {e}", m.id)))?;
        Ok(Self {
            id: m.id,
            name: m.name,
            members,
            status: m.status,
            leader_id: m.leader_id,
            problem_statement_id: m.problem_statement_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// Request body for handing in a team's project.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TaskSubmissionRequest {
    #[schema(example = "https://github.com/null-pointers/transit-helper")]
    pub repository_url: String,
    #[schema(example = "https://youtu.be/demo")]
    pub demo_url: Option<String>,
    #[schema(example = "A voice-first trip planner.")]
    pub description: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TaskSubmissionResponse {
    pub team_id: i32,
    pub repository_url: String,
    pub demo_url: Option<String>,
    pub description: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<task_submission::Model> for TaskSubmissionResponse {
    fn from(m: task_submission::Model) -> Self {
        Self {
            team_id: m.team_id,
            repository_url: m.repository_url,
            demo_url: m.demo_url,
            description: m.description,
            submitted_at: m.submitted_at,
            updated_at: m.updated_at,
        }
    }
}

/// A team as shown to an evaluator preparing a ranking.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewableTeamResponse {
    pub id: i32,
    pub name: String,
    pub members: Vec<String>,
    pub status: TeamStatus,
    /// Null when the team has not handed anything in yet.
    pub submission: Option<TaskSubmissionResponse>,
}

pub fn validate_create_team(req: &CreateTeamRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Team name", MAX_NAME_CHARS)?;
    if req.members.len() > MAX_TEAM_MEMBERS {
        return Err(AppError::Validation(format!(
            "A team may list at most {MAX_TEAM_MEMBERS} members"
        )));
    }
    for member in &req.members {
        validate_name(member, "Member name", MAX_NAME_CHARS)?;
    }
    Ok(())
}

/// Validate a task submission and return the normalized links.
pub fn validate_task_submission(
    req: &TaskSubmissionRequest,
) -> Result<(String, Option<String>), AppError> {
    let repository_url = validate_web_link(&req.repository_url)
        .map_err(|e| AppError::Validation(e.message("repository_url")))?
        .to_string();
    let demo_url = match req.demo_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Some(
            validate_web_link(url)
                .map_err(|e| AppError::Validation(e.message("demo_url")))?
                .to_string(),
        ),
        _ => None,
    };
    validate_text(
        &req.description,
        "Description",
        MAX_SUBMISSION_DESCRIPTION_BYTES,
    )?;
    Ok((repository_url, demo_url))
}
