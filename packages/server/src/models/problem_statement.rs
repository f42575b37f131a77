use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_text, validate_title};
use crate::error::AppError;

const MAX_DESCRIPTION_BYTES: usize = 1_000_000;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProblemStatementRequest {
    #[schema(example = "Accessible public transit")]
    pub title: String,
    /// Markdown body, at most 1MB.
    #[schema(example = "## Challenge\nHelp riders with visual impairments...")]
    pub description: String,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProblemStatementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemStatementResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Accessible public transit")]
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::problem_statement::Model> for ProblemStatementResponse {
    fn from(m: crate::entity::problem_statement::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Request body for assigning an evaluator.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AssignEvaluatorRequest {
    #[schema(example = 5)]
    pub user_id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EvaluatorAssignmentResponse {
    pub problem_statement_id: i32,
    pub evaluator_id: i32,
    #[schema(example = "judge_judy")]
    pub username: String,
    pub assigned_at: DateTime<Utc>,
}

pub fn validate_create_problem_statement(
    req: &CreateProblemStatementRequest,
) -> Result<(), AppError> {
    validate_title(&req.title)?;
    validate_text(&req.description, "Description", MAX_DESCRIPTION_BYTES)
}

pub fn validate_update_problem_statement(
    req: &UpdateProblemStatementRequest,
) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref description) = req.description {
        validate_text(description, "Description", MAX_DESCRIPTION_BYTES)?;
    }
    Ok(())
}
