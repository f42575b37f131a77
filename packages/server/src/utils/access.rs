use common::TeamStatus;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::{evaluator_assignment, problem_statement, team};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Look up a problem statement by ID, returning 404 if not found.
pub async fn find_problem_statement<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<problem_statement::Model, AppError> {
    problem_statement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem statement not found".into()))
}

/// Look up a team by ID, returning 404 if not found.
pub async fn find_team<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

pub async fn is_assigned<C: sea_orm::ConnectionTrait>(
    db: &C,
    problem_statement_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    Ok(
        evaluator_assignment::Entity::find_by_id((problem_statement_id, user_id))
            .one(db)
            .await?
            .is_some(),
    )
}

/// Require the caller to be an evaluator assigned to the problem statement.
pub async fn require_assignment<C: sea_orm::ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    problem_statement_id: i32,
) -> Result<(), AppError> {
    if is_assigned(db, problem_statement_id, auth_user.user_id).await? {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Managers and assigned evaluators may see the teams under a problem statement.
pub async fn require_problem_statement_review_access<C: sea_orm::ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    problem_statement_id: i32,
) -> Result<(), AppError> {
    if auth_user.has_permission("team:manage") {
        return Ok(());
    }
    require_assignment(db, auth_user, problem_statement_id).await
}

/// Verify the caller can read a team and its submission.
/// Returns 404 (not 403) so team IDs cannot be enumerated.
pub async fn require_team_read_access<C: sea_orm::ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    team: &team::Model,
) -> Result<(), AppError> {
    if auth_user.has_permission("team:manage") || team.leader_id == auth_user.user_id {
        return Ok(());
    }
    if auth_user.has_permission("evaluation:submit")
        && is_assigned(db, team.problem_statement_id, auth_user.user_id).await?
    {
        return Ok(());
    }
    Err(AppError::NotFound("Team not found".into()))
}

/// Teams that may be ranked under a problem statement: every team registered
/// against it that has not been rejected, in registration order.
pub async fn eligible_teams<C: sea_orm::ConnectionTrait>(
    db: &C,
    problem_statement_id: i32,
) -> Result<Vec<team::Model>, AppError> {
    Ok(team::Entity::find()
        .filter(team::Column::ProblemStatementId.eq(problem_statement_id))
        .filter(team::Column::Status.ne(TeamStatus::Rejected))
        .order_by_asc(team::Column::Id)
        .all(db)
        .await?)
}
