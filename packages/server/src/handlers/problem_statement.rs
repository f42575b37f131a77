use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::role::{ADMIN_ROLE, EVALUATOR_ROLE};
use crate::entity::{evaluator_assignment, problem_statement, task_submission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::problem_statement::*;
use crate::models::team::{ReviewableTeamResponse, TaskSubmissionResponse, TeamResponse};
use crate::state::AppState;
use crate::utils::access::{
    eligible_teams, find_problem_statement, require_problem_statement_review_access,
};

#[utoipa::path(
    post,
    path = "/",
    tag = "Problem Statements",
    operation_id = "createProblemStatement",
    summary = "Create a problem statement",
    description = "Creates a challenge topic teams can register against. Requires `problem_statement:manage` permission.",
    request_body = CreateProblemStatementRequest,
    responses(
        (status = 201, description = "Problem statement created", body = ProblemStatementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_problem_statement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProblemStatementRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("problem_statement:manage")?;
    validate_create_problem_statement(&payload)?;

    let now = chrono::Utc::now();
    let model = problem_statement::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProblemStatementResponse::from(model)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Problem Statements",
    operation_id = "listProblemStatements",
    summary = "List problem statements",
    description = "Users with `problem_statement:manage` see every statement; everyone else sees active ones only.",
    responses(
        (status = 200, description = "Problem statements", body = Vec<ProblemStatementResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_problem_statements(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProblemStatementResponse>>, AppError> {
    let mut select = problem_statement::Entity::find().order_by_asc(problem_statement::Column::Id);
    if !auth_user.has_permission("problem_statement:manage") {
        select = select.filter(problem_statement::Column::IsActive.eq(true));
    }

    let models = select.all(&state.db).await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Problem Statements",
    operation_id = "getProblemStatement",
    summary = "Get a problem statement by ID",
    description = "Inactive statements are only visible to managers and answer 404 for everyone else.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    responses(
        (status = 200, description = "Problem statement", body = ProblemStatementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_problem_statement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProblemStatementResponse>, AppError> {
    let model = find_problem_statement(&state.db, id).await?;
    if !model.is_active && !auth_user.has_permission("problem_statement:manage") {
        return Err(AppError::NotFound("Problem statement not found".into()));
    }
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Problem Statements",
    operation_id = "updateProblemStatement",
    summary = "Update a problem statement",
    description = "Partial update. An empty payload returns the current resource unchanged. Requires `problem_statement:manage` permission.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    request_body = UpdateProblemStatementRequest,
    responses(
        (status = 200, description = "Problem statement updated", body = ProblemStatementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_problem_statement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProblemStatementRequest>,
) -> Result<Json<ProblemStatementResponse>, AppError> {
    auth_user.require_permission("problem_statement:manage")?;
    validate_update_problem_statement(&payload)?;

    let existing = find_problem_statement(&state.db, id).await?;
    if payload == UpdateProblemStatementRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: problem_statement::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/evaluators",
    tag = "Evaluators",
    operation_id = "assignEvaluator",
    summary = "Assign an evaluator to a problem statement",
    description = "The target user must hold the `evaluator` or `admin` role. Requires `evaluator:assign` permission.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    request_body = AssignEvaluatorRequest,
    responses(
        (status = 201, description = "Evaluator assigned", body = EvaluatorAssignmentResponse),
        (status = 400, description = "User cannot evaluate (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem statement or user not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already assigned (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = payload.user_id))]
pub async fn assign_evaluator(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AssignEvaluatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("evaluator:assign")?;

    find_problem_statement(&state.db, id).await?;
    let evaluator = user::Entity::find_by_id(payload.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if evaluator.role != EVALUATOR_ROLE && evaluator.role != ADMIN_ROLE {
        return Err(AppError::Validation(
            "Only users with the evaluator or admin role can be assigned".into(),
        ));
    }

    let model = evaluator_assignment::ActiveModel {
        problem_statement_id: Set(id),
        evaluator_id: Set(evaluator.id),
        assigned_at: Set(chrono::Utc::now()),
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
            "Evaluator is already assigned to this problem statement".into(),
        ),
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(EvaluatorAssignmentResponse {
            problem_statement_id: model.problem_statement_id,
            evaluator_id: model.evaluator_id,
            username: evaluator.username,
            assigned_at: model.assigned_at,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/evaluators",
    tag = "Evaluators",
    operation_id = "listEvaluators",
    summary = "List evaluators assigned to a problem statement",
    description = "Requires `evaluator:assign` permission.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    responses(
        (status = 200, description = "Assigned evaluators", body = Vec<EvaluatorAssignmentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem statement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_evaluators(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<EvaluatorAssignmentResponse>>, AppError> {
    auth_user.require_permission("evaluator:assign")?;
    find_problem_statement(&state.db, id).await?;

    let assignments = evaluator_assignment::Entity::find()
        .filter(evaluator_assignment::Column::ProblemStatementId.eq(id))
        .order_by_asc(evaluator_assignment::Column::AssignedAt)
        .all(&state.db)
        .await?;

    let usernames = usernames_by_id(
        &state.db,
        assignments.iter().map(|a| a.evaluator_id).collect(),
    )
    .await?;

    let data = assignments
        .into_iter()
        .map(|a| EvaluatorAssignmentResponse {
            problem_statement_id: a.problem_statement_id,
            username: usernames.get(&a.evaluator_id).cloned().unwrap_or_default(),
            evaluator_id: a.evaluator_id,
            assigned_at: a.assigned_at,
        })
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    delete,
    path = "/{id}/evaluators/{user_id}",
    tag = "Evaluators",
    operation_id = "removeEvaluator",
    summary = "Unassign an evaluator",
    description = "Removes the assignment. Rankings the evaluator already submitted are kept. Requires `evaluator:assign` permission.",
    params(
        ("id" = i32, Path, description = "Problem statement ID"),
        ("user_id" = i32, Path, description = "Evaluator user ID"),
    ),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id))]
pub async fn remove_evaluator(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("evaluator:assign")?;

    let result = evaluator_assignment::Entity::delete_by_id((id, user_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Evaluator assignment not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/teams",
    tag = "Evaluators",
    operation_id = "listReviewableTeams",
    summary = "List the teams eligible for ranking",
    description = "Returns every non-rejected team under the problem statement with its task submission. Available to evaluators assigned to the statement and to users with `team:manage`.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    responses(
        (status = 200, description = "Eligible teams", body = Vec<ReviewableTeamResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not assigned (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem statement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_reviewable_teams(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ReviewableTeamResponse>>, AppError> {
    find_problem_statement(&state.db, id).await?;
    require_problem_statement_review_access(&state.db, &auth_user, id).await?;

    let teams = eligible_teams(&state.db, id).await?;
    let mut submissions: HashMap<i32, task_submission::Model> = task_submission::Entity::find()
        .filter(task_submission::Column::TeamId.is_in(teams.iter().map(|t| t.id)))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.team_id, s))
        .collect();

    let data = teams
        .into_iter()
        .map(|t| {
            let submission = submissions.remove(&t.id).map(TaskSubmissionResponse::from);
            let team = TeamResponse::try_from(t)?;
            Ok(ReviewableTeamResponse {
                id: team.id,
                name: team.name,
                members: team.members,
                status: team.status,
                submission,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(data))
}

/// Map user IDs to usernames in one query.
pub(crate) async fn usernames_by_id<C: ConnectionTrait>(
    db: &C,
    ids: Vec<i32>,
) -> Result<HashMap<i32, String>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}
