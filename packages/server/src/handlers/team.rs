use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::TeamStatus;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{task_submission, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::team::*;
use crate::state::AppState;
use crate::utils::access::{find_problem_statement, find_team, require_team_read_access};

#[utoipa::path(
    post,
    path = "/",
    tag = "Teams",
    operation_id = "registerTeam",
    summary = "Register a team",
    description = "Registers the caller as leader of a new team under an active problem statement. Each user may lead one team. Requires `team:register` permission.",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team registered", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem statement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken or caller already leads a team (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn register_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("team:register")?;
    validate_create_team(&payload)?;

    let statement = find_problem_statement(&state.db, payload.problem_statement_id).await?;
    if !statement.is_active {
        return Err(AppError::NotFound("Problem statement not found".into()));
    }

    let name = payload.name.trim().to_string();
    let members: Vec<String> = payload
        .members
        .iter()
        .map(|m| m.trim().to_string())
        .collect();

    let txn = state.db.begin().await?;

    if team::Entity::find()
        .filter(team::Column::LeaderId.eq(auth_user.user_id))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("You have already registered a team".into()));
    }
    if team::Entity::find()
        .filter(team::Column::Name.eq(&name))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!("Team name '{name}' is already taken")));
    }

    let now = chrono::Utc::now();
    let model = team::ActiveModel {
        name: Set(name),
        members: Set(serde_json::json!(members)),
        status: Set(TeamStatus::Pending),
        leader_id: Set(auth_user.user_id),
        problem_statement_id: Set(statement.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Team registration race: unique constraint caught on insert");
            AppError::Conflict("Team name is taken or you already lead a team".into())
        }
        _ => AppError::from(e),
    })?;

    txn.commit().await?;

    tracing::info!(team_id = model.id, problem_statement_id = model.problem_statement_id, "Team registered");
    Ok((StatusCode::CREATED, Json(TeamResponse::try_from(model)?)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teams",
    operation_id = "listTeams",
    summary = "List teams",
    description = "Lists all teams, optionally filtered by problem statement and status. Requires `team:manage` permission.",
    params(TeamListQuery),
    responses(
        (status = 200, description = "Teams", body = Vec<TeamResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_teams(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TeamListQuery>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    auth_user.require_permission("team:manage")?;

    let mut select = team::Entity::find().order_by_asc(team::Column::Id);
    if let Some(problem_statement_id) = query.problem_statement_id {
        select = select.filter(team::Column::ProblemStatementId.eq(problem_statement_id));
    }
    if let Some(status) = query.status {
        select = select.filter(team::Column::Status.eq(status));
    }

    let teams = select.all(&state.db).await?;
    let data = teams
        .into_iter()
        .map(TeamResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/mine",
    tag = "Teams",
    operation_id = "getMyTeam",
    summary = "Get the team the caller leads",
    responses(
        (status = 200, description = "The caller's team", body = TeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Caller leads no team (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_my_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TeamResponse>, AppError> {
    let model = team::Entity::find()
        .filter(team::Column::LeaderId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not registered a team".into()))?;
    Ok(Json(TeamResponse::try_from(model)?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teams",
    operation_id = "getTeam",
    summary = "Get a team by ID",
    description = "Visible to the team leader, evaluators assigned to the team's problem statement and users with `team:manage`. Others get 404.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team", body = TeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeamResponse>, AppError> {
    let model = find_team(&state.db, id).await?;
    require_team_read_access(&state.db, &auth_user, &model).await?;
    Ok(Json(TeamResponse::try_from(model)?))
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "Teams",
    operation_id = "updateTeamStatus",
    summary = "Approve or reject a team",
    description = "Rejected teams drop out of ranking eligibility; rankings already submitted for them stay on file but new submissions naming them are refused. Requires `team:manage` permission.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, status = %payload.status))]
pub async fn update_team_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamStatusRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("team:manage")?;

    let existing = find_team(&state.db, id).await?;
    if existing.status == payload.status {
        return Ok(Json(TeamResponse::try_from(existing)?));
    }

    let mut active: team::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(TeamResponse::try_from(model)?))
}

#[utoipa::path(
    put,
    path = "/{id}/submission",
    tag = "Task Submissions",
    operation_id = "submitTask",
    summary = "Hand in or replace the team's project",
    description = "Only the team leader may submit, and not once the team is rejected. Re-submitting replaces the previous links and keeps the original `submitted_at`.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = TaskSubmissionRequest,
    responses(
        (status = 200, description = "Submission saved", body = TaskSubmissionResponse),
        (status = 400, description = "Validation error or team rejected (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not the leader (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn submit_task(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TaskSubmissionRequest>,
) -> Result<Json<TaskSubmissionResponse>, AppError> {
    let (repository_url, demo_url) = validate_task_submission(&payload)?;

    let existing_team = find_team(&state.db, id).await?;
    if existing_team.leader_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    if !existing_team.status.is_eligible() {
        return Err(AppError::Validation(
            "Rejected teams cannot submit work".into(),
        ));
    }

    let now = chrono::Utc::now();
    let model = task_submission::ActiveModel {
        team_id: Set(id),
        repository_url: Set(repository_url),
        demo_url: Set(demo_url),
        description: Set(payload.description),
        submitted_at: Set(now),
        updated_at: Set(now),
    };

    task_submission::Entity::insert(model)
        .on_conflict(
            OnConflict::column(task_submission::Column::TeamId)
                .update_columns([
                    task_submission::Column::RepositoryUrl,
                    task_submission::Column::DemoUrl,
                    task_submission::Column::Description,
                    task_submission::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = task_submission::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Task submission for team {id} vanished")))?;

    Ok(Json(saved.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/submission",
    tag = "Task Submissions",
    operation_id = "getTaskSubmission",
    summary = "Get the team's project hand-in",
    description = "Visible to the team leader, evaluators assigned to the team's problem statement and users with `team:manage`.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Submission", body = TaskSubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team or submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_task_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TaskSubmissionResponse>, AppError> {
    let existing_team = find_team(&state.db, id).await?;
    require_team_read_access(&state.db, &auth_user, &existing_team).await?;

    let model = task_submission::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team has not submitted yet".into()))?;

    Ok(Json(model.into()))
}
