use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::*;
use serde::Deserialize;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{UpdateRoleRequest, UserResponse, validate_update_role};
use crate::state::AppState;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    /// Only return users holding this role.
    #[param(example = "evaluator")]
    pub role: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List user accounts",
    description = "Lists accounts ordered by ID, optionally filtered by role. Requires `user:manage` permission.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require_permission("user:manage")?;

    let mut select = user::Entity::find().order_by_asc(user::Column::Id);
    if let Some(ref role) = query.role {
        select = select.filter(user::Column::Role.eq(role.as_str()));
    }

    let users = select.all(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/{id}/role",
    tag = "Users",
    operation_id = "updateUserRole",
    summary = "Change a user's role",
    description = "Grants `admin`, `evaluator` or `participant`. Takes effect at the user's next login. Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, role = %payload.role))]
pub async fn update_user_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_permission("user:manage")?;
    validate_update_role(&payload)?;

    let existing = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if existing.role == payload.role {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    active.role = Set(payload.role);
    let model = active.update(&state.db).await?;

    tracing::info!(user_id = id, role = %model.role, "User role changed");
    Ok(Json(model.into()))
}
