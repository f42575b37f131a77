use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
    validate_login_request, validate_register_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates a `participant` account. Organizers promote evaluators through `PATCH /users/{id}/role`.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Could not hash password: {e}")))?;

    let account = user::ActiveModel {
        username: Set(payload.username.trim().to_owned()),
        password: Set(password_hash),
        role: Set(role::DEFAULT_ROLE.to_owned()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            tracing::info!("Username already registered");
            AppError::UsernameTaken
        } else {
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = account.id, "Participant account created");
    Ok((StatusCode::CREATED, Json(RegisterResponse::from(account))))
}

/// Permissions granted to a role, in a stable order.
async fn role_permissions<C: ConnectionTrait>(db: &C, role: &str) -> Result<Vec<String>, AppError> {
    Ok(role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .order_by_asc(role_permission::Column::Permission)
        .all(db)
        .await?
        .into_iter()
        .map(|rp| rp.permission)
        .collect())
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in and obtain a bearer token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong username or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let Some(account) = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
    else {
        tracing::info!(reason = "unknown_user", "Login refused");
        return Err(AppError::InvalidCredentials);
    };

    let password_ok = hash::verify_password(&payload.password, &account.password)
        .map_err(|e| AppError::Internal(format!("Stored password hash unreadable: {e}")))?;
    if !password_ok {
        tracing::info!(reason = "wrong_password", user_id = account.id, "Login refused");
        return Err(AppError::InvalidCredentials);
    }

    let permissions = role_permissions(&state.db, &account.role).await?;
    let token = jwt::sign(
        account.id,
        &account.username,
        &account.role,
        permissions.clone(),
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("Could not issue token: {e}")))?;

    tracing::info!(user_id = account.id, role = %account.role, "Token issued");
    Ok(Json(LoginResponse {
        token,
        username: account.username,
        role: account.role,
        permissions,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Return the current user",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse::from(auth_user))
}
