use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, State};
use common::consensus::{EvaluatorRanking, compute_consensus, count_overview_conflicts};
use common::ranking::validate_rankings;
use common::{EvaluationStats, RankedTeam, TeamStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use super::problem_statement::usernames_by_id;
use crate::entity::evaluation::StoredRanking;
use crate::entity::{evaluation, evaluator_assignment, problem_statement, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::evaluation::*;
use crate::models::problem_statement::ProblemStatementResponse;
use crate::state::AppState;
use crate::utils::access::{eligible_teams, find_problem_statement, require_assignment};

fn to_evaluator_ranking(m: &evaluation::Model) -> Result<EvaluatorRanking, AppError> {
    let rankings = stored_rankings(m)?
        .into_iter()
        .map(|r| RankedTeam {
            team_id: r.team_id,
            rank: r.rank,
            score: r.score,
            comments: r.comments,
        })
        .collect();
    Ok(EvaluatorRanking {
        evaluator_id: m.evaluator_id,
        rankings,
    })
}

#[utoipa::path(
    put,
    path = "/{id}/evaluation",
    tag = "Evaluations",
    operation_id = "submitRankings",
    summary = "Submit or replace the caller's rankings",
    description = "Validates the ranking set and stores it as the caller's single evaluation for this problem statement, replacing any earlier one. \
        Ranks must run `1..=N` without gaps; every team must be registered under the problem statement and not rejected. \
        Nothing is stored when validation fails. Requires `evaluation:submit` permission and an assignment to the problem statement.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    request_body = SubmitRankingsRequest,
    responses(
        (status = 200, description = "Rankings stored", body = EvaluationResponse),
        (status = 400, description = "Rankings missing, not sequential or naming invalid teams (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not assigned to this problem statement, or no such problem statement (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, evaluator_id = auth_user.user_id, is_finalized = payload.is_finalized))]
pub async fn submit_rankings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SubmitRankingsRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    auth_user.require_permission("evaluation:submit")?;
    // Assignment implies the problem statement exists, so unknown ids get 403 too.
    require_assignment(&state.db, &auth_user, id).await?;

    let proposed = payload.rankings()?;
    let eligible: HashSet<i32> = eligible_teams(&state.db, id)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let ranked = validate_rankings(&proposed, &eligible)?;

    let now = chrono::Utc::now();
    let stored: Vec<StoredRanking> = ranked
        .into_iter()
        .map(|r| StoredRanking {
            team_id: r.team_id,
            rank: r.rank,
            score: r.score,
            comments: r.comments,
            evaluated_at: now,
        })
        .collect();
    let rankings = serde_json::to_value(&stored)
        .map_err(|e| AppError::Internal(format!("Failed to encode rankings: {e}")))?;
    let submitted_at = payload.is_finalized.then_some(now);

    let model = evaluation::ActiveModel {
        problem_statement_id: Set(id),
        evaluator_id: Set(auth_user.user_id),
        rankings: Set(rankings),
        is_finalized: Set(payload.is_finalized),
        submitted_at: Set(submitted_at),
        created_at: Set(now),
        updated_at: Set(now),
    };

    evaluation::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                evaluation::Column::ProblemStatementId,
                evaluation::Column::EvaluatorId,
            ])
            .update_columns([
                evaluation::Column::Rankings,
                evaluation::Column::IsFinalized,
                evaluation::Column::SubmittedAt,
                evaluation::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = evaluation::Entity::find_by_id((id, auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Evaluation ({id}, {}) vanished", auth_user.user_id)))?;

    tracing::info!(teams = stored.len(), "Rankings stored");
    Ok(Json(EvaluationResponse::try_from(saved)?))
}

#[utoipa::path(
    get,
    path = "/{id}/evaluation",
    tag = "Evaluations",
    operation_id = "getMyEvaluation",
    summary = "Get the caller's rankings",
    params(("id" = i32, Path, description = "Problem statement ID")),
    responses(
        (status = 200, description = "The caller's evaluation", body = EvaluationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem statement or evaluation not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, evaluator_id = auth_user.user_id))]
pub async fn get_my_evaluation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EvaluationResponse>, AppError> {
    auth_user.require_permission("evaluation:submit")?;
    find_problem_statement(&state.db, id).await?;

    let model = evaluation::Entity::find_by_id((id, auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No evaluation submitted yet".into()))?;

    Ok(Json(EvaluationResponse::try_from(model)?))
}

#[utoipa::path(
    get,
    path = "/{id}/consensus",
    tag = "Evaluations",
    operation_id = "getConsensus",
    summary = "Aggregate rankings for a problem statement",
    description = "Combines every finalized evaluation into per-team average rank, average score, rank standard deviation and conflict level. \
        Teams are ordered by average rank; teams nobody ranked come last. Requires `evaluation:view_all` permission.",
    params(("id" = i32, Path, description = "Problem statement ID")),
    responses(
        (status = 200, description = "Consensus view", body = ConsensusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem statement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_consensus(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ConsensusResponse>, AppError> {
    auth_user.require_permission("evaluation:view_all")?;
    let statement = find_problem_statement(&state.db, id).await?;

    let teams = eligible_teams(&state.db, id).await?;
    let assigned = evaluator_assignment::Entity::find()
        .filter(evaluator_assignment::Column::ProblemStatementId.eq(id))
        .count(&state.db)
        .await?;
    let evaluations = evaluation::Entity::find()
        .filter(evaluation::Column::ProblemStatementId.eq(id))
        .order_by_asc(evaluation::Column::EvaluatorId)
        .all(&state.db)
        .await?;

    let finalized: Vec<EvaluatorRanking> = evaluations
        .iter()
        .filter(|e| e.is_finalized)
        .map(to_evaluator_ranking)
        .collect::<Result<_, _>>()?;

    let thresholds = state.config.evaluation.thresholds();
    let consensus = compute_consensus(teams.iter().map(|t| t.id), &finalized, &thresholds);
    let stats = EvaluationStats::new(teams.len(), assigned as usize, finalized.len(), &consensus);

    let usernames = usernames_by_id(
        &state.db,
        evaluations.iter().map(|e| e.evaluator_id).collect(),
    )
    .await?;
    let evaluations = evaluations
        .into_iter()
        .map(|e| {
            let username = usernames.get(&e.evaluator_id).cloned().unwrap_or_default();
            let evaluator_id = e.evaluator_id;
            let is_finalized = e.is_finalized;
            let submitted_at = e.submitted_at;
            let rankings = stored_rankings(&e)?
                .into_iter()
                .map(RankingEntryResponse::from)
                .collect();
            Ok(EvaluatorRankingsResponse {
                evaluator_id,
                username,
                is_finalized,
                submitted_at,
                rankings,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut names: HashMap<i32, String> = teams.into_iter().map(|t| (t.id, t.name)).collect();
    let consensus = consensus
        .into_iter()
        .map(|c| {
            let name = names.remove(&c.team_id).unwrap_or_default();
            TeamConsensusResponse::new(c, name)
        })
        .collect();

    Ok(Json(ConsensusResponse {
        problem_statement: ProblemStatementResponse::from(statement),
        stats,
        evaluations,
        consensus,
    }))
}

#[utoipa::path(
    get,
    path = "/assignments",
    tag = "Evaluations",
    operation_id = "listMyAssignments",
    summary = "List the caller's evaluation assignments",
    description = "One entry per assigned problem statement with the number of rankable teams and the caller's progress.",
    responses(
        (status = 200, description = "Assignments", body = Vec<AssignmentSummary>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(evaluator_id = auth_user.user_id))]
pub async fn list_my_assignments(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentSummary>>, AppError> {
    auth_user.require_permission("evaluation:submit")?;

    let assignments = evaluator_assignment::Entity::find()
        .filter(evaluator_assignment::Column::EvaluatorId.eq(auth_user.user_id))
        .order_by_asc(evaluator_assignment::Column::ProblemStatementId)
        .all(&state.db)
        .await?;
    if assignments.is_empty() {
        return Ok(Json(vec![]));
    }
    let ids: Vec<i32> = assignments.iter().map(|a| a.problem_statement_id).collect();

    let statements: HashMap<i32, problem_statement::Model> = problem_statement::Entity::find()
        .filter(problem_statement::Column::Id.is_in(ids.clone()))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let evaluations: HashMap<i32, evaluation::Model> = evaluation::Entity::find()
        .filter(evaluation::Column::EvaluatorId.eq(auth_user.user_id))
        .filter(evaluation::Column::ProblemStatementId.is_in(ids.clone()))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|e| (e.problem_statement_id, e))
        .collect();
    let team_counts = eligible_team_counts(&state.db, ids).await?;

    let data = assignments
        .iter()
        .filter_map(|a| statements.get(&a.problem_statement_id))
        .map(|s| {
            let evaluation = evaluations.get(&s.id);
            AssignmentSummary {
                problem_statement_id: s.id,
                title: s.title.clone(),
                is_active: s.is_active,
                eligible_teams: team_counts.get(&s.id).copied().unwrap_or(0),
                progress: EvaluationProgress::of(evaluation),
                submitted_at: evaluation.and_then(|e| e.submitted_at),
            }
        })
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/overview",
    tag = "Evaluations",
    operation_id = "getEvaluationOverview",
    summary = "Evaluation progress across all problem statements",
    description = "Per problem statement: team and evaluator counts, finalization progress and how many teams the evaluators disagree on. \
        `conflicting_teams` uses `evaluation.overview_threshold`; `high_conflict_teams` matches the consensus view. Requires `evaluation:view_all` permission.",
    responses(
        (status = 200, description = "Overview", body = Vec<ProblemStatementOverview>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_overview(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProblemStatementOverview>>, AppError> {
    auth_user.require_permission("evaluation:view_all")?;

    let statements = problem_statement::Entity::find()
        .order_by_asc(problem_statement::Column::Id)
        .all(&state.db)
        .await?;

    let mut teams_by_statement: HashMap<i32, Vec<i32>> = HashMap::new();
    for t in team::Entity::find()
        .filter(team::Column::Status.ne(TeamStatus::Rejected))
        .order_by_asc(team::Column::Id)
        .all(&state.db)
        .await?
    {
        teams_by_statement
            .entry(t.problem_statement_id)
            .or_default()
            .push(t.id);
    }

    let mut assigned_by_statement: HashMap<i32, usize> = HashMap::new();
    for a in evaluator_assignment::Entity::find().all(&state.db).await? {
        *assigned_by_statement.entry(a.problem_statement_id).or_default() += 1;
    }

    let mut finalized_by_statement: HashMap<i32, Vec<EvaluatorRanking>> = HashMap::new();
    for e in evaluation::Entity::find()
        .filter(evaluation::Column::IsFinalized.eq(true))
        .order_by_asc(evaluation::Column::EvaluatorId)
        .all(&state.db)
        .await?
    {
        finalized_by_statement
            .entry(e.problem_statement_id)
            .or_default()
            .push(to_evaluator_ranking(&e)?);
    }

    let thresholds = state.config.evaluation.thresholds();
    let data = statements
        .into_iter()
        .map(|s| {
            let team_ids = teams_by_statement.remove(&s.id).unwrap_or_default();
            let finalized = finalized_by_statement.remove(&s.id).unwrap_or_default();
            let assigned = assigned_by_statement.get(&s.id).copied().unwrap_or(0);

            let consensus = compute_consensus(team_ids.iter().copied(), &finalized, &thresholds);
            let stats = EvaluationStats::new(team_ids.len(), assigned, finalized.len(), &consensus);
            let conflicting = count_overview_conflicts(team_ids, &finalized, &thresholds);

            ProblemStatementOverview {
                problem_statement_id: s.id,
                title: s.title,
                is_active: s.is_active,
                total_teams: stats.total_teams,
                assigned_evaluators: stats.assigned_evaluators,
                finalized_evaluators: stats.finalized_evaluators,
                pending_evaluators: stats.pending_evaluators,
                conflicting_teams: conflicting as u64,
                high_conflict_teams: stats.high_conflict_teams,
            }
        })
        .collect();

    Ok(Json(data))
}

async fn eligible_team_counts<C: ConnectionTrait>(
    db: &C,
    problem_statement_ids: Vec<i32>,
) -> Result<HashMap<i32, u64>, AppError> {
    let rows: Vec<i32> = team::Entity::find()
        .filter(team::Column::ProblemStatementId.is_in(problem_statement_ids))
        .filter(team::Column::Status.ne(TeamStatus::Rejected))
        .select_only()
        .column(team::Column::ProblemStatementId)
        .into_tuple()
        .all(db)
        .await?;
    let mut counts = HashMap::new();
    for id in rows {
        *counts.entry(id).or_default() += 1;
    }
    Ok(counts)
}
