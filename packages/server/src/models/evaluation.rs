use chrono::{DateTime, Utc};
use common::consensus::EvaluatorVote;
use common::{ConflictLevel, EvaluationStats, ProposedRanking, RankingError, TeamConsensus};
use serde::{Deserialize, Serialize};

use super::problem_statement::ProblemStatementResponse;
use crate::entity::evaluation::{self, StoredRanking};
use crate::error::AppError;

/// Request body for submitting an evaluator's rankings.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitRankingsRequest {
    /// One entry per ranked team. Ranks must be exactly `1..=N`.
    /// Kept raw so that a malformed array is reported as a ranking error.
    #[schema(value_type = Option<Vec<ProposedRanking>>)]
    pub rankings: Option<serde_json::Value>,
    /// Mark the ranking as final. Only finalized rankings count towards consensus.
    #[serde(default)]
    pub is_finalized: bool,
}

impl SubmitRankingsRequest {
    /// Decode the proposed rankings. Anything other than a non-empty array of
    /// well-formed entries is reported as missing.
    pub fn rankings(&self) -> Result<Vec<ProposedRanking>, AppError> {
        match &self.rankings {
            Some(value @ serde_json::Value::Array(items)) if !items.is_empty() => {
                Vec::<ProposedRanking>::deserialize(value).map_err(|_| RankingError::Missing.into())
            }
            _ => Err(RankingError::Missing.into()),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RankingEntryResponse {
    pub team_id: i32,
    #[schema(example = 1)]
    pub rank: u32,
    pub score: Option<f64>,
    pub comments: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl From<StoredRanking> for RankingEntryResponse {
    fn from(r: StoredRanking) -> Self {
        Self {
            team_id: r.team_id,
            rank: r.rank,
            score: r.score,
            comments: r.comments,
            evaluated_at: r.evaluated_at,
        }
    }
}

/// An evaluator's persisted ranking set.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EvaluationResponse {
    pub problem_statement_id: i32,
    pub evaluator_id: i32,
    /// Sorted by rank.
    pub rankings: Vec<RankingEntryResponse>,
    pub is_finalized: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<evaluation::Model> for EvaluationResponse {
    type Error = AppError;

    fn try_from(m: evaluation::Model) -> Result<Self, Self::Error> {
        let rankings = ranking_entries(&m)?;
        Ok(Self {
            problem_statement_id: m.problem_statement_id,
            evaluator_id: m.evaluator_id,
            rankings,
            is_finalized: m.is_finalized,
            submitted_at: m.submitted_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// Decode an evaluation's rankings, sorted by rank.
pub fn stored_rankings(m: &evaluation::Model) -> Result<Vec<StoredRanking>, AppError> {
    let mut rankings = m.parsed_rankings().map_err(|e| {
        AppError::Internal(format!(
            "Corrupt rankings for evaluation ({}, {}): {e}",
            m.problem_statement_id, m.evaluator_id
        ))
    })?;
    rankings.sort_by_key(|r| r.rank);
    Ok(rankings)
}

fn ranking_entries(m: &evaluation::Model) -> Result<Vec<RankingEntryResponse>, AppError> {
    Ok(stored_rankings(m)?
        .into_iter()
        .map(RankingEntryResponse::from)
        .collect())
}

/// Where an evaluator stands on one problem statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationProgress {
    NotStarted,
    Draft,
    Finalized,
}

impl EvaluationProgress {
    pub fn of(evaluation: Option<&evaluation::Model>) -> Self {
        Self::from_finalized(evaluation.map(|e| e.is_finalized))
    }

    /// `None` when nothing has been saved yet.
    fn from_finalized(is_finalized: Option<bool>) -> Self {
        match is_finalized {
            None => Self::NotStarted,
            Some(true) => Self::Finalized,
            Some(false) => Self::Draft,
        }
    }
}

/// A problem statement the caller has been assigned to judge.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentSummary {
    pub problem_statement_id: i32,
    pub title: String,
    pub is_active: bool,
    /// Teams currently eligible for ranking.
    pub eligible_teams: u64,
    pub progress: EvaluationProgress,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// One evaluator's raw rankings in the consensus view.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EvaluatorRankingsResponse {
    pub evaluator_id: i32,
    #[schema(example = "judge_judy")]
    pub username: String,
    pub is_finalized: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub rankings: Vec<RankingEntryResponse>,
}

/// Consensus for one team, with the team's name attached.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamConsensusResponse {
    pub team_id: i32,
    #[schema(example = "Null Pointers")]
    pub team_name: String,
    pub rankings: Vec<EvaluatorVote>,
    pub average_rank: Option<f64>,
    pub average_score: Option<f64>,
    pub rank_standard_deviation: Option<f64>,
    pub conflict_level: ConflictLevel,
}

impl TeamConsensusResponse {
    pub fn new(consensus: TeamConsensus, team_name: String) -> Self {
        Self {
            team_id: consensus.team_id,
            team_name,
            rankings: consensus.rankings,
            average_rank: consensus.average_rank,
            average_score: consensus.average_score,
            rank_standard_deviation: consensus.rank_standard_deviation,
            conflict_level: consensus.conflict_level,
        }
    }
}

/// Full consensus view for one problem statement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ConsensusResponse {
    pub problem_statement: ProblemStatementResponse,
    pub stats: EvaluationStats,
    /// Every evaluation on file, drafts included. Only finalized ones feed `consensus`.
    pub evaluations: Vec<EvaluatorRankingsResponse>,
    /// Best (lowest average rank) first; unranked teams last.
    pub consensus: Vec<TeamConsensusResponse>,
}

/// Per-problem-statement line in the evaluation overview.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemStatementOverview {
    pub problem_statement_id: i32,
    pub title: String,
    pub is_active: bool,
    pub total_teams: u64,
    pub assigned_evaluators: u64,
    pub finalized_evaluators: u64,
    pub pending_evaluators: u64,
    /// Teams whose rank standard deviation exceeds `evaluation.overview_threshold`.
    pub conflicting_teams: u64,
    /// Teams classified `high` by the consensus view.
    pub high_conflict_teams: u64,
}
