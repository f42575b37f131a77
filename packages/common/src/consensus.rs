//! Aggregation of finalized evaluator rankings into a per-team consensus.
//!
//! Everything here is a pure function of the rankings passed in; fetching the
//! finalized evaluations is the caller's job.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ranking::RankedTeam;

/// How strongly evaluators disagree about a team's rank.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Standard-deviation cutoffs used to flag disagreement.
///
/// `medium` and `high` drive the per-team [`ConflictLevel`] shown in the
/// consensus detail view. `overview` is the single cutoff used when counting
/// conflicting teams across all problem statements. The two views have always
/// used different cutoffs, so they are kept separate rather than merged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictThresholds {
    pub medium: f64,
    pub high: f64,
    pub overview: f64,
}

impl Default for ConflictThresholds {
    fn default() -> Self {
        Self {
            medium: 1.5,
            high: 3.0,
            overview: 2.0,
        }
    }
}

impl ConflictThresholds {
    /// Classify a rank standard deviation. `None` (fewer than two ranks) is low.
    pub fn classify(&self, std_dev: Option<f64>) -> ConflictLevel {
        match std_dev {
            Some(sd) if sd > self.high => ConflictLevel::High,
            Some(sd) if sd > self.medium => ConflictLevel::Medium,
            _ => ConflictLevel::Low,
        }
    }

    /// Whether a team counts as conflicting in the overview.
    pub fn is_overview_conflict(&self, std_dev: Option<f64>) -> bool {
        std_dev.is_some_and(|sd| sd > self.overview)
    }
}

/// One evaluator's finalized ranking set.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatorRanking {
    pub evaluator_id: i32,
    pub rankings: Vec<RankedTeam>,
}

impl EvaluatorRanking {
    fn entry_for(&self, team_id: i32) -> Option<&RankedTeam> {
        self.rankings.iter().find(|r| r.team_id == team_id)
    }
}

/// What a single evaluator said about a team. `rank` is `None` when the
/// evaluator did not rank the team at all.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct EvaluatorVote {
    pub evaluator_id: i32,
    pub rank: Option<u32>,
    pub score: Option<f64>,
    pub comments: Option<String>,
}

/// Derived consensus for one team. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TeamConsensus {
    pub team_id: i32,
    pub rankings: Vec<EvaluatorVote>,
    /// Mean of the submitted ranks, `null` when nobody ranked the team.
    pub average_rank: Option<f64>,
    /// Mean of the submitted scores, `null` when no score was given.
    pub average_score: Option<f64>,
    /// Population standard deviation of the ranks, `null` with fewer than two.
    pub rank_standard_deviation: Option<f64>,
    pub conflict_level: ConflictLevel,
}

/// Arithmetic mean, `None` for an empty sample.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population standard deviation, `None` with fewer than two samples.
pub fn population_std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let avg = mean(samples)?;
    let variance = samples.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / samples.len() as f64;
    Some(variance.sqrt())
}

fn collect_ranks(team_id: i32, evaluations: &[EvaluatorRanking]) -> Vec<f64> {
    evaluations
        .iter()
        .filter_map(|e| e.entry_for(team_id))
        .map(|r| f64::from(r.rank))
        .collect()
}

/// Compute the consensus record for a single team.
pub fn team_consensus(
    team_id: i32,
    evaluations: &[EvaluatorRanking],
    thresholds: &ConflictThresholds,
) -> TeamConsensus {
    let rankings: Vec<EvaluatorVote> = evaluations
        .iter()
        .map(|e| match e.entry_for(team_id) {
            Some(entry) => EvaluatorVote {
                evaluator_id: e.evaluator_id,
                rank: Some(entry.rank),
                score: entry.score,
                comments: entry.comments.clone(),
            },
            None => EvaluatorVote {
                evaluator_id: e.evaluator_id,
                rank: None,
                score: None,
                comments: None,
            },
        })
        .collect();

    let ranks: Vec<f64> = rankings
        .iter()
        .filter_map(|v| v.rank)
        .map(f64::from)
        .collect();

    if ranks.is_empty() {
        return TeamConsensus {
            team_id,
            rankings,
            average_rank: None,
            average_score: None,
            rank_standard_deviation: None,
            conflict_level: ConflictLevel::Low,
        };
    }

    let scores: Vec<f64> = rankings
        .iter()
        .filter(|v| v.rank.is_some())
        .filter_map(|v| v.score)
        .collect();
    let std_dev = population_std_dev(&ranks);

    TeamConsensus {
        team_id,
        rankings,
        average_rank: mean(&ranks),
        average_score: mean(&scores),
        rank_standard_deviation: std_dev,
        conflict_level: thresholds.classify(std_dev),
    }
}

/// Order by average rank ascending, unranked teams last. The sort is stable,
/// so ties and unranked teams keep their input order.
pub fn sort_by_average_rank(records: &mut [TeamConsensus]) {
    records.sort_by(|a, b| match (a.average_rank, b.average_rank) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Compute and sort the consensus for every team under a problem statement.
pub fn compute_consensus<I>(
    team_ids: I,
    evaluations: &[EvaluatorRanking],
    thresholds: &ConflictThresholds,
) -> Vec<TeamConsensus>
where
    I: IntoIterator<Item = i32>,
{
    let mut records: Vec<TeamConsensus> = team_ids
        .into_iter()
        .map(|team_id| team_consensus(team_id, evaluations, thresholds))
        .collect();
    sort_by_average_rank(&mut records);
    records
}

/// Count teams over the overview threshold. Independent of the detail view's
/// classification.
pub fn count_overview_conflicts<I>(
    team_ids: I,
    evaluations: &[EvaluatorRanking],
    thresholds: &ConflictThresholds,
) -> usize
where
    I: IntoIterator<Item = i32>,
{
    team_ids
        .into_iter()
        .filter(|&team_id| {
            let ranks = collect_ranks(team_id, evaluations);
            thresholds.is_overview_conflict(population_std_dev(&ranks))
        })
        .count()
}

/// Headline numbers for one problem statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct EvaluationStats {
    #[schema(example = 12)]
    pub total_teams: u64,
    #[schema(example = 3)]
    pub assigned_evaluators: u64,
    #[schema(example = 2)]
    pub finalized_evaluators: u64,
    #[schema(example = 1)]
    pub pending_evaluators: u64,
    #[schema(example = 0)]
    pub high_conflict_teams: u64,
}

impl EvaluationStats {
    pub fn new(
        total_teams: usize,
        assigned_evaluators: usize,
        finalized_evaluators: usize,
        consensus: &[TeamConsensus],
    ) -> Self {
        let high_conflict_teams = consensus
            .iter()
            .filter(|c| c.conflict_level == ConflictLevel::High)
            .count();
        Self {
            total_teams: total_teams as u64,
            assigned_evaluators: assigned_evaluators as u64,
            finalized_evaluators: finalized_evaluators as u64,
            // An evaluator may finalize and then be unassigned.
            pending_evaluators: assigned_evaluators.saturating_sub(finalized_evaluators) as u64,
            high_conflict_teams: high_conflict_teams as u64,
        }
    }
}
