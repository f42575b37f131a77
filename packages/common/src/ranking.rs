//! Validation of an evaluator's ranking set before it is persisted.
//!
//! A submission is accepted or rejected as a whole: the ranks must form the
//! sequence `1..=K` for `K` entries, and every referenced team must be
//! eligible under the target problem statement.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    /// The list was empty or an entry had no rank.
    #[error("Rankings array is required")]
    Missing,
    /// Ranks contain a duplicate, a gap, a non-positive or a non-integer value.
    #[error("Rankings must be sequential starting from 1")]
    NotSequential,
    /// Teams outside the problem statement, rejected, or listed twice.
    #[error("Invalid teams in ranking")]
    InvalidTeams(Vec<i32>),
}

/// A ranking entry as proposed by an evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProposedRanking {
    #[schema(example = 7)]
    pub team_id: i32,
    /// Position of the team, 1 being best. Decoded as a plain number so that
    /// fractional or negative values surface as a sequencing error.
    #[schema(example = 1)]
    pub rank: Option<f64>,
    #[schema(example = 87.5)]
    pub score: Option<f64>,
    #[schema(example = "Strong demo, thin documentation")]
    pub comments: Option<String>,
}

/// A ranking entry whose rank is known to be part of a valid sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RankedTeam {
    pub team_id: i32,
    pub rank: u32,
    pub score: Option<f64>,
    pub comments: Option<String>,
}

/// Check that the proposed ranks are exactly `1..=K`.
pub fn validate_sequence(proposed: &[ProposedRanking]) -> Result<Vec<RankedTeam>, RankingError> {
    if proposed.is_empty() {
        return Err(RankingError::Missing);
    }

    let entries = proposed
        .iter()
        .map(|p| p.rank.map(|rank| (rank, p)).ok_or(RankingError::Missing))
        .collect::<Result<Vec<_>, _>>()?;

    let mut ranks: Vec<f64> = entries.iter().map(|(rank, _)| *rank).collect();
    ranks.sort_by(f64::total_cmp);
    let sequential = ranks
        .iter()
        .enumerate()
        .all(|(i, &rank)| rank == (i + 1) as f64);
    if !sequential {
        return Err(RankingError::NotSequential);
    }

    Ok(entries
        .into_iter()
        .map(|(rank, p)| RankedTeam {
            team_id: p.team_id,
            // Exact integer in 1..=K at this point.
            rank: rank as u32,
            score: p.score,
            comments: p.comments.clone(),
        })
        .collect())
}

/// Check that every ranked team is in `eligible` and appears only once.
pub fn check_team_eligibility(
    ranked: &[RankedTeam],
    eligible: &HashSet<i32>,
) -> Result<(), RankingError> {
    let mut seen = HashSet::new();
    let invalid: Vec<i32> = ranked
        .iter()
        .map(|r| r.team_id)
        .filter(|id| !eligible.contains(id) || !seen.insert(*id))
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(RankingError::InvalidTeams(invalid))
    }
}

/// Run both checks in order: sequence first, then team eligibility.
pub fn validate_rankings(
    proposed: &[ProposedRanking],
    eligible: &HashSet<i32>,
) -> Result<Vec<RankedTeam>, RankingError> {
    let ranked = validate_sequence(proposed)?;
    check_team_eligibility(&ranked, eligible)?;
    Ok(ranked)
}
