pub mod consensus;
pub mod ranking;
pub mod team_status;

pub use consensus::{ConflictLevel, ConflictThresholds, EvaluationStats, TeamConsensus};
pub use ranking::{ProposedRanking, RankedTeam, RankingError};
pub use team_status::TeamStatus;
