use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ranked team inside an evaluation.
/// Stored as JSON array in the database so a ranking set is replaced in one write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRanking {
    pub team_id: i32,
    pub rank: u32,
    pub score: Option<f64>,
    pub comments: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

/// An evaluator's ranking of the teams under one problem statement.
///
/// The composite primary key is the unique `(problem_statement_id, evaluator_id)`
/// pair that submissions upsert against.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evaluation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub problem_statement_id: i32,
    #[sea_orm(primary_key)]
    pub evaluator_id: i32,
    #[sea_orm(belongs_to, from = "problem_statement_id", to = "id")]
    pub problem_statement: HasOne<super::problem_statement::Entity>,
    #[sea_orm(belongs_to, from = "evaluator_id", to = "id")]
    pub evaluator: HasOne<super::user::Entity>,

    /// JSON array of [`StoredRanking`].
    #[sea_orm(column_type = "JsonBinary")]
    pub rankings: serde_json::Value,
    pub is_finalized: bool,
    /// Set when the evaluation was last saved as finalized.
    pub submitted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the stored ranking set.
    pub fn parsed_rankings(&self) -> Result<Vec<StoredRanking>, serde_json::Error> {
        serde_json::from_value(self.rankings.clone())
    }
}
