use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evaluator_assignment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub problem_statement_id: i32,
    #[sea_orm(primary_key)]
    pub evaluator_id: i32,
    #[sea_orm(belongs_to, from = "problem_statement_id", to = "id")]
    pub problem_statement: HasOne<super::problem_statement::Entity>,
    #[sea_orm(belongs_to, from = "evaluator_id", to = "id")]
    pub evaluator: HasOne<super::user::Entity>,

    pub assigned_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
