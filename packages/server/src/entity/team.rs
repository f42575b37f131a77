use common::TeamStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    /// Member display names stored as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub members: serde_json::Value,
    pub status: TeamStatus,

    /// One team per leader.
    #[sea_orm(unique)]
    pub leader_id: i32,
    #[sea_orm(belongs_to, from = "leader_id", to = "id")]
    pub leader: HasOne<super::user::Entity>,

    pub problem_statement_id: i32,
    #[sea_orm(belongs_to, from = "problem_statement_id", to = "id")]
    pub problem_statement: HasOne<super::problem_statement::Entity>,

    #[sea_orm(has_one)]
    pub submission: HasOne<super::task_submission::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
