use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A team's project hand-in. Files live with an external host; only links are kept.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_submission")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub team_id: i32,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: HasOne<super::team::Entity>,

    pub repository_url: String,
    pub demo_url: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub submitted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
