use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RollStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "invalidated")]
    Invalidated,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rolls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "post_id")]
    pub post_id: Option<i64>,
    #[sea_orm(column_name = "scene_id")]
    pub scene_id: i64,
    #[sea_orm(column_name = "character_id")]
    pub character_id: i64,
    #[sea_orm(column_name = "requested_by")]
    pub requested_by: i64,
    pub intention: String,
    #[sea_orm(column_name = "original_intention")]
    pub original_intention: Option<String>,
    pub modifier: i32,
    #[sea_orm(column_name = "dice_type")]
    pub dice_type: i32,
    #[sea_orm(column_name = "dice_count")]
    pub dice_count: i32,
    /// JSON array of individual die faces.
    pub result: Json,
    pub total: Option<i32>,
    pub status: RollStatus,
    #[sea_orm(column_name = "was_overridden")]
    pub was_overridden: bool,
    #[sea_orm(column_name = "overridden_by")]
    pub overridden_by: Option<i64>,
    #[sea_orm(column_name = "override_reason")]
    pub override_reason: Option<String>,
    #[sea_orm(column_name = "overridden_at")]
    pub overridden_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "manual_result")]
    pub manual_result: Option<i32>,
    #[sea_orm(column_name = "manually_resolved_by")]
    pub manually_resolved_by: Option<i64>,
    #[sea_orm(column_name = "manual_resolution_reason")]
    pub manual_resolution_reason: Option<String>,
    #[sea_orm(column_name = "invalidated_by")]
    pub invalidated_by: Option<i64>,
    #[sea_orm(column_name = "invalidated_at")]
    pub invalidated_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "rolled_at")]
    pub rolled_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::PostId",
        to = "super::posts::Column::Id"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::scenes::Entity",
        from = "Column::SceneId",
        to = "super::scenes::Column::Id"
    )]
    Scene,
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::scenes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scene.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
