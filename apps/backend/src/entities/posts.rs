use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// `blocks` is a JSON array of content blocks; `witnesses` a JSON array of
/// character ids.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "scene_id")]
    pub scene_id: i64,
    #[sea_orm(column_name = "character_id")]
    pub character_id: Option<i64>,
    #[sea_orm(column_name = "user_id")]
    pub user_id: i64,
    pub blocks: Json,
    #[sea_orm(column_name = "ooc_text")]
    pub ooc_text: Option<String>,
    pub witnesses: Json,
    #[sea_orm(column_name = "is_hidden")]
    pub is_hidden: bool,
    #[sea_orm(column_name = "is_draft")]
    pub is_draft: bool,
    #[sea_orm(column_name = "is_locked")]
    pub is_locked: bool,
    /// GM narration written during gm_phase, revealed when the phase ends.
    #[sea_orm(column_name = "awaiting_reveal")]
    pub awaiting_reveal: bool,
    pub intention: Option<String>,
    pub modifier: Option<i32>,
    #[sea_orm(column_name = "submitted_at")]
    pub submitted_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scenes::Entity",
        from = "Column::SceneId",
        to = "super::scenes::Column::Id"
    )]
    Scene,
    #[sea_orm(has_many = "super::rolls::Entity")]
    Rolls,
}

impl Related<super::scenes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scene.def()
    }
}

impl Related<super::rolls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rolls.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
