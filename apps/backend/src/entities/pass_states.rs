use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    #[default]
    #[sea_orm(string_value = "none")]
    None,
    #[sea_orm(string_value = "passed")]
    Passed,
    #[sea_orm(string_value = "hard_passed")]
    HardPassed,
}

impl PassState {
    /// `passed` and `hard_passed` both satisfy the pc→gm guard.
    pub fn is_passing(self) -> bool {
        matches!(self, PassState::Passed | PassState::HardPassed)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pass_states")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "scene_id")]
    pub scene_id: i64,
    #[sea_orm(column_name = "character_id")]
    pub character_id: i64,
    pub state: PassState,
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
}

impl Related<super::scenes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scene.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
