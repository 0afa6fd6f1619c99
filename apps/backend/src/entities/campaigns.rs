use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CampaignPhase {
    #[sea_orm(string_value = "gm_phase")]
    GmPhase,
    #[sea_orm(string_value = "pc_phase")]
    PcPhase,
}

impl CampaignPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignPhase::GmPhase => "gm_phase",
            CampaignPhase::PcPhase => "pc_phase",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_name = "created_by")]
    pub created_by: i64,
    pub phase: CampaignPhase,
    #[sea_orm(column_name = "phase_started_at")]
    pub phase_started_at: OffsetDateTime,
    #[sea_orm(column_name = "phase_expires_at")]
    pub phase_expires_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "is_paused")]
    pub is_paused: bool,
    #[sea_orm(column_name = "paused_at")]
    pub paused_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "time_gate_secs")]
    pub time_gate_secs: Option<i64>,
    #[sea_orm(column_name = "lock_version")]
    pub lock_version: i32,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::campaign_members::Entity")]
    CampaignMembers,
    #[sea_orm(has_many = "super::scenes::Entity")]
    Scenes,
    #[sea_orm(has_many = "super::characters::Entity")]
    Characters,
}

impl Related<super::campaign_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampaignMembers.def()
    }
}

impl Related<super::scenes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenes.def()
    }
}

impl Related<super::characters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Characters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
