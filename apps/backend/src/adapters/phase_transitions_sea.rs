//! SeaORM adapter for the phase transition audit trail.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};
use time::OffsetDateTime;

use crate::entities::campaigns::CampaignPhase;
use crate::entities::phase_transitions::{self, TransitionReason};

pub async fn record<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    from: CampaignPhase,
    to: CampaignPhase,
    triggered_by: i64,
    reason: TransitionReason,
    now: OffsetDateTime,
) -> Result<phase_transitions::Model, sea_orm::DbErr> {
    phase_transitions::ActiveModel {
        id: NotSet,
        campaign_id: Set(campaign_id),
        from_phase: Set(from),
        to_phase: Set(to),
        triggered_by: Set(triggered_by),
        reason: Set(reason),
        created_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn list_for_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<phase_transitions::Model>, sea_orm::DbErr> {
    phase_transitions::Entity::find()
        .filter(phase_transitions::Column::CampaignId.eq(campaign_id))
        .order_by_asc(phase_transitions::Column::Id)
        .all(conn)
        .await
}
