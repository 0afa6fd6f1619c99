//! SeaORM adapter for campaign memberships.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;

use crate::entities::campaign_members::{self, MemberRole};

pub async fn find_membership<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Option<campaign_members::Model>, sea_orm::DbErr> {
    campaign_members::Entity::find()
        .filter(campaign_members::Column::CampaignId.eq(campaign_id))
        .filter(campaign_members::Column::UserId.eq(user_id))
        .one(conn)
        .await
}

pub async fn create_membership<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
    role: MemberRole,
    now: OffsetDateTime,
) -> Result<campaign_members::Model, sea_orm::DbErr> {
    campaign_members::ActiveModel {
        id: NotSet,
        campaign_id: Set(campaign_id),
        user_id: Set(user_id),
        role: Set(role),
        created_at: Set(now),
    }
    .insert(conn)
    .await
}
