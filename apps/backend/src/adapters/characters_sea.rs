//! SeaORM adapter for characters.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};
use time::OffsetDateTime;

use crate::entities::characters::{self, CharacterKind};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    character_id: i64,
) -> Result<Option<characters::Model>, sea_orm::DbErr> {
    characters::Entity::find_by_id(character_id).one(conn).await
}

/// Characters in `campaign_id` owned by `user_id`.
pub async fn find_owned<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Vec<characters::Model>, sea_orm::DbErr> {
    characters::Entity::find()
        .filter(characters::Column::CampaignId.eq(campaign_id))
        .filter(characters::Column::OwnerUserId.eq(user_id))
        .order_by_asc(characters::Column::Id)
        .all(conn)
        .await
}

pub async fn create_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    owner_user_id: Option<i64>,
    name: &str,
    kind: CharacterKind,
    now: OffsetDateTime,
) -> Result<characters::Model, sea_orm::DbErr> {
    characters::ActiveModel {
        id: NotSet,
        campaign_id: Set(campaign_id),
        owner_user_id: Set(owner_user_id),
        name: Set(name.to_string()),
        kind: Set(kind),
        created_at: Set(now),
    }
    .insert(conn)
    .await
}
