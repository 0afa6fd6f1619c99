//! SeaORM adapter for scenes and their rosters.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};
use time::OffsetDateTime;

use crate::entities::{scene_characters, scenes};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Option<scenes::Model>, sea_orm::DbErr> {
    scenes::Entity::find_by_id(scene_id).one(conn).await
}

/// Scenes of the campaign that are not archived, in id order.
pub async fn list_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<scenes::Model>, sea_orm::DbErr> {
    scenes::Entity::find()
        .filter(scenes::Column::CampaignId.eq(campaign_id))
        .filter(scenes::Column::IsArchived.eq(false))
        .order_by_asc(scenes::Column::Id)
        .all(conn)
        .await
}

/// Every scene of the campaign, archived or not, in id order.
pub async fn list_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<scenes::Model>, sea_orm::DbErr> {
    scenes::Entity::find()
        .filter(scenes::Column::CampaignId.eq(campaign_id))
        .order_by_asc(scenes::Column::Id)
        .all(conn)
        .await
}

pub async fn create_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    title: &str,
    now: OffsetDateTime,
) -> Result<scenes::Model, sea_orm::DbErr> {
    scenes::ActiveModel {
        id: NotSet,
        campaign_id: Set(campaign_id),
        title: Set(title.to_string()),
        is_archived: Set(false),
        created_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn set_archived<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    archived: bool,
) -> Result<u64, sea_orm::DbErr> {
    let result = scenes::Entity::update_many()
        .col_expr(scenes::Column::IsArchived, Expr::value(archived))
        .filter(scenes::Column::Id.eq(scene_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Roster rows ordered by `position`, then id.
pub async fn list_roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<scene_characters::Model>, sea_orm::DbErr> {
    scene_characters::Entity::find()
        .filter(scene_characters::Column::SceneId.eq(scene_id))
        .order_by_asc(scene_characters::Column::Position)
        .order_by_asc(scene_characters::Column::Id)
        .all(conn)
        .await
}

pub async fn find_roster_entry<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<Option<scene_characters::Model>, sea_orm::DbErr> {
    scene_characters::Entity::find()
        .filter(scene_characters::Column::SceneId.eq(scene_id))
        .filter(scene_characters::Column::CharacterId.eq(character_id))
        .one(conn)
        .await
}

pub async fn add_to_roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
    position: i32,
    now: OffsetDateTime,
) -> Result<scene_characters::Model, sea_orm::DbErr> {
    scene_characters::ActiveModel {
        id: NotSet,
        scene_id: Set(scene_id),
        character_id: Set(character_id),
        position: Set(position),
        joined_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn remove_from_roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = scene_characters::Entity::delete_many()
        .filter(scene_characters::Column::SceneId.eq(scene_id))
        .filter(scene_characters::Column::CharacterId.eq(character_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
