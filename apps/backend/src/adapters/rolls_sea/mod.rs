//! SeaORM adapter for dice rolls.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::rolls::{self, RollStatus};

pub mod dto;

pub use dto::{RollCreate, RollUpdate};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    roll_id: i64,
) -> Result<Option<rolls::Model>, sea_orm::DbErr> {
    rolls::Entity::find_by_id(roll_id).one(conn).await
}

pub async fn create_roll<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RollCreate,
    now: OffsetDateTime,
) -> Result<rolls::Model, sea_orm::DbErr> {
    rolls::ActiveModel {
        id: NotSet,
        post_id: Set(dto.post_id),
        scene_id: Set(dto.scene_id),
        character_id: Set(dto.character_id),
        requested_by: Set(dto.requested_by),
        intention: Set(dto.intention),
        original_intention: Set(None),
        modifier: Set(dto.modifier),
        dice_type: Set(dto.dice_type),
        dice_count: Set(dto.dice_count),
        result: Set(serde_json::Value::Array(Vec::new())),
        total: Set(None),
        status: Set(RollStatus::Pending),
        was_overridden: Set(false),
        overridden_by: Set(None),
        override_reason: Set(None),
        overridden_at: Set(None),
        manual_result: Set(None),
        manually_resolved_by: Set(None),
        manual_resolution_reason: Set(None),
        invalidated_by: Set(None),
        invalidated_at: Set(None),
        rolled_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn update_roll<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    existing: rolls::Model,
    dto: RollUpdate,
    now: OffsetDateTime,
) -> Result<rolls::Model, sea_orm::DbErr> {
    let mut active = existing.into_active_model();
    if let Some(intention) = dto.intention {
        active.intention = Set(intention);
    }
    if let Some(original) = dto.original_intention {
        active.original_intention = Set(Some(original));
    }
    if let Some(by) = dto.overridden_by {
        active.was_overridden = Set(true);
        active.overridden_by = Set(Some(by));
        active.overridden_at = Set(Some(now));
    }
    if let Some(reason) = dto.override_reason {
        active.override_reason = Set(reason);
    }
    if let Some(manual) = dto.manual_result {
        active.manual_result = Set(Some(manual));
        active.total = Set(Some(manual));
        active.rolled_at = Set(Some(now));
    }
    if let Some(by) = dto.manually_resolved_by {
        active.manually_resolved_by = Set(Some(by));
    }
    if let Some(reason) = dto.manual_resolution_reason {
        active.manual_resolution_reason = Set(reason);
    }
    if let Some(by) = dto.invalidated_by {
        active.invalidated_by = Set(Some(by));
        active.invalidated_at = Set(Some(now));
    }
    if let Some(status) = dto.status {
        active.status = Set(status);
    }
    active.updated_at = Set(now);
    active.update(conn).await
}

/// Write the executor's outcome, but only while the roll is still pending.
///
/// Returns the number of rows written; zero means a GM action got there
/// first.
pub async fn complete_if_pending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    roll_id: i64,
    faces: &[i32],
    total: i32,
    now: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    let result = rolls::Entity::update_many()
        .col_expr(rolls::Column::Result, Expr::value(serde_json::json!(faces)))
        .col_expr(rolls::Column::Total, Expr::value(Some(total)))
        .col_expr(rolls::Column::Status, Expr::value(RollStatus::Completed))
        .col_expr(rolls::Column::RolledAt, Expr::value(Some(now)))
        .col_expr(rolls::Column::UpdatedAt, Expr::value(now))
        .filter(rolls::Column::Id.eq(roll_id))
        .filter(rolls::Column::Status.eq(RollStatus::Pending))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn list_by_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
) -> Result<Vec<rolls::Model>, sea_orm::DbErr> {
    rolls::Entity::find()
        .filter(rolls::Column::PostId.eq(post_id))
        .order_by_asc(rolls::Column::Id)
        .all(conn)
        .await
}

pub async fn list_by_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<rolls::Model>, sea_orm::DbErr> {
    rolls::Entity::find()
        .filter(rolls::Column::SceneId.eq(scene_id))
        .order_by_asc(rolls::Column::Id)
        .all(conn)
        .await
}

pub async fn list_pending_for_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<Vec<rolls::Model>, sea_orm::DbErr> {
    rolls::Entity::find()
        .filter(rolls::Column::SceneId.eq(scene_id))
        .filter(rolls::Column::CharacterId.eq(character_id))
        .filter(rolls::Column::Status.eq(RollStatus::Pending))
        .order_by_asc(rolls::Column::Id)
        .all(conn)
        .await
}

/// Pending rolls of a character in any scene. A character belongs to one
/// campaign, so this is campaign-wide.
pub async fn count_pending_for_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    character_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    rolls::Entity::find()
        .filter(rolls::Column::CharacterId.eq(character_id))
        .filter(rolls::Column::Status.eq(RollStatus::Pending))
        .count(conn)
        .await
}

pub async fn list_pending_in_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<rolls::Model>, sea_orm::DbErr> {
    if scene_ids.is_empty() {
        return Ok(Vec::new());
    }
    rolls::Entity::find()
        .filter(rolls::Column::SceneId.is_in(scene_ids))
        .filter(rolls::Column::Status.eq(RollStatus::Pending))
        .order_by_asc(rolls::Column::Id)
        .all(conn)
        .await
}

/// Detach rolls from a post that is going away.
pub async fn clear_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    now: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    let result = rolls::Entity::update_many()
        .col_expr(rolls::Column::PostId, Expr::value(Option::<i64>::None))
        .col_expr(rolls::Column::UpdatedAt, Expr::value(now))
        .filter(rolls::Column::PostId.eq(post_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
