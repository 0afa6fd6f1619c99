//! SeaORM adapter for compose locks.
//!
//! Rows are returned regardless of expiry; liveness is decided by the
//! service layer.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};
use time::OffsetDateTime;

use crate::entities::compose_locks;

#[derive(Debug, Clone)]
pub struct LockCreate {
    pub scene_id: i64,
    pub character_id: i64,
    pub user_id: i64,
    pub acquired_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub is_hidden: bool,
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
) -> Result<Option<compose_locks::Model>, sea_orm::DbErr> {
    compose_locks::Entity::find_by_id(lock_id).one(conn).await
}

pub async fn find_by_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Option<compose_locks::Model>, sea_orm::DbErr> {
    compose_locks::Entity::find()
        .filter(compose_locks::Column::SceneId.eq(scene_id))
        .one(conn)
        .await
}

pub async fn list_by_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<compose_locks::Model>, sea_orm::DbErr> {
    if scene_ids.is_empty() {
        return Ok(Vec::new());
    }
    compose_locks::Entity::find()
        .filter(compose_locks::Column::SceneId.is_in(scene_ids))
        .order_by_asc(compose_locks::Column::Id)
        .all(conn)
        .await
}

/// Insert a lock row. The unique index on `scene_id` rejects a second row
/// for the same scene.
pub async fn insert_lock<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: LockCreate,
) -> Result<compose_locks::Model, sea_orm::DbErr> {
    compose_locks::ActiveModel {
        id: NotSet,
        scene_id: Set(dto.scene_id),
        character_id: Set(dto.character_id),
        user_id: Set(dto.user_id),
        acquired_at: Set(dto.acquired_at),
        expires_at: Set(dto.expires_at),
        is_hidden: Set(dto.is_hidden),
    }
    .insert(conn)
    .await
}

pub async fn set_expires_at<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
    expires_at: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    let result = compose_locks::Entity::update_many()
        .col_expr(compose_locks::Column::ExpiresAt, Expr::value(expires_at))
        .filter(compose_locks::Column::Id.eq(lock_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn set_hidden<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
    is_hidden: bool,
) -> Result<u64, sea_orm::DbErr> {
    let result = compose_locks::Entity::update_many()
        .col_expr(compose_locks::Column::IsHidden, Expr::value(is_hidden))
        .filter(compose_locks::Column::Id.eq(lock_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = compose_locks::Entity::delete_by_id(lock_id).exec(conn).await?;
    Ok(result.rows_affected)
}

