//! Compose lock repository functions.
//!
//! These return rows whether or not they have expired; callers decide
//! liveness with `services::compose_locks::is_active`.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::compose_locks_sea::{self as locks_adapter, LockCreate};
use crate::entities::compose_locks;
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposeLock {
    pub id: i64,
    pub scene_id: i64,
    pub character_id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub acquired_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub is_hidden: bool,
}

impl From<compose_locks::Model> for ComposeLock {
    fn from(model: compose_locks::Model) -> Self {
        Self {
            id: model.id,
            scene_id: model.scene_id,
            character_id: model.character_id,
            user_id: model.user_id,
            acquired_at: model.acquired_at,
            expires_at: model.expires_at,
            is_hidden: model.is_hidden,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
) -> Result<Option<ComposeLock>, DomainError> {
    Ok(locks_adapter::find_by_id(conn, lock_id)
        .await?
        .map(ComposeLock::from))
}

pub async fn find_by_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Option<ComposeLock>, DomainError> {
    Ok(locks_adapter::find_by_scene(conn, scene_id)
        .await?
        .map(ComposeLock::from))
}

pub async fn list_by_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<ComposeLock>, DomainError> {
    let rows = locks_adapter::list_by_scenes(conn, scene_ids).await?;
    Ok(rows.into_iter().map(ComposeLock::from).collect())
}

pub async fn insert_lock<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: LockCreate,
) -> Result<ComposeLock, DomainError> {
    Ok(ComposeLock::from(locks_adapter::insert_lock(conn, dto).await?))
}

pub async fn set_expires_at<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
    expires_at: OffsetDateTime,
) -> Result<(), DomainError> {
    locks_adapter::set_expires_at(conn, lock_id, expires_at).await?;
    Ok(())
}

pub async fn set_hidden<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
    is_hidden: bool,
) -> Result<(), DomainError> {
    locks_adapter::set_hidden(conn, lock_id, is_hidden).await?;
    Ok(())
}

pub async fn delete_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
) -> Result<bool, DomainError> {
    Ok(locks_adapter::delete_by_id(conn, lock_id).await? > 0)
}

