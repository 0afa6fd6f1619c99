//! Roll repository functions for domain layer.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::adapters::rolls_sea::{self as rolls_adapter, RollCreate, RollUpdate};
use crate::entities::rolls::{self, RollStatus};
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roll {
    pub id: i64,
    pub post_id: Option<i64>,
    pub scene_id: i64,
    pub character_id: i64,
    pub requested_by: i64,
    pub intention: String,
    pub original_intention: Option<String>,
    pub modifier: i32,
    pub dice_type: i32,
    pub dice_count: i32,
    pub result: Vec<i32>,
    pub total: Option<i32>,
    pub status: RollStatus,
    pub was_overridden: bool,
    pub overridden_by: Option<i64>,
    pub override_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub overridden_at: Option<OffsetDateTime>,
    pub manual_result: Option<i32>,
    pub manually_resolved_by: Option<i64>,
    pub manual_resolution_reason: Option<String>,
    pub invalidated_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub invalidated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub rolled_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<rolls::Model> for Roll {
    fn from(model: rolls::Model) -> Self {
        let result = serde_json::from_value(model.result).unwrap_or_else(|err| {
            warn!(roll_id = model.id, error = %err, "malformed roll result; treating as empty");
            Vec::new()
        });
        Self {
            id: model.id,
            post_id: model.post_id,
            scene_id: model.scene_id,
            character_id: model.character_id,
            requested_by: model.requested_by,
            intention: model.intention,
            original_intention: model.original_intention,
            modifier: model.modifier,
            dice_type: model.dice_type,
            dice_count: model.dice_count,
            result,
            total: model.total,
            status: model.status,
            was_overridden: model.was_overridden,
            overridden_by: model.overridden_by,
            override_reason: model.override_reason,
            overridden_at: model.overridden_at,
            manual_result: model.manual_result,
            manually_resolved_by: model.manually_resolved_by,
            manual_resolution_reason: model.manual_resolution_reason,
            invalidated_by: model.invalidated_by,
            invalidated_at: model.invalidated_at,
            rolled_at: model.rolled_at,
            created_at: model.created_at,
        }
    }
}

fn roll_not_found(roll_id: i64) -> DomainError {
    DomainError::not_found(NotFoundKind::Roll, format!("Roll {roll_id} not found"))
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    roll_id: i64,
) -> Result<Option<Roll>, DomainError> {
    Ok(rolls_adapter::find_by_id(conn, roll_id).await?.map(Roll::from))
}

pub async fn require_roll<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    roll_id: i64,
) -> Result<Roll, DomainError> {
    find_by_id(conn, roll_id)
        .await?
        .ok_or_else(|| roll_not_found(roll_id))
}

pub async fn create_roll<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RollCreate,
    now: OffsetDateTime,
) -> Result<Roll, DomainError> {
    Ok(Roll::from(rolls_adapter::create_roll(conn, dto, now).await?))
}

pub async fn update_roll<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    roll_id: i64,
    dto: RollUpdate,
    now: OffsetDateTime,
) -> Result<Roll, DomainError> {
    let existing = rolls_adapter::find_by_id(conn, roll_id)
        .await?
        .ok_or_else(|| roll_not_found(roll_id))?;
    Ok(Roll::from(
        rolls_adapter::update_roll(conn, existing, dto, now).await?,
    ))
}

/// Returns `false` when the roll was no longer pending.
pub async fn complete_if_pending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    roll_id: i64,
    faces: &[i32],
    total: i32,
    now: OffsetDateTime,
) -> Result<bool, DomainError> {
    Ok(rolls_adapter::complete_if_pending(conn, roll_id, faces, total, now).await? > 0)
}

pub async fn list_by_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
) -> Result<Vec<Roll>, DomainError> {
    let rows = rolls_adapter::list_by_post(conn, post_id).await?;
    Ok(rows.into_iter().map(Roll::from).collect())
}

pub async fn list_by_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<Roll>, DomainError> {
    let rows = rolls_adapter::list_by_scene(conn, scene_id).await?;
    Ok(rows.into_iter().map(Roll::from).collect())
}

pub async fn list_pending_for_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<Vec<Roll>, DomainError> {
    let rows = rolls_adapter::list_pending_for_character(conn, scene_id, character_id).await?;
    Ok(rows.into_iter().map(Roll::from).collect())
}

pub async fn has_pending_for_character<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    character_id: i64,
) -> Result<bool, DomainError> {
    Ok(rolls_adapter::count_pending_for_character(conn, character_id).await? > 0)
}

pub async fn list_pending_in_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<Roll>, DomainError> {
    let rows = rolls_adapter::list_pending_in_scenes(conn, scene_ids).await?;
    Ok(rows.into_iter().map(Roll::from).collect())
}

pub async fn clear_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    now: OffsetDateTime,
) -> Result<u64, DomainError> {
    Ok(rolls_adapter::clear_post(conn, post_id, now).await?)
}
