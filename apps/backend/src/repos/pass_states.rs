use std::collections::HashMap;

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::pass_states_sea as pass_adapter;
use crate::entities::pass_states::{self, PassState};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassEntry {
    pub scene_id: i64,
    pub character_id: i64,
    pub state: PassState,
}

impl From<pass_states::Model> for PassEntry {
    fn from(model: pass_states::Model) -> Self {
        Self {
            scene_id: model.scene_id,
            character_id: model.character_id,
            state: model.state,
        }
    }
}

/// Stored states keyed by `(scene_id, character_id)`. Absent keys are `none`.
pub async fn states_for_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<HashMap<(i64, i64), PassState>, DomainError> {
    let rows = pass_adapter::list_by_scenes(conn, scene_ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| ((row.scene_id, row.character_id), row.state))
        .collect())
}

pub async fn set_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
    state: PassState,
    now: OffsetDateTime,
) -> Result<PassEntry, DomainError> {
    let row = pass_adapter::upsert(conn, scene_id, character_id, state, now).await?;
    Ok(PassEntry::from(row))
}

/// Returns whether a `passed` row was cleared.
pub async fn clear_soft_pass<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
    now: OffsetDateTime,
) -> Result<bool, DomainError> {
    Ok(pass_adapter::clear_soft_pass(conn, scene_id, character_id, now).await? > 0)
}

pub async fn reset_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
    now: OffsetDateTime,
) -> Result<u64, DomainError> {
    Ok(pass_adapter::reset_scenes(conn, scene_ids, now).await?)
}

pub async fn delete<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<(), DomainError> {
    pass_adapter::delete(conn, scene_id, character_id).await?;
    Ok(())
}
