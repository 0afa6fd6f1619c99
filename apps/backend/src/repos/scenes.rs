//! Scene and roster repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::scenes_sea as scenes_adapter;
use crate::entities::{scene_characters, scenes};
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    pub id: i64,
    pub campaign_id: i64,
    pub title: String,
    pub is_archived: bool,
}

impl From<scenes::Model> for Scene {
    fn from(model: scenes::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            title: model.title,
            is_archived: model.is_archived,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub character_id: i64,
    pub position: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

impl From<scene_characters::Model> for RosterEntry {
    fn from(model: scene_characters::Model) -> Self {
        Self {
            character_id: model.character_id,
            position: model.position,
            joined_at: model.joined_at,
        }
    }
}

pub async fn require_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Scene, DomainError> {
    scenes_adapter::find_by_id(conn, scene_id)
        .await?
        .map(Scene::from)
        .ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Scene, format!("Scene {scene_id} not found"))
        })
}

pub async fn list_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<Scene>, DomainError> {
    let rows = scenes_adapter::list_active(conn, campaign_id).await?;
    Ok(rows.into_iter().map(Scene::from).collect())
}

pub async fn list_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<Scene>, DomainError> {
    let rows = scenes_adapter::list_all(conn, campaign_id).await?;
    Ok(rows.into_iter().map(Scene::from).collect())
}

/// Ids of every scene in the campaign, archived ones included.
pub async fn all_ids<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<i64>, DomainError> {
    Ok(list_all(conn, campaign_id)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect())
}

pub async fn create_scene<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    title: &str,
    now: OffsetDateTime,
) -> Result<Scene, DomainError> {
    let row = scenes_adapter::create_scene(conn, campaign_id, title, now).await?;
    Ok(Scene::from(row))
}

pub async fn set_archived<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    archived: bool,
) -> Result<(), DomainError> {
    scenes_adapter::set_archived(conn, scene_id, archived).await?;
    Ok(())
}

pub async fn roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<RosterEntry>, DomainError> {
    let rows = scenes_adapter::list_roster(conn, scene_id).await?;
    Ok(rows.into_iter().map(RosterEntry::from).collect())
}

/// Character ids of the roster, in roster order.
pub async fn roster_ids<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<i64>, DomainError> {
    Ok(roster(conn, scene_id)
        .await?
        .into_iter()
        .map(|entry| entry.character_id)
        .collect())
}

pub async fn is_in_roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<bool, DomainError> {
    Ok(scenes_adapter::find_roster_entry(conn, scene_id, character_id)
        .await?
        .is_some())
}

pub async fn add_to_roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
    position: i32,
    now: OffsetDateTime,
) -> Result<RosterEntry, DomainError> {
    let row = scenes_adapter::add_to_roster(conn, scene_id, character_id, position, now).await?;
    Ok(RosterEntry::from(row))
}

/// Returns whether a roster row was removed.
pub async fn remove_from_roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<bool, DomainError> {
    Ok(scenes_adapter::remove_from_roster(conn, scene_id, character_id).await? > 0)
}
