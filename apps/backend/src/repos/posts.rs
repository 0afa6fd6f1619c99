//! Post repository functions for domain layer.

use sea_orm::ConnectionTrait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::adapters::posts_sea::{self as posts_adapter, PostCreate, PostUpdate};
use crate::entities::posts;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Narrative,
    Dialogue,
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBlock {
    pub kind: BlockKind,
    pub content: String,
}

impl PostBlock {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub scene_id: i64,
    pub character_id: Option<i64>,
    pub user_id: i64,
    pub blocks: Vec<PostBlock>,
    pub ooc_text: Option<String>,
    pub witnesses: Vec<i64>,
    pub is_hidden: bool,
    pub is_draft: bool,
    pub is_locked: bool,
    pub awaiting_reveal: bool,
    pub intention: Option<String>,
    pub modifier: Option<i32>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn decode_list<T: DeserializeOwned>(value: serde_json::Value, post_id: i64, field: &str) -> Vec<T> {
    serde_json::from_value(value).unwrap_or_else(|err| {
        // An unreadable witness list hides the post rather than exposing it.
        warn!(post_id, field, error = %err, "malformed JSON column; treating as empty");
        Vec::new()
    })
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            scene_id: model.scene_id,
            character_id: model.character_id,
            user_id: model.user_id,
            blocks: decode_list(model.blocks, model.id, "blocks"),
            ooc_text: model.ooc_text,
            witnesses: decode_list(model.witnesses, model.id, "witnesses"),
            is_hidden: model.is_hidden,
            is_draft: model.is_draft,
            is_locked: model.is_locked,
            awaiting_reveal: model.awaiting_reveal,
            intention: model.intention,
            modifier: model.modifier,
            submitted_at: model.submitted_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn encode_blocks(blocks: &[PostBlock]) -> serde_json::Value {
    serde_json::Value::Array(
        blocks
            .iter()
            .map(|block| {
                serde_json::json!({
                    "kind": block.kind,
                    "content": block.content,
                })
            })
            .collect(),
    )
}

pub fn encode_witnesses(witnesses: &[i64]) -> serde_json::Value {
    serde_json::Value::Array(witnesses.iter().map(|id| serde_json::Value::from(*id)).collect())
}

fn post_not_found(post_id: i64) -> DomainError {
    DomainError::not_found(NotFoundKind::Post, format!("Post {post_id} not found"))
}

pub async fn require_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
) -> Result<Post, DomainError> {
    posts_adapter::find_by_id(conn, post_id)
        .await?
        .map(Post::from)
        .ok_or_else(|| post_not_found(post_id))
}

pub async fn find_draft<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    user_id: i64,
) -> Result<Option<Post>, DomainError> {
    let row = posts_adapter::find_draft(conn, scene_id, user_id).await?;
    Ok(row.map(Post::from))
}

pub async fn list_submitted<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<Post>, DomainError> {
    let rows = posts_adapter::list_submitted(conn, scene_id).await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

pub async fn latest_submitted<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Option<Post>, DomainError> {
    let row = posts_adapter::latest_submitted(conn, scene_id).await?;
    Ok(row.map(Post::from))
}

pub async fn list_awaiting_reveal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<Post>, DomainError> {
    let rows = posts_adapter::list_awaiting_reveal(conn, scene_ids).await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

pub async fn list_hidden<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<Post>, DomainError> {
    let rows = posts_adapter::list_hidden(conn, scene_id).await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

pub async fn create_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: PostCreate,
    now: OffsetDateTime,
) -> Result<Post, DomainError> {
    let row = posts_adapter::create_post(conn, dto, now).await?;
    Ok(Post::from(row))
}

pub async fn update_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    dto: PostUpdate,
    now: OffsetDateTime,
) -> Result<Post, DomainError> {
    let existing = posts_adapter::find_by_id(conn, post_id)
        .await?
        .ok_or_else(|| post_not_found(post_id))?;
    let row = posts_adapter::update_post(conn, existing, dto, now).await?;
    Ok(Post::from(row))
}

pub async fn set_locked<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    locked: bool,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    posts_adapter::set_locked(conn, post_id, locked, now).await?;
    Ok(())
}

pub async fn reveal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    witnesses: &[i64],
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    posts_adapter::reveal(conn, post_id, encode_witnesses(witnesses), now).await?;
    Ok(())
}

pub async fn delete_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
) -> Result<(), DomainError> {
    if posts_adapter::delete_post(conn, post_id).await? == 0 {
        return Err(post_not_found(post_id));
    }
    Ok(())
}
