//! SeaORM adapter for posts.
//!
//! Ordering of submitted posts is `(submitted_at, id)`. It is applied in
//! memory after loading a scene's posts so that SQLite's text timestamps
//! never decide the order.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::posts;

pub mod dto;

pub use dto::{PostCreate, PostUpdate};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
) -> Result<Option<posts::Model>, sea_orm::DbErr> {
    posts::Entity::find_by_id(post_id).one(conn).await
}

/// The caller's unsubmitted draft in a scene.
pub async fn find_draft<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    user_id: i64,
) -> Result<Option<posts::Model>, sea_orm::DbErr> {
    posts::Entity::find()
        .filter(posts::Column::SceneId.eq(scene_id))
        .filter(posts::Column::UserId.eq(user_id))
        .filter(posts::Column::IsDraft.eq(true))
        .one(conn)
        .await
}

/// Submitted (non-draft) posts of one scene in display order.
pub async fn list_submitted<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<posts::Model>, sea_orm::DbErr> {
    let mut rows = posts::Entity::find()
        .filter(posts::Column::SceneId.eq(scene_id))
        .filter(posts::Column::IsDraft.eq(false))
        .order_by_asc(posts::Column::Id)
        .all(conn)
        .await?;
    rows.sort_by_key(|p| (p.submitted_at, p.id));
    Ok(rows)
}

/// Most recent submitted post of a scene, if any.
pub async fn latest_submitted<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Option<posts::Model>, sea_orm::DbErr> {
    Ok(list_submitted(conn, scene_id).await?.pop())
}

/// Submitted narration across the given scenes still waiting for its
/// witnesses.
pub async fn list_awaiting_reveal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<posts::Model>, sea_orm::DbErr> {
    if scene_ids.is_empty() {
        return Ok(Vec::new());
    }
    posts::Entity::find()
        .filter(posts::Column::SceneId.is_in(scene_ids))
        .filter(posts::Column::IsDraft.eq(false))
        .filter(posts::Column::AwaitingReveal.eq(true))
        .order_by_asc(posts::Column::Id)
        .all(conn)
        .await
}

pub async fn list_hidden<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
) -> Result<Vec<posts::Model>, sea_orm::DbErr> {
    let mut rows = posts::Entity::find()
        .filter(posts::Column::SceneId.eq(scene_id))
        .filter(posts::Column::IsDraft.eq(false))
        .filter(posts::Column::IsHidden.eq(true))
        .all(conn)
        .await?;
    rows.sort_by_key(|p| (p.submitted_at, p.id));
    Ok(rows)
}

pub async fn create_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: PostCreate,
    now: OffsetDateTime,
) -> Result<posts::Model, sea_orm::DbErr> {
    posts::ActiveModel {
        id: NotSet,
        scene_id: Set(dto.scene_id),
        character_id: Set(dto.character_id),
        user_id: Set(dto.user_id),
        blocks: Set(dto.blocks),
        ooc_text: Set(dto.ooc_text),
        witnesses: Set(dto.witnesses),
        is_hidden: Set(dto.is_hidden),
        is_draft: Set(dto.submitted_at.is_none()),
        is_locked: Set(false),
        awaiting_reveal: Set(dto.awaiting_reveal),
        intention: Set(dto.intention),
        modifier: Set(dto.modifier),
        submitted_at: Set(dto.submitted_at),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn update_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    existing: posts::Model,
    dto: PostUpdate,
    now: OffsetDateTime,
) -> Result<posts::Model, sea_orm::DbErr> {
    let mut active = existing.into_active_model();
    if let Some(character_id) = dto.character_id {
        active.character_id = Set(character_id);
    }
    if let Some(blocks) = dto.blocks {
        active.blocks = Set(blocks);
    }
    if let Some(ooc_text) = dto.ooc_text {
        active.ooc_text = Set(ooc_text);
    }
    if let Some(witnesses) = dto.witnesses {
        active.witnesses = Set(witnesses);
    }
    if let Some(is_hidden) = dto.is_hidden {
        active.is_hidden = Set(is_hidden);
    }
    if let Some(awaiting) = dto.awaiting_reveal {
        active.awaiting_reveal = Set(awaiting);
    }
    if let Some(intention) = dto.intention {
        active.intention = Set(intention);
    }
    if let Some(modifier) = dto.modifier {
        active.modifier = Set(modifier);
    }
    if let Some(submitted_at) = dto.submitted_at {
        active.is_draft = Set(false);
        active.submitted_at = Set(Some(submitted_at));
    }
    active.updated_at = Set(now);
    active.update(conn).await
}

pub async fn set_locked<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    locked: bool,
    now: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    let result = posts::Entity::update_many()
        .col_expr(posts::Column::IsLocked, Expr::value(locked))
        .col_expr(posts::Column::UpdatedAt, Expr::value(now))
        .filter(posts::Column::Id.eq(post_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Stamp the witnesses of held-back narration and clear its marker.
pub async fn reveal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
    witnesses: serde_json::Value,
    now: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    let result = posts::Entity::update_many()
        .col_expr(posts::Column::Witnesses, Expr::value(witnesses))
        .col_expr(posts::Column::AwaitingReveal, Expr::value(false))
        .col_expr(posts::Column::UpdatedAt, Expr::value(now))
        .filter(posts::Column::Id.eq(post_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_post<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    post_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = posts::Entity::delete_by_id(post_id).exec(conn).await?;
    Ok(result.rows_affected)
}
