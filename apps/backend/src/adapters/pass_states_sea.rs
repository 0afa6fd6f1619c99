//! SeaORM adapter for pass states. A missing row reads as `none`.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};
use time::OffsetDateTime;

use crate::entities::pass_states::{self, PassState};

pub async fn find<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<Option<pass_states::Model>, sea_orm::DbErr> {
    pass_states::Entity::find()
        .filter(pass_states::Column::SceneId.eq(scene_id))
        .filter(pass_states::Column::CharacterId.eq(character_id))
        .one(conn)
        .await
}

pub async fn list_by_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
) -> Result<Vec<pass_states::Model>, sea_orm::DbErr> {
    if scene_ids.is_empty() {
        return Ok(Vec::new());
    }
    pass_states::Entity::find()
        .filter(pass_states::Column::SceneId.is_in(scene_ids))
        .order_by_asc(pass_states::Column::Id)
        .all(conn)
        .await
}

/// Insert or update the row for `(scene_id, character_id)`.
pub async fn upsert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
    state: PassState,
    now: OffsetDateTime,
) -> Result<pass_states::Model, sea_orm::DbErr> {
    match find(conn, scene_id, character_id).await? {
        Some(existing) => {
            let mut active: pass_states::ActiveModel = existing.into();
            active.state = Set(state);
            active.updated_at = Set(now);
            active.update(conn).await
        }
        None => {
            pass_states::ActiveModel {
                id: NotSet,
                scene_id: Set(scene_id),
                character_id: Set(character_id),
                state: Set(state),
                updated_at: Set(now),
            }
            .insert(conn)
            .await
        }
    }
}

/// Set `passed` back to `none` for one character; `hard_passed` is untouched.
pub async fn clear_soft_pass<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
    now: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    let result = pass_states::Entity::update_many()
        .col_expr(pass_states::Column::State, Expr::value(PassState::None))
        .col_expr(pass_states::Column::UpdatedAt, Expr::value(now))
        .filter(pass_states::Column::SceneId.eq(scene_id))
        .filter(pass_states::Column::CharacterId.eq(character_id))
        .filter(pass_states::Column::State.eq(PassState::Passed))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Reset every pass row in the given scenes to `none`.
pub async fn reset_scenes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_ids: Vec<i64>,
    now: OffsetDateTime,
) -> Result<u64, sea_orm::DbErr> {
    if scene_ids.is_empty() {
        return Ok(0);
    }
    let result = pass_states::Entity::update_many()
        .col_expr(pass_states::Column::State, Expr::value(PassState::None))
        .col_expr(pass_states::Column::UpdatedAt, Expr::value(now))
        .filter(pass_states::Column::SceneId.is_in(scene_ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    scene_id: i64,
    character_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = pass_states::Entity::delete_many()
        .filter(pass_states::Column::SceneId.eq(scene_id))
        .filter(pass_states::Column::CharacterId.eq(character_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
