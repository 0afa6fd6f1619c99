//! SeaORM adapter for campaigns - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::campaigns;

pub mod dto;

pub use dto::{CampaignCreate, CampaignUpdate};

/// Apply an update guarded by `lock_version`, then refetch.
///
/// Bumps `lock_version` and `updated_at` alongside the caller's columns.
/// Zero affected rows means either the row is gone (`RecordNotFound`) or
/// somebody else won the race (`OPTIMISTIC_LOCK:` custom error carrying the
/// expected and actual versions).
async fn optimistic_update_then_fetch<C, F>(
    conn: &C,
    id: i64,
    expected_version: i32,
    now: time::OffsetDateTime,
    configure_update: F,
) -> Result<campaigns::Model, sea_orm::DbErr>
where
    C: ConnectionTrait + Send + Sync,
    F: FnOnce(sea_orm::UpdateMany<campaigns::Entity>) -> sea_orm::UpdateMany<campaigns::Entity>,
{
    let result = configure_update(campaigns::Entity::update_many())
        .col_expr(campaigns::Column::UpdatedAt, Expr::value(now))
        .col_expr(
            campaigns::Column::LockVersion,
            Expr::col(campaigns::Column::LockVersion).add(1),
        )
        .filter(campaigns::Column::Id.eq(id))
        .filter(campaigns::Column::LockVersion.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match find_by_id(conn, id).await? {
            Some(current) => Err(sea_orm::DbErr::Custom(format!(
                "OPTIMISTIC_LOCK:{{\"expected\":{},\"actual\":{}}}",
                expected_version, current.lock_version
            ))),
            None => Err(sea_orm::DbErr::RecordNotFound(
                "Campaign not found".to_string(),
            )),
        };
    }

    require_campaign(conn, id).await
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Option<campaigns::Model>, sea_orm::DbErr> {
    campaigns::Entity::find_by_id(campaign_id).one(conn).await
}

pub async fn require_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<campaigns::Model, sea_orm::DbErr> {
    find_by_id(conn, campaign_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Campaign not found".to_string()))
}

pub async fn create_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CampaignCreate,
    now: time::OffsetDateTime,
) -> Result<campaigns::Model, sea_orm::DbErr> {
    campaigns::ActiveModel {
        id: NotSet,
        name: Set(dto.name),
        created_by: Set(dto.created_by),
        phase: Set(campaigns::CampaignPhase::GmPhase),
        phase_started_at: Set(now),
        phase_expires_at: Set(None),
        is_paused: Set(false),
        paused_at: Set(None),
        time_gate_secs: Set(dto.time_gate_secs),
        lock_version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn update_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CampaignUpdate,
    now: time::OffsetDateTime,
) -> Result<campaigns::Model, sea_orm::DbErr> {
    optimistic_update_then_fetch(conn, dto.id, dto.expected_version, now, |mut update| {
        if let Some(phase) = dto.phase {
            update = update.col_expr(campaigns::Column::Phase, Expr::value(phase));
        }
        if let Some(started) = dto.phase_started_at {
            update = update.col_expr(campaigns::Column::PhaseStartedAt, Expr::value(started));
        }
        if let Some(expires) = dto.phase_expires_at {
            update = update.col_expr(campaigns::Column::PhaseExpiresAt, Expr::value(expires));
        }
        if let Some(paused) = dto.is_paused {
            update = update.col_expr(campaigns::Column::IsPaused, Expr::value(paused));
        }
        if let Some(paused_at) = dto.paused_at {
            update = update.col_expr(campaigns::Column::PausedAt, Expr::value(paused_at));
        }
        update
    })
    .await
}
