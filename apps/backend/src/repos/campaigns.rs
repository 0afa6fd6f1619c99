//! Campaign and membership repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::campaigns_sea::{self as campaigns_adapter, CampaignCreate, CampaignUpdate};
use crate::adapters::memberships_sea as memberships_adapter;
use crate::entities::campaign_members::{self, MemberRole};
use crate::entities::campaigns::{self, CampaignPhase};
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub created_by: i64,
    pub phase: CampaignPhase,
    #[serde(with = "time::serde::rfc3339")]
    pub phase_started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub phase_expires_at: Option<OffsetDateTime>,
    pub is_paused: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub paused_at: Option<OffsetDateTime>,
    pub time_gate_secs: Option<i64>,
    pub lock_version: i32,
}

impl From<campaigns::Model> for Campaign {
    fn from(model: campaigns::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_by: model.created_by,
            phase: model.phase,
            phase_started_at: model.phase_started_at,
            phase_expires_at: model.phase_expires_at,
            is_paused: model.is_paused,
            paused_at: model.paused_at,
            time_gate_secs: model.time_gate_secs,
            lock_version: model.lock_version,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub campaign_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
}

impl Membership {
    pub fn is_gm(&self) -> bool {
        self.role == MemberRole::Gm
    }
}

impl From<campaign_members::Model> for Membership {
    fn from(model: campaign_members::Model) -> Self {
        Self {
            campaign_id: model.campaign_id,
            user_id: model.user_id,
            role: model.role,
        }
    }
}

pub async fn require_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Campaign, DomainError> {
    campaigns_adapter::find_by_id(conn, campaign_id)
        .await?
        .map(Campaign::from)
        .ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Campaign,
                format!("Campaign {campaign_id} not found"),
            )
        })
}

pub async fn create_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CampaignCreate,
    now: OffsetDateTime,
) -> Result<Campaign, DomainError> {
    let campaign = campaigns_adapter::create_campaign(conn, dto, now).await?;
    Ok(Campaign::from(campaign))
}

/// Update with optimistic locking; a stale `expected_version` surfaces as
/// `Conflict(OptimisticLock)`.
pub async fn update_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CampaignUpdate,
    now: OffsetDateTime,
) -> Result<Campaign, DomainError> {
    let campaign = campaigns_adapter::update_campaign(conn, dto, now).await?;
    Ok(Campaign::from(campaign))
}

pub async fn find_membership<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
) -> Result<Option<Membership>, DomainError> {
    let membership = memberships_adapter::find_membership(conn, campaign_id, user_id).await?;
    Ok(membership.map(Membership::from))
}

pub async fn create_membership<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    user_id: i64,
    role: MemberRole,
    now: OffsetDateTime,
) -> Result<Membership, DomainError> {
    let membership =
        memberships_adapter::create_membership(conn, campaign_id, user_id, role, now).await?;
    Ok(Membership::from(membership))
}
