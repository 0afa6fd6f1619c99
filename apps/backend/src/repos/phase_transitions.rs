use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::phase_transitions_sea as transitions_adapter;
use crate::entities::campaigns::CampaignPhase;
use crate::entities::phase_transitions::{self, TransitionReason};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub id: i64,
    pub campaign_id: i64,
    pub from_phase: CampaignPhase,
    pub to_phase: CampaignPhase,
    pub triggered_by: i64,
    pub reason: TransitionReason,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<phase_transitions::Model> for PhaseTransition {
    fn from(model: phase_transitions::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            from_phase: model.from_phase,
            to_phase: model.to_phase,
            triggered_by: model.triggered_by,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

pub async fn record<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
    from: CampaignPhase,
    to: CampaignPhase,
    triggered_by: i64,
    reason: TransitionReason,
    now: OffsetDateTime,
) -> Result<PhaseTransition, DomainError> {
    let row =
        transitions_adapter::record(conn, campaign_id, from, to, triggered_by, reason, now)
            .await?;
    Ok(PhaseTransition::from(row))
}

pub async fn list_for_campaign<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    campaign_id: i64,
) -> Result<Vec<PhaseTransition>, DomainError> {
    let rows = transitions_adapter::list_for_campaign(conn, campaign_id).await?;
    Ok(rows.into_iter().map(PhaseTransition::from).collect())
}
