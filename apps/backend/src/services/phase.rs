//! Campaign phase state machine: gm_phase ↔ pc_phase.
//!
//! A pc_phase → gm_phase transition is vetoed by live compose locks, pending
//! rolls and unpassed characters unless forced. Every transition back-fills
//! the witness lists of private GM narration, updates the campaign under
//! optimistic locking and writes an audit row, all in the caller's
//! transaction.

use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::adapters::campaigns_sea::CampaignUpdate;
use crate::entities::campaigns::CampaignPhase;
use crate::entities::phase_transitions::TransitionReason;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::events::{CoordinationEvent, Outcome};
use crate::infra::clock::Clock;
use crate::repos::campaigns::{self, Campaign};
use crate::repos::pass_states;
use crate::repos::phase_transitions::{self, PhaseTransition};
use crate::repos::scenes;
use crate::services::access;
use crate::services::compose_locks::ComposeLockService;
use crate::services::passes::PassService;
use crate::services::rolls::RollService;
use crate::services::witnesses::WitnessResolver;
use crate::state::app_state::AppState;

/// What currently stands in the way of leaving pc_phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuardReport {
    pub active_locks: usize,
    pub pending_rolls: usize,
    pub unpassed_character_ids: Vec<i64>,
}

impl GuardReport {
    pub fn is_clear(&self) -> bool {
        self.first_failure().is_none()
    }

    /// The first failing guard, checked in a fixed order: locks, rolls,
    /// passes.
    pub fn first_failure(&self) -> Option<DomainError> {
        if self.active_locks > 0 {
            return Some(DomainError::conflict(
                ConflictKind::ActiveComposeLocks,
                format!(
                    "{} compose lock(s) are still active in this campaign",
                    self.active_locks
                ),
            ));
        }
        if self.pending_rolls > 0 {
            return Some(DomainError::conflict(
                ConflictKind::PendingRolls,
                format!("{} roll(s) are still pending", self.pending_rolls),
            ));
        }
        if !self.unpassed_character_ids.is_empty() {
            return Some(DomainError::conflict(
                ConflictKind::NotAllPassed,
                format!(
                    "Characters {:?} have not passed",
                    self.unpassed_character_ids
                ),
            ));
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStatus {
    pub campaign_id: i64,
    pub phase: CampaignPhase,
    #[serde(with = "time::serde::rfc3339")]
    pub phase_started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub phase_expires_at: Option<OffsetDateTime>,
    pub is_paused: bool,
    pub is_expired: bool,
    pub guards: GuardReport,
}

/// A pc_phase deadline has passed. While paused the countdown is frozen at
/// the pause instant.
pub fn is_expired(campaign: &Campaign, now: OffsetDateTime) -> bool {
    if campaign.phase != CampaignPhase::PcPhase {
        return false;
    }
    let reference = if campaign.is_paused {
        campaign.paused_at.unwrap_or(now)
    } else {
        now
    };
    campaign
        .phase_expires_at
        .is_some_and(|expires| reference >= expires)
}

#[derive(Clone)]
pub struct PhaseService {
    clock: Arc<dyn Clock>,
    default_gate: std::time::Duration,
    locks: ComposeLockService,
}

impl PhaseService {
    pub fn new(
        clock: Arc<dyn Clock>,
        default_gate: std::time::Duration,
        locks: ComposeLockService,
    ) -> Self {
        Self {
            clock,
            default_gate,
            locks,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.clock),
            state.coordination.default_time_gate,
            ComposeLockService::from_state(state),
        )
    }

    fn gate_for(&self, campaign: &Campaign) -> Duration {
        match campaign.time_gate_secs {
            Some(secs) => Duration::seconds(secs),
            None => Duration::try_from(self.default_gate).unwrap_or(Duration::DAY),
        }
    }

    pub async fn guard_report(
        &self,
        txn: &DatabaseTransaction,
        campaign_id: i64,
    ) -> Result<GuardReport, DomainError> {
        let active_locks = self.locks.active_in_campaign(txn, campaign_id).await?.len();
        let pending_rolls = RollService::pending_in_campaign(txn, campaign_id)
            .await?
            .len();
        let unpassed_character_ids = PassService::unpassed_characters(txn, campaign_id).await?;
        Ok(GuardReport {
            active_locks,
            pending_rolls,
            unpassed_character_ids,
        })
    }

    pub async fn get_status(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<PhaseStatus, AppError> {
        let campaign = campaigns::require_campaign(txn, campaign_id).await?;
        access::require_member(txn, campaign_id, user_id).await?;
        let guards = self.guard_report(txn, campaign_id).await?;
        Ok(PhaseStatus {
            campaign_id,
            phase: campaign.phase,
            phase_started_at: campaign.phase_started_at,
            phase_expires_at: campaign.phase_expires_at,
            is_paused: campaign.is_paused,
            is_expired: is_expired(&campaign, self.clock.now()),
            guards,
        })
    }

    /// Audit trail of transitions, oldest first.
    pub async fn history(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<Vec<PhaseTransition>, AppError> {
        campaigns::require_campaign(txn, campaign_id).await?;
        access::require_member(txn, campaign_id, user_id).await?;
        Ok(phase_transitions::list_for_campaign(txn, campaign_id).await?)
    }

    pub async fn transition(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
        to: CampaignPhase,
    ) -> Result<Outcome<Campaign>, AppError> {
        self.apply(txn, user_id, campaign_id, to, false).await
    }

    /// Same as [`transition`](Self::transition) but skips the lock, roll and
    /// pass guards. A paused campaign still refuses.
    pub async fn force_transition(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
        to: CampaignPhase,
    ) -> Result<Outcome<Campaign>, AppError> {
        self.apply(txn, user_id, campaign_id, to, true).await
    }

    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
        to: CampaignPhase,
        forced: bool,
    ) -> Result<Outcome<Campaign>, AppError> {
        let campaign = campaigns::require_campaign(txn, campaign_id).await?;
        access::require_gm(txn, campaign_id, user_id).await?;

        if campaign.is_paused {
            return Err(DomainError::conflict(
                ConflictKind::CampaignPaused,
                format!("Campaign {campaign_id} is paused"),
            )
            .into());
        }
        let from = campaign.phase;
        if from == to {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyInPhase,
                format!("Campaign {campaign_id} is already in {}", to.as_str()),
            )
            .into());
        }
        if !forced && to == CampaignPhase::GmPhase {
            if let Some(err) = self.guard_report(txn, campaign_id).await?.first_failure() {
                return Err(err.into());
            }
        }

        let now = self.clock.now();
        let mut events = Vec::new();

        if from == CampaignPhase::GmPhase {
            for (scene_id, post_id) in
                WitnessResolver::backfill_campaign(txn, campaign_id, now).await?
            {
                events.push(CoordinationEvent::PostUpdated {
                    campaign_id,
                    scene_id,
                    post_id,
                });
            }
        }

        let expires_at = match to {
            CampaignPhase::PcPhase => Some(now + self.gate_for(&campaign)),
            CampaignPhase::GmPhase => None,
        };
        let updated = campaigns::update_campaign(
            txn,
            CampaignUpdate::new(campaign_id, campaign.lock_version)
                .with_phase(to, now)
                .with_phase_expires_at(expires_at),
            now,
        )
        .await?;

        if to == CampaignPhase::PcPhase {
            let scene_ids = scenes::list_active(txn, campaign_id)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect();
            pass_states::reset_scenes(txn, scene_ids, now).await?;
        }

        let reason = if forced {
            TransitionReason::GmForce
        } else {
            TransitionReason::Gm
        };
        phase_transitions::record(txn, campaign_id, from, to, user_id, reason, now).await?;

        info!(
            campaign_id,
            from = from.as_str(),
            to = to.as_str(),
            forced,
            backfilled = events.len(),
            "phase transitioned"
        );
        events.push(CoordinationEvent::PhaseTransitioned {
            campaign_id,
            from,
            to,
            forced,
        });
        Ok(Outcome::new(updated, events))
    }

    /// Freeze the pc_phase countdown. The phase itself is unchanged.
    pub async fn pause(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<Outcome<Campaign>, AppError> {
        let campaign = campaigns::require_campaign(txn, campaign_id).await?;
        access::require_gm(txn, campaign_id, user_id).await?;
        if campaign.is_paused {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyPaused,
                format!("Campaign {campaign_id} is already paused"),
            )
            .into());
        }

        let now = self.clock.now();
        let updated = campaigns::update_campaign(
            txn,
            CampaignUpdate::new(campaign_id, campaign.lock_version).with_paused(Some(now)),
            now,
        )
        .await?;
        info!(campaign_id, "campaign paused");
        Ok(Outcome::with_event(
            updated,
            CoordinationEvent::CampaignPaused { campaign_id },
        ))
    }

    /// Unfreeze; in pc_phase the deadline moves forward by the time spent
    /// paused.
    pub async fn resume(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<Outcome<Campaign>, AppError> {
        let campaign = campaigns::require_campaign(txn, campaign_id).await?;
        access::require_gm(txn, campaign_id, user_id).await?;
        if !campaign.is_paused {
            return Err(DomainError::conflict(
                ConflictKind::NotPaused,
                format!("Campaign {campaign_id} is not paused"),
            )
            .into());
        }

        let now = self.clock.now();
        let mut update =
            CampaignUpdate::new(campaign_id, campaign.lock_version).with_paused(None);
        if let Some(shifted) = shifted_deadline(&campaign, now) {
            update = update.with_phase_expires_at(Some(shifted));
        }
        let updated = campaigns::update_campaign(txn, update, now).await?;
        info!(campaign_id, "campaign resumed");
        Ok(Outcome::with_event(
            updated,
            CoordinationEvent::CampaignResumed { campaign_id },
        ))
    }
}

/// The pc_phase deadline pushed back by the paused interval.
fn shifted_deadline(campaign: &Campaign, now: OffsetDateTime) -> Option<OffsetDateTime> {
    if campaign.phase != CampaignPhase::PcPhase {
        return None;
    }
    let expires = campaign.phase_expires_at?;
    let paused_at = campaign.paused_at?;
    let paused_for = now - paused_at;
    if paused_for.is_positive() {
        Some(expires + paused_for)
    } else {
        Some(expires)
    }
}
