//! DTOs for campaigns_sea adapter.

use time::OffsetDateTime;

use crate::entities::campaigns::CampaignPhase;

#[derive(Debug, Clone)]
pub struct CampaignCreate {
    pub name: String,
    pub created_by: i64,
    pub time_gate_secs: Option<i64>,
}

impl CampaignCreate {
    pub fn new(name: impl Into<String>, created_by: i64) -> Self {
        Self {
            name: name.into(),
            created_by,
            time_gate_secs: None,
        }
    }

    pub fn with_time_gate_secs(mut self, secs: i64) -> Self {
        self.time_gate_secs = Some(secs);
        self
    }
}

/// Update of any combination of phase and pause fields with one
/// `lock_version` bump.
///
/// Nullable columns are three-state: `None` = no change,
/// `Some(None)` = clear, `Some(Some(ts))` = set.
#[derive(Debug, Clone)]
pub struct CampaignUpdate {
    pub id: i64,
    pub expected_version: i32,
    pub phase: Option<CampaignPhase>,
    pub phase_started_at: Option<OffsetDateTime>,
    pub phase_expires_at: Option<Option<OffsetDateTime>>,
    pub is_paused: Option<bool>,
    pub paused_at: Option<Option<OffsetDateTime>>,
}

impl CampaignUpdate {
    pub fn new(id: i64, expected_version: i32) -> Self {
        Self {
            id,
            expected_version,
            phase: None,
            phase_started_at: None,
            phase_expires_at: None,
            is_paused: None,
            paused_at: None,
        }
    }

    pub fn with_phase(mut self, phase: CampaignPhase, started_at: OffsetDateTime) -> Self {
        self.phase = Some(phase);
        self.phase_started_at = Some(started_at);
        self
    }

    pub fn with_phase_expires_at(mut self, expires_at: Option<OffsetDateTime>) -> Self {
        self.phase_expires_at = Some(expires_at);
        self
    }

    pub fn with_paused(mut self, paused_at: Option<OffsetDateTime>) -> Self {
        self.is_paused = Some(paused_at.is_some());
        self.paused_at = Some(paused_at);
        self
    }
}
