//! Per-scene, per-character readiness flags.
//!
//! `passed` lasts until the character's next submission; `hard_passed`
//! survives submissions and is cleared only explicitly or by a phase
//! transition.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use tracing::info;

use crate::entities::campaigns::CampaignPhase;
use crate::entities::pass_states::PassState;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::events::{CoordinationEvent, Outcome};
use crate::infra::clock::Clock;
use crate::repos::pass_states::{self, PassEntry};
use crate::repos::{campaigns, characters, rolls, scenes};
use crate::services::access::{self, SceneAccess};
use crate::state::app_state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharacterPass {
    pub character_id: i64,
    pub state: PassState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenePassSummary {
    pub scene_id: i64,
    pub title: String,
    pub characters: Vec<CharacterPass>,
    pub all_passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub campaign_id: i64,
    pub scenes: Vec<ScenePassSummary>,
    pub all_passed: bool,
}

/// Parse a declared pass state from its wire name.
pub fn parse_state(raw: &str) -> Result<PassState, DomainError> {
    match raw.trim() {
        "none" => Ok(PassState::None),
        "passed" => Ok(PassState::Passed),
        "hard_passed" => Ok(PassState::HardPassed),
        other => Err(DomainError::validation(
            ValidationKind::InvalidPassState,
            format!("Unknown pass state '{other}' (expected none, passed or hard_passed)"),
        )),
    }
}

pub fn all_passed(characters: &[CharacterPass]) -> bool {
    characters.iter().all(|c| c.state.is_passing())
}

/// Roster of each active scene joined with stored pass states.
async fn campaign_states(
    txn: &DatabaseTransaction,
    campaign_id: i64,
) -> Result<Vec<ScenePassSummary>, DomainError> {
    let active = scenes::list_active(txn, campaign_id).await?;
    let stored =
        pass_states::states_for_scenes(txn, active.iter().map(|s| s.id).collect()).await?;

    let mut out = Vec::with_capacity(active.len());
    for scene in active {
        let characters = with_states(&scenes::roster_ids(txn, scene.id).await?, scene.id, &stored);
        out.push(ScenePassSummary {
            scene_id: scene.id,
            title: scene.title,
            all_passed: all_passed(&characters),
            characters,
        });
    }
    Ok(out)
}

fn with_states(
    roster: &[i64],
    scene_id: i64,
    stored: &HashMap<(i64, i64), PassState>,
) -> Vec<CharacterPass> {
    roster
        .iter()
        .map(|&character_id| CharacterPass {
            character_id,
            state: stored
                .get(&(scene_id, character_id))
                .copied()
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Clone)]
pub struct PassService {
    clock: Arc<dyn Clock>,
}

impl PassService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.clock))
    }

    async fn roster_member(
        txn: &DatabaseTransaction,
        scene: &SceneAccess,
        character_id: i64,
    ) -> Result<(), DomainError> {
        if !scenes::is_in_roster(txn, scene.scene.id, character_id).await? {
            return Err(DomainError::validation(
                ValidationKind::CharacterNotInScene,
                format!(
                    "Character {character_id} is not in scene {}",
                    scene.scene.id
                ),
            ));
        }
        Ok(())
    }

    /// Declare a character's pass state for this turn.
    ///
    /// Requires pc_phase, and a `passed`/`hard_passed` declaration is refused
    /// while the character still has a pending roll in any scene.
    pub async fn set_pass(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
        state: PassState,
    ) -> Result<Outcome<PassEntry>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        access::require_actable_character(txn, &scene.membership, character_id).await?;
        Self::roster_member(txn, &scene, character_id).await?;

        if scene.campaign.phase != CampaignPhase::PcPhase {
            return Err(DomainError::conflict(
                ConflictKind::PhaseMismatch,
                "Passing is only possible during the PC phase",
            )
            .into());
        }
        if state.is_passing() && rolls::has_pending_for_character(txn, character_id).await? {
            return Err(DomainError::conflict(
                ConflictKind::CannotPassPendingRolls,
                format!("Character {character_id} has pending rolls"),
            )
            .into());
        }

        let entry =
            pass_states::set_state(txn, scene_id, character_id, state, self.clock.now()).await?;
        info!(scene_id, character_id, state = ?state, "pass state set");
        Ok(Outcome::with_event(
            entry,
            CoordinationEvent::PassChanged {
                campaign_id: scene.campaign.id,
                scene_id,
                character_id,
                state,
            },
        ))
    }

    /// Force a character back to `none`. The character's controller or the
    /// GM may do this in any phase.
    pub async fn clear_pass(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
    ) -> Result<Outcome<PassEntry>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        if !scene.is_gm() {
            access::require_actable_character(txn, &scene.membership, character_id).await?;
        } else {
            // GM may clear anyone's pass, but the character must belong here.
            let character = characters::require_character(txn, character_id).await?;
            if character.campaign_id != scene.campaign.id {
                return Err(DomainError::not_found(
                    NotFoundKind::Character,
                    format!("Character {character_id} not found"),
                )
                .into());
            }
        }
        Self::roster_member(txn, &scene, character_id).await?;

        let entry = pass_states::set_state(
            txn,
            scene_id,
            character_id,
            PassState::None,
            self.clock.now(),
        )
        .await?;
        Ok(Outcome::with_event(
            entry,
            CoordinationEvent::PassChanged {
                campaign_id: scene.campaign.id,
                scene_id,
                character_id,
                state: PassState::None,
            },
        ))
    }

    /// Every roster character of the scene with its state.
    pub async fn scene_states(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Vec<CharacterPass>, AppError> {
        access::scene_access(txn, scene_id, user_id).await?;
        let stored = pass_states::states_for_scenes(txn, vec![scene_id]).await?;
        let roster = scenes::roster_ids(txn, scene_id).await?;
        Ok(with_states(&roster, scene_id, &stored))
    }

    pub async fn summary(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<PassSummary, AppError> {
        campaigns::require_campaign(txn, campaign_id).await?;
        access::require_member(txn, campaign_id, user_id).await?;
        let scenes = campaign_states(txn, campaign_id).await?;
        Ok(PassSummary {
            campaign_id,
            all_passed: scenes.iter().all(|s| s.all_passed),
            scenes,
        })
    }

    /// Distinct roster characters of active scenes whose state is `none`.
    pub async fn unpassed_characters(
        txn: &DatabaseTransaction,
        campaign_id: i64,
    ) -> Result<Vec<i64>, DomainError> {
        let mut out: Vec<i64> = campaign_states(txn, campaign_id)
            .await?
            .into_iter()
            .flat_map(|s| s.characters)
            .filter(|c| !c.state.is_passing())
            .map(|c| c.character_id)
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }
}
