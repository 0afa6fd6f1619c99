//! Dice rolls: request, asynchronous execution, and GM adjudication.
//!
//! Lifecycle: `pending` → `completed` (executor or manual resolution) and
//! `pending | completed` → `invalidated`. `invalidated` is terminal.

pub mod dice;
pub mod executor;

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use tracing::info;

use crate::adapters::rolls_sea::{RollCreate, RollUpdate};
use crate::entities::rolls::RollStatus;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::events::{CoordinationEvent, Outcome};
use crate::infra::clock::Clock;
use crate::repos::rolls::{self, Roll};
use crate::repos::{campaigns, posts, scenes};
use crate::services::access;
use crate::services::witnesses::{Viewer, WitnessResolver};
use crate::state::app_state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRollRequest {
    pub character_id: i64,
    pub intention: String,
    #[serde(default)]
    pub modifier: i32,
    pub dice_type: i32,
    pub dice_count: i32,
    #[serde(default)]
    pub post_id: Option<i64>,
}

fn roll_invalidated(roll_id: i64) -> DomainError {
    DomainError::conflict(
        ConflictKind::RollInvalidated,
        format!("Roll {roll_id} has been invalidated"),
    )
}

#[derive(Clone)]
pub struct RollService {
    clock: Arc<dyn Clock>,
}

impl RollService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.clock))
    }

    /// Persist a pending roll. Execution happens after commit, when the
    /// caller hands the id to the `RollExecutor`.
    pub async fn create_roll(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        req: CreateRollRequest,
    ) -> Result<Outcome<Roll>, AppError> {
        dice::validate_modifier(req.modifier)?;
        dice::validate_dice_count(req.dice_count)?;
        dice::validate_dice_type(req.dice_type)?;
        let intention = dice::normalize_intention(&req.intention)?;

        let scene = access::scene_access(txn, scene_id, user_id).await?;
        access::require_actable_character(txn, &scene.membership, req.character_id).await?;
        if !scenes::is_in_roster(txn, scene_id, req.character_id).await? {
            return Err(DomainError::validation(
                ValidationKind::CharacterNotInScene,
                format!("Character {} is not in scene {scene_id}", req.character_id),
            )
            .into());
        }
        if let Some(post_id) = req.post_id {
            let post = posts::require_post(txn, post_id).await?;
            let viewer = Viewer::load(txn, &scene.membership).await?;
            if post.scene_id != scene_id || !WitnessResolver::can_view(&post, &viewer) {
                return Err(DomainError::not_found(
                    NotFoundKind::Post,
                    format!("Post {post_id} not found"),
                )
                .into());
            }
        }

        let roll = rolls::create_roll(
            txn,
            RollCreate {
                scene_id,
                character_id: req.character_id,
                requested_by: user_id,
                post_id: req.post_id,
                intention,
                modifier: req.modifier,
                dice_type: req.dice_type,
                dice_count: req.dice_count,
            },
            self.clock.now(),
        )
        .await?;

        info!(roll_id = roll.id, scene_id, character_id = roll.character_id, "roll requested");
        let event = CoordinationEvent::RollCreated {
            campaign_id: scene.campaign.id,
            scene_id,
            roll_id: roll.id,
        };
        Ok(Outcome::with_event(roll, event))
    }

    pub async fn get_roll(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        roll_id: i64,
    ) -> Result<Roll, AppError> {
        let roll = rolls::require_roll(txn, roll_id).await?;
        let scene = access::scene_access(txn, roll.scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        if !Self::attached_post_visible(txn, &roll, &viewer).await? {
            return Err(
                DomainError::not_found(NotFoundKind::Roll, format!("Roll {roll_id} not found")).into(),
            );
        }
        Ok(roll)
    }

    /// Rolls attached to a post the caller can see.
    pub async fn list_by_post(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
    ) -> Result<Vec<Roll>, AppError> {
        let post = posts::require_post(txn, post_id).await?;
        let scene = access::scene_access(txn, post.scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        WitnessResolver::ensure_visible(&post, &viewer)?;
        Ok(rolls::list_by_post(txn, post_id).await?)
    }

    pub async fn list_by_scene(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Vec<Roll>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        let all = rolls::list_by_scene(txn, scene_id).await?;
        Ok(Self::retain_visible(txn, all, &viewer).await?)
    }

    pub async fn list_pending_for_character(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
    ) -> Result<Vec<Roll>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        let pending = rolls::list_pending_for_character(txn, scene_id, character_id).await?;
        Ok(Self::retain_visible(txn, pending, &viewer).await?)
    }

    /// A roll attached to a post is only as visible as that post.
    async fn attached_post_visible(
        txn: &DatabaseTransaction,
        roll: &Roll,
        viewer: &Viewer,
    ) -> Result<bool, DomainError> {
        match roll.post_id {
            None => Ok(true),
            Some(post_id) => {
                let post = posts::require_post(txn, post_id).await?;
                Ok(WitnessResolver::can_view(&post, viewer))
            }
        }
    }

    async fn retain_visible(
        txn: &DatabaseTransaction,
        all: Vec<Roll>,
        viewer: &Viewer,
    ) -> Result<Vec<Roll>, DomainError> {
        let mut seen: HashMap<i64, bool> = HashMap::new();
        let mut visible = Vec::with_capacity(all.len());
        for roll in all {
            let keep = match roll.post_id {
                None => true,
                Some(post_id) => match seen.get(&post_id) {
                    Some(v) => *v,
                    None => {
                        let v = Self::attached_post_visible(txn, &roll, viewer).await?;
                        seen.insert(post_id, v);
                        v
                    }
                },
            };
            if keep {
                visible.push(roll);
            }
        }
        Ok(visible)
    }

    /// Pending rolls in any scene of the campaign (GM).
    pub async fn list_unresolved_for_campaign(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<Vec<Roll>, AppError> {
        campaigns::require_campaign(txn, campaign_id).await?;
        access::require_gm(txn, campaign_id, user_id).await?;
        Ok(Self::pending_in_campaign(txn, campaign_id).await?)
    }

    pub async fn pending_in_campaign(
        txn: &DatabaseTransaction,
        campaign_id: i64,
    ) -> Result<Vec<Roll>, DomainError> {
        let scene_ids = scenes::all_ids(txn, campaign_id).await?;
        rolls::list_pending_in_scenes(txn, scene_ids).await
    }

    /// Load a roll and require the caller to be GM of its campaign.
    async fn load_for_gm(
        txn: &DatabaseTransaction,
        user_id: i64,
        roll_id: i64,
    ) -> Result<(Roll, i64), AppError> {
        let roll = rolls::require_roll(txn, roll_id).await?;
        let scene = scenes::require_scene(txn, roll.scene_id).await?;
        access::require_gm(txn, scene.campaign_id, user_id).await?;
        Ok((roll, scene.campaign_id))
    }

    /// Replace the intention of a pending or completed roll. The first
    /// intention ever recorded is kept in `original_intention`.
    pub async fn override_intention(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        roll_id: i64,
        new_intention: &str,
        reason: Option<String>,
    ) -> Result<Roll, AppError> {
        let intention = dice::normalize_intention(new_intention)?;
        let reason = dice::normalize_reason(reason)?;
        let (roll, _) = Self::load_for_gm(txn, user_id, roll_id).await?;
        if roll.status == RollStatus::Invalidated {
            return Err(roll_invalidated(roll_id).into());
        }

        let original = roll
            .original_intention
            .is_none()
            .then(|| roll.intention.clone());
        let updated = rolls::update_roll(
            txn,
            roll_id,
            RollUpdate::override_intention(user_id, intention, original, reason),
            self.clock.now(),
        )
        .await?;
        info!(roll_id, "roll intention overridden");
        Ok(updated)
    }

    /// Settle a pending roll by hand; `result` becomes the total.
    pub async fn manually_resolve(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        roll_id: i64,
        result: i32,
        reason: Option<String>,
    ) -> Result<Outcome<Roll>, AppError> {
        let reason = dice::normalize_reason(reason)?;
        let (roll, campaign_id) = Self::load_for_gm(txn, user_id, roll_id).await?;
        match roll.status {
            RollStatus::Pending => {}
            RollStatus::Completed => {
                return Err(DomainError::conflict(
                    ConflictKind::RollAlreadyResolved,
                    format!("Roll {roll_id} is already resolved"),
                )
                .into())
            }
            RollStatus::Invalidated => return Err(roll_invalidated(roll_id).into()),
        }

        let updated = rolls::update_roll(
            txn,
            roll_id,
            RollUpdate::manual_resolution(user_id, result, reason),
            self.clock.now(),
        )
        .await?;
        info!(roll_id, result, "roll manually resolved");
        let event = CoordinationEvent::RollResolved {
            campaign_id,
            scene_id: updated.scene_id,
            roll_id,
            status: RollStatus::Completed,
        };
        Ok(Outcome::with_event(updated, event))
    }

    /// Move a pending or completed roll to `invalidated`.
    pub async fn invalidate(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        roll_id: i64,
    ) -> Result<Outcome<Roll>, AppError> {
        let (roll, campaign_id) = Self::load_for_gm(txn, user_id, roll_id).await?;
        if roll.status == RollStatus::Invalidated {
            return Err(roll_invalidated(roll_id).into());
        }

        let updated = rolls::update_roll(
            txn,
            roll_id,
            RollUpdate::invalidation(user_id),
            self.clock.now(),
        )
        .await?;
        info!(roll_id, "roll invalidated");
        let event = CoordinationEvent::RollResolved {
            campaign_id,
            scene_id: updated.scene_id,
            roll_id,
            status: RollStatus::Invalidated,
        };
        Ok(Outcome::with_event(updated, event))
    }
}
