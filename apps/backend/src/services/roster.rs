//! Scene roster management (GM only).

use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use tracing::info;

use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::events::{CoordinationEvent, Outcome};
use crate::infra::clock::Clock;
use crate::repos::scenes::{self, RosterEntry};
use crate::repos::{characters, compose_locks, pass_states};
use crate::services::access;
use crate::state::app_state::AppState;

#[derive(Clone)]
pub struct RosterService {
    clock: Arc<dyn Clock>,
}

impl RosterService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.clock))
    }

    pub async fn list(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Vec<RosterEntry>, AppError> {
        access::scene_access(txn, scene_id, user_id).await?;
        Ok(scenes::roster(txn, scene_id).await?)
    }

    /// Append a campaign character to the end of the scene roster.
    pub async fn add_character(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
    ) -> Result<Outcome<RosterEntry>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        access::ensure_gm(&scene.membership)?;

        let character = characters::require_character(txn, character_id).await?;
        if character.campaign_id != scene.campaign.id {
            return Err(DomainError::not_found(
                NotFoundKind::Character,
                format!("Character {character_id} not found"),
            )
            .into());
        }

        let roster = scenes::roster(txn, scene_id).await?;
        if roster.iter().any(|e| e.character_id == character_id) {
            return Err(DomainError::conflict(
                ConflictKind::CharacterAlreadyInScene,
                format!("Character {character_id} is already in scene {scene_id}"),
            )
            .into());
        }
        let position = roster.iter().map(|e| e.position + 1).max().unwrap_or(0);

        let entry =
            scenes::add_to_roster(txn, scene_id, character_id, position, self.clock.now()).await?;
        info!(scene_id, character_id, position, "character joined scene");
        Ok(Outcome::with_event(
            entry,
            CoordinationEvent::CharacterJoinedScene {
                campaign_id: scene.campaign.id,
                scene_id,
                character_id,
            },
        ))
    }

    /// Remove a character, its pass row and any lock it holds in the scene.
    pub async fn remove_character(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
    ) -> Result<Outcome<()>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        access::ensure_gm(&scene.membership)?;
        let campaign_id = scene.campaign.id;

        if !scenes::remove_from_roster(txn, scene_id, character_id).await? {
            return Err(DomainError::validation(
                ValidationKind::CharacterNotInScene,
                format!("Character {character_id} is not in scene {scene_id}"),
            )
            .into());
        }
        pass_states::delete(txn, scene_id, character_id).await?;

        let mut events = Vec::new();
        if let Some(lock) = compose_locks::find_by_scene(txn, scene_id)
            .await?
            .filter(|lock| lock.character_id == character_id)
        {
            compose_locks::delete_by_id(txn, lock.id).await?;
            events.push(CoordinationEvent::LockReleased {
                campaign_id,
                scene_id,
                lock_id: lock.id,
            });
        }
        events.push(CoordinationEvent::CharacterLeftScene {
            campaign_id,
            scene_id,
            character_id,
        });
        info!(scene_id, character_id, "character left scene");
        Ok(Outcome::new((), events))
    }
}
