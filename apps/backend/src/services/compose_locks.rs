//! Scene-scoped compose locks.
//!
//! At most one unexpired lock exists per scene. Expired rows are never
//! swept; they are treated as absent wherever they are read, and the next
//! acquire in the scene replaces them. `is_active` is the only place lock
//! liveness is decided.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::adapters::compose_locks_sea::LockCreate;
use crate::error::AppError;
use crate::errors::domain::{
    ConflictKind, DomainError, ForbiddenKind, NotFoundKind, ValidationKind,
};
use crate::events::{CoordinationEvent, Outcome};
use crate::infra::clock::Clock;
use crate::repos::compose_locks::{self, ComposeLock};
use crate::repos::scenes;
use crate::services::access;
use crate::state::app_state::AppState;

pub fn is_active(lock: &ComposeLock, now: OffsetDateTime) -> bool {
    lock.expires_at > now
}

/// A lock as shown to one reader. Identity is withheld from everyone but
/// the holder and the GM while the lock is for a hidden post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockView {
    pub id: i64,
    pub scene_id: i64,
    pub character_id: Option<i64>,
    pub user_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub acquired_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub is_hidden: bool,
}

impl LockView {
    pub fn for_reader(lock: &ComposeLock, reader_id: i64, reader_is_gm: bool) -> Self {
        let reveal = !lock.is_hidden || reader_is_gm || lock.user_id == reader_id;
        Self {
            id: lock.id,
            scene_id: lock.scene_id,
            character_id: reveal.then_some(lock.character_id),
            user_id: reveal.then_some(lock.user_id),
            acquired_at: lock.acquired_at,
            expires_at: lock.expires_at,
            is_hidden: lock.is_hidden,
        }
    }
}

fn lock_not_found(lock_id: i64) -> DomainError {
    DomainError::not_found(NotFoundKind::Lock, format!("Compose lock {lock_id} not found"))
}

fn acquired_event(campaign_id: i64, lock: &ComposeLock) -> CoordinationEvent {
    let (character_id, user_id) = if lock.is_hidden {
        (None, None)
    } else {
        (Some(lock.character_id), Some(lock.user_id))
    };
    CoordinationEvent::LockAcquired {
        campaign_id,
        scene_id: lock.scene_id,
        lock_id: lock.id,
        character_id,
        user_id,
    }
}

#[derive(Clone)]
pub struct ComposeLockService {
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ComposeLockService {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { clock, ttl }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.clock), state.coordination.lock_ttl)
    }

    /// Take the scene's lock for one of the caller's characters.
    ///
    /// An expired row for the scene is replaced. Two concurrent acquires are
    /// arbitrated by the unique index on `compose_locks.scene_id`; the loser
    /// gets `LockAlreadyHeld`.
    pub async fn acquire(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
        is_hidden: bool,
    ) -> Result<Outcome<ComposeLock>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        access::require_actable_character(txn, &scene.membership, character_id).await?;
        if !scenes::is_in_roster(txn, scene_id, character_id).await? {
            return Err(DomainError::validation(
                ValidationKind::CharacterNotInScene,
                format!("Character {character_id} is not in scene {scene_id}"),
            )
            .into());
        }

        let now = self.clock.now();
        if let Some(existing) = compose_locks::find_by_scene(txn, scene_id).await? {
            if is_active(&existing, now) {
                return Err(DomainError::conflict(
                    ConflictKind::LockAlreadyHeld,
                    format!("Scene {scene_id} already has an active compose lock"),
                )
                .into());
            }
            debug!(scene_id, lock_id = existing.id, "replacing expired compose lock");
            compose_locks::delete_by_id(txn, existing.id).await?;
        }

        let lock = compose_locks::insert_lock(
            txn,
            LockCreate {
                scene_id,
                character_id,
                user_id,
                acquired_at: now,
                expires_at: now + self.ttl,
                is_hidden,
            },
        )
        .await?;

        info!(scene_id, lock_id = lock.id, "compose lock acquired");
        let event = acquired_event(scene.campaign.id, &lock);
        Ok(Outcome::with_event(lock, event))
    }

    /// Extend the caller's live lock by one TTL from now. `expires_at` never
    /// moves backwards.
    pub async fn heartbeat(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        lock_id: i64,
    ) -> Result<ComposeLock, AppError> {
        let now = self.clock.now();
        let mut lock = compose_locks::find_by_id(txn, lock_id)
            .await?
            .filter(|lock| is_active(lock, now))
            .ok_or_else(|| lock_not_found(lock_id))?;
        if lock.user_id != user_id {
            return Err(DomainError::forbidden(
                ForbiddenKind::NotLockOwner,
                format!("Compose lock {lock_id} belongs to someone else"),
            )
            .into());
        }

        let extended = now + self.ttl;
        if extended > lock.expires_at {
            compose_locks::set_expires_at(txn, lock_id, extended).await?;
            lock.expires_at = extended;
        }
        debug!(lock_id, expires_at = %lock.expires_at, "compose lock heartbeat");
        Ok(lock)
    }

    /// Holder gives up the lock. Works on an expired row too, which simply
    /// disappears.
    pub async fn release(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        lock_id: i64,
    ) -> Result<Outcome<()>, AppError> {
        let lock = compose_locks::find_by_id(txn, lock_id)
            .await?
            .ok_or_else(|| lock_not_found(lock_id))?;
        if lock.user_id != user_id {
            return Err(DomainError::forbidden(
                ForbiddenKind::NotLockOwner,
                format!("Compose lock {lock_id} belongs to someone else"),
            )
            .into());
        }
        let scene = scenes::require_scene(txn, lock.scene_id).await?;
        compose_locks::delete_by_id(txn, lock_id).await?;

        info!(scene_id = lock.scene_id, lock_id, "compose lock released");
        Ok(Outcome::with_event(
            (),
            CoordinationEvent::LockReleased {
                campaign_id: scene.campaign_id,
                scene_id: lock.scene_id,
                lock_id,
            },
        ))
    }

    /// GM removes any lock in their campaign.
    pub async fn force_release(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        lock_id: i64,
    ) -> Result<Outcome<()>, AppError> {
        let lock = compose_locks::find_by_id(txn, lock_id)
            .await?
            .ok_or_else(|| lock_not_found(lock_id))?;
        let scene = scenes::require_scene(txn, lock.scene_id).await?;
        access::require_gm(txn, scene.campaign_id, user_id).await?;
        compose_locks::delete_by_id(txn, lock_id).await?;

        info!(scene_id = scene.id, lock_id, holder = lock.user_id, "compose lock force-released");
        Ok(Outcome::with_event(
            (),
            CoordinationEvent::LockReleased {
                campaign_id: scene.campaign_id,
                scene_id: scene.id,
                lock_id,
            },
        ))
    }

    /// Live locks of a scene as seen by the caller.
    pub async fn list_for_scene(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Vec<LockView>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        let now = self.clock.now();
        Ok(compose_locks::find_by_scene(txn, scene_id)
            .await?
            .filter(|lock| is_active(lock, now))
            .map(|lock| LockView::for_reader(&lock, user_id, scene.is_gm()))
            .into_iter()
            .collect())
    }

    /// Holder flips the hidden flag of their live lock.
    pub async fn update_hidden(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        lock_id: i64,
        is_hidden: bool,
    ) -> Result<Outcome<ComposeLock>, AppError> {
        let now = self.clock.now();
        let mut lock = compose_locks::find_by_id(txn, lock_id)
            .await?
            .filter(|lock| is_active(lock, now))
            .ok_or_else(|| lock_not_found(lock_id))?;
        if lock.user_id != user_id {
            return Err(DomainError::forbidden(
                ForbiddenKind::NotLockOwner,
                format!("Compose lock {lock_id} belongs to someone else"),
            )
            .into());
        }
        let scene = scenes::require_scene(txn, lock.scene_id).await?;
        compose_locks::set_hidden(txn, lock_id, is_hidden).await?;
        lock.is_hidden = is_hidden;

        Ok(Outcome::with_event(
            lock.clone(),
            CoordinationEvent::LockUpdated {
                campaign_id: scene.campaign_id,
                scene_id: lock.scene_id,
                lock_id,
                is_hidden,
            },
        ))
    }

    /// The caller's live lock in the scene, if it is for `character_id`.
    ///
    /// Fails `LockNotFound` when the scene has no live lock and
    /// `NotLockOwner` when someone else (or another character) holds it.
    pub async fn require_held(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        character_id: i64,
    ) -> Result<ComposeLock, DomainError> {
        let now = self.clock.now();
        let lock = compose_locks::find_by_scene(txn, scene_id)
            .await?
            .filter(|lock| is_active(lock, now))
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Lock,
                    format!("No active compose lock in scene {scene_id}"),
                )
            })?;
        if lock.user_id != user_id || lock.character_id != character_id {
            return Err(DomainError::forbidden(
                ForbiddenKind::NotLockOwner,
                format!("Scene {scene_id} is locked by someone else"),
            ));
        }
        Ok(lock)
    }

    /// Live locks in any scene of the campaign, archived scenes included.
    pub async fn active_in_campaign(
        &self,
        txn: &DatabaseTransaction,
        campaign_id: i64,
    ) -> Result<Vec<ComposeLock>, DomainError> {
        let scene_ids = scenes::all_ids(txn, campaign_id).await?;
        let now = self.clock.now();
        Ok(compose_locks::list_by_scenes(txn, scene_ids)
            .await?
            .into_iter()
            .filter(|lock| is_active(lock, now))
            .collect())
    }
}
