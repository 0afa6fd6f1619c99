//! Fog of war: who may see a post.
//!
//! Witness lists are computed once at write time and enforced on every
//! read. A post a caller may not see is reported as `PostNotFound`, the
//! same as a post that does not exist.

use std::collections::HashSet;

use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;
use tracing::info;

use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::campaigns::Membership;
use crate::repos::posts::{self, Post};
use crate::repos::{characters, scenes};

/// The reader's identity as far as visibility is concerned.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: i64,
    pub is_gm: bool,
    pub character_ids: HashSet<i64>,
}

impl Viewer {
    pub async fn load(
        txn: &DatabaseTransaction,
        membership: &Membership,
    ) -> Result<Self, DomainError> {
        let owned = characters::find_owned(txn, membership.campaign_id, membership.user_id).await?;
        Ok(Self {
            user_id: membership.user_id,
            is_gm: membership.is_gm(),
            character_ids: owned.into_iter().map(|c| c.id).collect(),
        })
    }
}

/// Stateless resolver; methods are grouped here for discoverability.
#[derive(Debug, Default, Clone, Copy)]
pub struct WitnessResolver;

impl WitnessResolver {
    /// Witnesses stamped on a post at submission.
    ///
    /// - hidden: only the author's character (nobody when there is none)
    /// - GM narration during gm_phase: nobody, until the backfill
    /// - otherwise: the scene roster at this instant
    pub fn for_submission(
        roster: &[i64],
        author_character: Option<i64>,
        is_hidden: bool,
        private_narration: bool,
    ) -> Vec<i64> {
        if is_hidden {
            return author_character.into_iter().collect();
        }
        if private_narration {
            return Vec::new();
        }
        roster.to_vec()
    }

    /// Validate an explicit witness list against the roster, dropping
    /// duplicates but keeping first-seen order.
    pub fn validate_subset(requested: &[i64], roster: &[i64]) -> Result<Vec<i64>, DomainError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(requested.len());
        for id in requested {
            if !roster.contains(id) {
                return Err(DomainError::validation(
                    ValidationKind::InvalidWitnesses,
                    format!("Character {id} is not in the scene roster"),
                ));
            }
            if seen.insert(*id) {
                out.push(*id);
            }
        }
        Ok(out)
    }

    /// Drafts are private to their author, the GM included. Submitted posts
    /// are visible to the GM, and to anyone owning a witnessing character.
    pub fn can_view(post: &Post, viewer: &Viewer) -> bool {
        if post.is_draft {
            return post.user_id == viewer.user_id;
        }
        if viewer.is_gm {
            return true;
        }
        post.witnesses
            .iter()
            .any(|id| viewer.character_ids.contains(id))
    }

    pub fn ensure_visible(post: &Post, viewer: &Viewer) -> Result<(), DomainError> {
        if Self::can_view(post, viewer) {
            Ok(())
        } else {
            Err(DomainError::not_found(
                NotFoundKind::Post,
                format!("Post {} not found", post.id),
            ))
        }
    }

    /// Give every piece of held-back GM narration the current roster of its
    /// scene. Runs inside the transition out of gm_phase. Only posts marked
    /// `awaiting_reveal` at submission are touched, so a witness list the GM
    /// set by hand is never widened.
    ///
    /// Returns `(scene_id, post_id)` for every post that changed.
    pub async fn backfill_campaign(
        txn: &DatabaseTransaction,
        campaign_id: i64,
        now: OffsetDateTime,
    ) -> Result<Vec<(i64, i64)>, DomainError> {
        let scene_ids = scenes::all_ids(txn, campaign_id).await?;
        let candidates = posts::list_awaiting_reveal(txn, scene_ids.clone()).await?;

        let mut changed = Vec::new();
        for scene_id in scene_ids {
            let pending: Vec<&Post> = candidates.iter().filter(|p| p.scene_id == scene_id).collect();
            if pending.is_empty() {
                continue;
            }
            let roster = scenes::roster_ids(txn, scene_id).await?;
            if roster.is_empty() {
                // Nobody to reveal to yet; the marker stays for the next opening.
                continue;
            }
            for post in pending {
                posts::reveal(txn, post.id, &roster, now).await?;
                changed.push((scene_id, post.id));
            }
        }

        if !changed.is_empty() {
            info!(campaign_id, revealed = changed.len(), "witness backfill applied");
        }
        Ok(changed)
    }
}
