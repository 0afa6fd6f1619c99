//! Posts: drafts, submission, fog-of-war reads, and GM reveal tools.

use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::adapters::posts_sea::{PostCreate, PostUpdate};
use crate::entities::campaigns::CampaignPhase;
use crate::entities::pass_states::PassState;
use crate::error::AppError;
use crate::errors::domain::{
    ConflictKind, DomainError, ForbiddenKind, NotFoundKind, ValidationKind,
};
use crate::events::{CoordinationEvent, Outcome};
use crate::infra::clock::Clock;
use crate::repos::posts::{self, encode_blocks, encode_witnesses, Post, PostBlock};
use crate::repos::{compose_locks, pass_states, rolls, scenes};
use crate::services::access::{self, SceneAccess};
use crate::services::compose_locks::ComposeLockService;
use crate::services::rolls::dice;
use crate::services::witnesses::{Viewer, WitnessResolver};
use crate::state::app_state::AppState;

/// Body of a draft save or a submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostContent {
    #[serde(default)]
    pub character_id: Option<i64>,
    #[serde(default)]
    pub blocks: Vec<PostBlock>,
    #[serde(default)]
    pub ooc_text: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub intention: Option<String>,
    #[serde(default)]
    pub modifier: Option<i32>,
}

impl PostContent {
    /// Validate the optional roll context and return the normalized intention.
    fn roll_context(&self) -> Result<(Option<String>, Option<i32>), DomainError> {
        if let Some(modifier) = self.modifier {
            dice::validate_modifier(modifier)?;
        }
        let intention = self
            .intention
            .as_deref()
            .map(dice::normalize_intention)
            .transpose()?;
        Ok((intention, self.modifier))
    }
}

fn require_content(blocks: &[PostBlock], ooc_text: Option<&str>) -> Result<(), DomainError> {
    let has_block = blocks.iter().any(|b| !b.is_blank());
    let has_ooc = ooc_text.is_some_and(|t| !t.trim().is_empty());
    if has_block || has_ooc {
        Ok(())
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidPost,
            "A post needs at least one non-empty block or OOC text",
        ))
    }
}

/// Submission timestamp that sorts strictly after the current latest post.
fn submission_instant(now: OffsetDateTime, previous: Option<&Post>) -> OffsetDateTime {
    match previous.and_then(|p| p.submitted_at) {
        Some(prev) if prev >= now => prev + Duration::microseconds(1),
        _ => now,
    }
}

fn post_created(campaign_id: i64, post: &Post) -> CoordinationEvent {
    CoordinationEvent::PostCreated {
        campaign_id,
        scene_id: post.scene_id,
        post_id: post.id,
    }
}

fn post_updated(campaign_id: i64, post: &Post) -> CoordinationEvent {
    CoordinationEvent::PostUpdated {
        campaign_id,
        scene_id: post.scene_id,
        post_id: post.id,
    }
}

#[derive(Clone)]
pub struct PostService {
    clock: Arc<dyn Clock>,
    locks: ComposeLockService,
}

impl PostService {
    pub fn new(clock: Arc<dyn Clock>, locks: ComposeLockService) -> Self {
        Self { clock, locks }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.clock),
            ComposeLockService::from_state(state),
        )
    }

    /// Who is writing: the GM may post with no character or as an NPC; a
    /// player must post as their own character and hold the scene's lock
    /// for it.
    async fn check_author(
        &self,
        txn: &DatabaseTransaction,
        scene: &SceneAccess,
        user_id: i64,
        character_id: Option<i64>,
    ) -> Result<(), DomainError> {
        if let Some(character_id) = character_id {
            access::require_actable_character(txn, &scene.membership, character_id).await?;
            if !scenes::is_in_roster(txn, scene.scene.id, character_id).await? {
                return Err(DomainError::validation(
                    ValidationKind::CharacterNotInScene,
                    format!(
                        "Character {character_id} is not in scene {}",
                        scene.scene.id
                    ),
                ));
            }
        }
        if scene.is_gm() {
            return Ok(());
        }
        let Some(character_id) = character_id else {
            return Err(DomainError::validation(
                ValidationKind::InvalidPost,
                "Players must post as one of their characters",
            ));
        };
        self.locks
            .require_held(txn, user_id, scene.scene.id, character_id)
            .await?;
        Ok(())
    }

    /// Create or update the caller's single draft in the scene.
    pub async fn save_draft(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        content: PostContent,
    ) -> Result<Post, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        self.check_author(txn, &scene, user_id, content.character_id)
            .await?;
        let (intention, modifier) = content.roll_context()?;
        let now = self.clock.now();

        let draft = match posts::find_draft(txn, scene_id, user_id).await? {
            Some(existing) => {
                posts::update_post(
                    txn,
                    existing.id,
                    PostUpdate::new()
                        .with_character(content.character_id)
                        .with_content(encode_blocks(&content.blocks), content.ooc_text)
                        .hidden(content.is_hidden)
                        .with_roll_context(intention, modifier),
                    now,
                )
                .await?
            }
            None => {
                posts::create_post(
                    txn,
                    PostCreate::new(scene_id, user_id, encode_blocks(&content.blocks))
                        .with_character(content.character_id)
                        .with_ooc_text(content.ooc_text)
                        .hidden(content.is_hidden)
                        .with_roll_context(intention, modifier),
                    now,
                )
                .await?
            }
        };
        Ok(draft)
    }

    pub async fn get_draft(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Post, AppError> {
        access::scene_access(txn, scene_id, user_id).await?;
        posts::find_draft(txn, scene_id, user_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Post,
                    format!("No draft in scene {scene_id}"),
                )
                .into()
            })
    }

    /// Submit a post as one unit of work: stamp witnesses, convert the
    /// draft (or insert), lock the previous post, reset a soft pass, and
    /// drop the author's compose lock.
    pub async fn submit(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
        content: PostContent,
    ) -> Result<Outcome<Post>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        let campaign_id = scene.campaign.id;
        let in_gm_phase = scene.campaign.phase == CampaignPhase::GmPhase;

        if in_gm_phase && !scene.is_gm() {
            return Err(DomainError::conflict(
                ConflictKind::PhaseMismatch,
                "Only the game master may post during the GM phase",
            )
            .into());
        }
        self.check_author(txn, &scene, user_id, content.character_id)
            .await?;
        require_content(&content.blocks, content.ooc_text.as_deref())?;
        let (intention, modifier) = content.roll_context()?;

        let roster = scenes::roster_ids(txn, scene_id).await?;
        let private_narration = in_gm_phase && scene.is_gm() && !content.is_hidden;
        let witnesses = WitnessResolver::for_submission(
            &roster,
            content.character_id,
            content.is_hidden,
            private_narration,
        );

        let now = self.clock.now();
        let previous = posts::latest_submitted(txn, scene_id).await?;
        let submitted_at = submission_instant(now, previous.as_ref());

        let post = match posts::find_draft(txn, scene_id, user_id).await? {
            Some(draft) => {
                posts::update_post(
                    txn,
                    draft.id,
                    PostUpdate::new()
                        .with_character(content.character_id)
                        .with_content(encode_blocks(&content.blocks), content.ooc_text)
                        .with_witnesses(encode_witnesses(&witnesses))
                        .hidden(content.is_hidden)
                        .awaiting_reveal(private_narration)
                        .with_roll_context(intention, modifier)
                        .submitted(submitted_at),
                    now,
                )
                .await?
            }
            None => {
                posts::create_post(
                    txn,
                    PostCreate::new(scene_id, user_id, encode_blocks(&content.blocks))
                        .with_character(content.character_id)
                        .with_ooc_text(content.ooc_text)
                        .with_witnesses(encode_witnesses(&witnesses))
                        .hidden(content.is_hidden)
                        .awaiting_reveal(private_narration)
                        .with_roll_context(intention, modifier)
                        .submitted(submitted_at),
                    now,
                )
                .await?
            }
        };

        let mut events = vec![post_created(campaign_id, &post)];

        if let Some(prev) = previous {
            posts::set_locked(txn, prev.id, true, now).await?;
        }

        if let Some(character_id) = post.character_id {
            if pass_states::clear_soft_pass(txn, scene_id, character_id, now).await? {
                events.push(CoordinationEvent::PassChanged {
                    campaign_id,
                    scene_id,
                    character_id,
                    state: PassState::None,
                });
            }
        }

        if let Some(lock) = compose_locks::find_by_scene(txn, scene_id)
            .await?
            .filter(|lock| lock.user_id == user_id)
        {
            compose_locks::delete_by_id(txn, lock.id).await?;
            events.push(CoordinationEvent::LockReleased {
                campaign_id,
                scene_id,
                lock_id: lock.id,
            });
        }

        info!(
            scene_id,
            post_id = post.id,
            hidden = post.is_hidden,
            witnesses = post.witnesses.len(),
            "post submitted"
        );
        Ok(Outcome::new(post, events))
    }

    /// A single post, subject to fog of war.
    pub async fn get_post(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
    ) -> Result<Post, AppError> {
        let post = posts::require_post(txn, post_id).await?;
        let scene = access::scene_access(txn, post.scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        WitnessResolver::ensure_visible(&post, &viewer)?;
        Ok(post)
    }

    /// Submitted posts of a scene the caller may see, oldest first.
    pub async fn list_scene_posts(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Vec<Post>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        Ok(posts::list_submitted(txn, scene_id)
            .await?
            .into_iter()
            .filter(|post| WitnessResolver::can_view(post, &viewer))
            .collect())
    }

    /// Load a post the caller can see, plus their scene access.
    async fn load_visible(
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
    ) -> Result<(Post, SceneAccess), DomainError> {
        let post = posts::require_post(txn, post_id).await?;
        let scene = access::scene_access(txn, post.scene_id, user_id).await?;
        let viewer = Viewer::load(txn, &scene.membership).await?;
        WitnessResolver::ensure_visible(&post, &viewer)?;
        Ok((post, scene))
    }

    /// Author edits the content of their own unlocked post.
    pub async fn update_post(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
        blocks: Vec<PostBlock>,
        ooc_text: Option<String>,
    ) -> Result<Outcome<Post>, AppError> {
        let (post, scene) = Self::load_visible(txn, user_id, post_id).await?;
        if post.user_id != user_id {
            return Err(DomainError::forbidden(
                ForbiddenKind::NotPostOwner,
                format!("Post {post_id} belongs to someone else"),
            )
            .into());
        }
        if post.is_locked {
            return Err(DomainError::conflict(
                ConflictKind::PostLocked,
                format!("Post {post_id} is locked"),
            )
            .into());
        }
        require_content(&blocks, ooc_text.as_deref())?;

        let updated = posts::update_post(
            txn,
            post_id,
            PostUpdate::new().with_content(encode_blocks(&blocks), ooc_text),
            self.clock.now(),
        )
        .await?;
        let events = if updated.is_draft {
            Vec::new()
        } else {
            vec![post_updated(scene.campaign.id, &updated)]
        };
        Ok(Outcome::new(updated, events))
    }

    /// Authors delete their own unlocked posts; the GM deletes anything.
    /// Deleting the latest post unlocks the one before it.
    pub async fn delete_post(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
    ) -> Result<Outcome<()>, AppError> {
        let (post, scene) = Self::load_visible(txn, user_id, post_id).await?;
        if !scene.is_gm() {
            if post.user_id != user_id {
                return Err(DomainError::forbidden(
                    ForbiddenKind::NotPostOwner,
                    format!("Post {post_id} belongs to someone else"),
                )
                .into());
            }
            if post.is_locked {
                return Err(DomainError::conflict(
                    ConflictKind::PostLocked,
                    format!("Post {post_id} is locked"),
                )
                .into());
            }
        }

        let now = self.clock.now();
        let was_latest = !post.is_draft
            && posts::latest_submitted(txn, post.scene_id)
                .await?
                .is_some_and(|latest| latest.id == post_id);

        rolls::clear_post(txn, post_id, now).await?;
        posts::delete_post(txn, post_id).await?;

        if was_latest {
            if let Some(new_latest) = posts::latest_submitted(txn, post.scene_id).await? {
                posts::set_locked(txn, new_latest.id, false, now).await?;
            }
        }

        if post.is_draft {
            return Ok(Outcome::quiet(()));
        }
        info!(scene_id = post.scene_id, post_id, "post deleted");
        Ok(Outcome::with_event(
            (),
            CoordinationEvent::PostDeleted {
                campaign_id: scene.campaign.id,
                scene_id: post.scene_id,
                post_id,
            },
        ))
    }

    /// GM reveals a hidden post, to an explicit subset of the roster or to
    /// the whole roster.
    pub async fn unhide_post(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
        witnesses: Option<Vec<i64>>,
    ) -> Result<Outcome<Post>, AppError> {
        let (post, scene) = Self::load_visible(txn, user_id, post_id).await?;
        access::ensure_gm(&scene.membership)?;
        let roster = scenes::roster_ids(txn, post.scene_id).await?;
        let witnesses = match witnesses {
            Some(requested) => WitnessResolver::validate_subset(&requested, &roster)?,
            None => roster,
        };

        let updated = posts::update_post(
            txn,
            post_id,
            PostUpdate::new()
                .hidden(false)
                .awaiting_reveal(false)
                .with_witnesses(encode_witnesses(&witnesses)),
            self.clock.now(),
        )
        .await?;
        info!(post_id, witnesses = updated.witnesses.len(), "post unhidden");
        let event = post_updated(scene.campaign.id, &updated);
        Ok(Outcome::with_event(updated, event))
    }

    /// GM correction of a post's witness list.
    pub async fn edit_witnesses(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        post_id: i64,
        witnesses: Vec<i64>,
    ) -> Result<Outcome<Post>, AppError> {
        let (post, scene) = Self::load_visible(txn, user_id, post_id).await?;
        access::ensure_gm(&scene.membership)?;
        let roster = scenes::roster_ids(txn, post.scene_id).await?;
        let witnesses = WitnessResolver::validate_subset(&witnesses, &roster)?;

        let updated = posts::update_post(
            txn,
            post_id,
            PostUpdate::new()
                .awaiting_reveal(false)
                .with_witnesses(encode_witnesses(&witnesses)),
            self.clock.now(),
        )
        .await?;
        let event = post_updated(scene.campaign.id, &updated);
        Ok(Outcome::with_event(updated, event))
    }

    pub async fn list_hidden(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        scene_id: i64,
    ) -> Result<Vec<Post>, AppError> {
        let scene = access::scene_access(txn, scene_id, user_id).await?;
        access::ensure_gm(&scene.membership)?;
        Ok(posts::list_hidden(txn, scene_id).await?)
    }
}
