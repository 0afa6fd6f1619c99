//! One-call wrappers that run a service operation in its own committed
//! transaction, the way a handler does.

use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::entities::pass_states::PassState;
use scriptorium::repos::campaigns::Campaign;
use scriptorium::repos::compose_locks::ComposeLock;
use scriptorium::repos::pass_states::PassEntry;
use scriptorium::repos::posts::{BlockKind, Post, PostBlock};
use scriptorium::repos::rolls::Roll;
use scriptorium::services::compose_locks::ComposeLockService;
use scriptorium::services::passes::PassService;
use scriptorium::services::phase::PhaseService;
use scriptorium::services::posts::{PostContent, PostService};
use scriptorium::services::rolls::{CreateRollRequest, RollService};
use scriptorium::state::app_state::AppState;
use scriptorium::AppError;

pub fn narrative(text: &str) -> Vec<PostBlock> {
    vec![PostBlock {
        kind: BlockKind::Narrative,
        content: text.to_string(),
    }]
}

/// A visible in-character post for `character_id`.
pub fn post_as(character_id: Option<i64>, text: &str) -> PostContent {
    PostContent {
        character_id,
        blocks: narrative(text),
        ..PostContent::default()
    }
}

pub async fn acquire_lock(
    state: &AppState,
    user_id: i64,
    scene_id: i64,
    character_id: i64,
    is_hidden: bool,
) -> Result<ComposeLock, AppError> {
    let service = ComposeLockService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move {
            let out = service
                .acquire(txn, user_id, scene_id, character_id, is_hidden)
                .await?;
            Ok(out.value)
        })
    })
    .await
}

pub async fn submit(
    state: &AppState,
    user_id: i64,
    scene_id: i64,
    content: PostContent,
) -> Result<Post, AppError> {
    let service = PostService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move { Ok(service.submit(txn, user_id, scene_id, content).await?.value) })
    })
    .await
}

/// Acquire the scene lock for `character_id` and submit in one go.
pub async fn lock_and_submit(
    state: &AppState,
    user_id: i64,
    scene_id: i64,
    content: PostContent,
) -> Result<Post, AppError> {
    if let Some(character_id) = content.character_id {
        acquire_lock(state, user_id, scene_id, character_id, content.is_hidden).await?;
    }
    submit(state, user_id, scene_id, content).await
}

pub async fn get_post(state: &AppState, user_id: i64, post_id: i64) -> Result<Post, AppError> {
    let service = PostService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move { service.get_post(txn, user_id, post_id).await })
    })
    .await
}

pub async fn set_pass(
    state: &AppState,
    user_id: i64,
    scene_id: i64,
    character_id: i64,
    pass: PassState,
) -> Result<PassEntry, AppError> {
    let service = PassService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move {
            let out = service
                .set_pass(txn, user_id, scene_id, character_id, pass)
                .await?;
            Ok(out.value)
        })
    })
    .await
}

pub async fn transition(
    state: &AppState,
    user_id: i64,
    campaign_id: i64,
    to: CampaignPhase,
) -> Result<Campaign, AppError> {
    let service = PhaseService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move { Ok(service.transition(txn, user_id, campaign_id, to).await?.value) })
    })
    .await
}

pub async fn force_transition(
    state: &AppState,
    user_id: i64,
    campaign_id: i64,
    to: CampaignPhase,
) -> Result<Campaign, AppError> {
    let service = PhaseService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move {
            let out = service
                .force_transition(txn, user_id, campaign_id, to)
                .await?;
            Ok(out.value)
        })
    })
    .await
}

pub fn roll_request(character_id: i64, modifier: i32, dice_type: i32, dice_count: i32) -> CreateRollRequest {
    CreateRollRequest {
        character_id,
        intention: "Persuasion".to_string(),
        modifier,
        dice_type,
        dice_count,
        post_id: None,
    }
}

/// Create a pending roll without handing it to the executor.
pub async fn create_roll(
    state: &AppState,
    user_id: i64,
    scene_id: i64,
    req: CreateRollRequest,
) -> Result<Roll, AppError> {
    let service = RollService::from_state(state);
    with_txn(None, state, |txn| {
        Box::pin(async move { Ok(service.create_roll(txn, user_id, scene_id, req).await?.value) })
    })
    .await
}
