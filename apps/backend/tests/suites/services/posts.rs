use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::errors::ErrorCode;
use scriptorium::repos::posts::{self, Post};
use scriptorium::services::posts::{PostContent, PostService};
use scriptorium::AppError;

use crate::support::actions::{
    acquire_lock, force_transition, get_post, lock_and_submit, narrative, post_as, submit,
};
use crate::support::factory::{seed_table, Table};
use crate::support::test_state::{test_env, TestEnv};

async fn pc_table() -> Result<(TestEnv, Table), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    Ok((env, t))
}

async fn reload(env: &TestEnv, post_id: i64) -> Result<Post, AppError> {
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { Ok(posts::require_post(txn, post_id).await?) })
    })
    .await
}

#[tokio::test]
async fn visible_post_is_witnessed_by_whole_roster() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;

    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "I draw my blade.")).await?;
    assert_eq!(post.witnesses, t.roster());
    assert!(!post.is_draft);
    assert!(!post.is_locked);
    assert!(post.submitted_at.is_some());
    Ok(())
}

#[tokio::test]
async fn hidden_post_is_witnessed_by_author_only() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;

    let content = PostContent {
        is_hidden: true,
        ..post_as(Some(t.alice.id), "I palm the key.")
    };
    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, content).await?;
    assert_eq!(post.witnesses, vec![t.alice.id]);

    // Bob's player cannot see it, and cannot tell it exists.
    let err = get_post(&env.state, t.other.id, post.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);
    assert_eq!(err.status().as_u16(), 404);

    assert_eq!(get_post(&env.state, t.gm.id, post.id).await?.id, post.id);
    assert_eq!(get_post(&env.state, t.player.id, post.id).await?.id, post.id);
    Ok(())
}

#[tokio::test]
async fn submit_without_lock_fails() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;

    let err = submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "hello"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LockNotFound);

    acquire_lock(&env.state, t.other.id, t.scene.id, t.bob.id, false).await?;
    let err = submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "hello"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotLockOwner);
    Ok(())
}

#[tokio::test]
async fn blank_post_is_rejected_before_any_change() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let lock = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;

    let err = submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "   "))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPost);

    // The lock survived the failed submission.
    let again = submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "Fine."))
        .await?;
    assert!(!again.is_draft);
    let err = acquire_lock(&env.state, t.other.id, t.scene.id, t.bob.id, false).await;
    assert!(err.is_ok(), "lock {} should be gone after submit", lock.id);
    Ok(())
}

#[tokio::test]
async fn players_cannot_post_in_gm_phase() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let err = submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "Too early"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);
    Ok(())
}

#[tokio::test]
async fn lock_chain_follows_submissions_and_deletes() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let service = PostService::from_state(&env.state);

    let first = lock_and_submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "One")).await?;
    let second = lock_and_submit(&env.state, t.other.id, t.scene.id, post_as(Some(t.bob.id), "Two")).await?;

    assert!(reload(&env, first.id).await?.is_locked);
    assert!(!reload(&env, second.id).await?.is_locked);

    // The author of a locked post can no longer edit or delete it.
    let (svc, player, first_id) = (service.clone(), t.player.id, first.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            svc.update_post(txn, player, first_id, narrative("Edited"), None)
                .await
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostLocked);

    let (svc, other, second_id) = (service.clone(), t.other.id, second.id);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.delete_post(txn, other, second_id).await })
    })
    .await?;

    assert!(!reload(&env, first.id).await?.is_locked);
    Ok(())
}

#[tokio::test]
async fn only_the_author_may_edit() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let service = PostService::from_state(&env.state);
    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "Draft one")).await?;

    let (svc, other, id) = (service.clone(), t.other.id, post.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.update_post(txn, other, id, narrative("Mine now"), None).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotPostOwner);

    let (svc, player) = (service.clone(), t.player.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            svc.update_post(txn, player, id, narrative("Final words"), Some("brb".into()))
                .await
        })
    })
    .await?;
    assert_eq!(out.value.blocks, narrative("Final words"));
    assert_eq!(out.value.ooc_text.as_deref(), Some("brb"));
    Ok(())
}

#[tokio::test]
async fn drafts_are_private_and_become_the_submission() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let service = PostService::from_state(&env.state);
    acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;

    let (svc, player, scene, alice) = (service.clone(), t.player.id, t.scene.id, t.alice.id);
    let draft = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            svc.save_draft(txn, player, scene, post_as(Some(alice), "Work in progress"))
                .await
        })
    })
    .await?;
    assert!(draft.is_draft);
    assert!(draft.witnesses.is_empty());

    let (svc, gm) = (service.clone(), t.gm.id);
    let listed = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_scene_posts(txn, gm, scene).await })
    })
    .await?;
    assert!(listed.iter().all(|p| p.id != draft.id), "GM must not see a draft");

    let err = get_post(&env.state, t.other.id, draft.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);

    let post = submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "Done")).await?;
    assert_eq!(post.id, draft.id);
    assert!(!post.is_draft);

    let svc = service.clone();
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.get_draft(txn, player, scene).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PostNotFound);
    Ok(())
}

#[tokio::test]
async fn unhide_with_explicit_witnesses_and_default_roster() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let service = PostService::from_state(&env.state);
    let hidden = PostContent {
        is_hidden: true,
        ..post_as(Some(t.alice.id), "Secret")
    };
    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, hidden).await?;

    let (svc, gm, id, bob) = (service.clone(), t.gm.id, post.id, t.bob.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.unhide_post(txn, gm, id, Some(vec![bob, 9_999_999])).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidWitnesses);

    let (svc, player) = (service.clone(), t.player.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.unhide_post(txn, player, id, None).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);

    let (svc, alice) = (service.clone(), t.alice.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.unhide_post(txn, gm, id, Some(vec![alice, bob])).await })
    })
    .await?;
    assert!(!out.value.is_hidden);
    assert_eq!(out.value.witnesses, vec![t.alice.id, t.bob.id]);
    assert_eq!(get_post(&env.state, t.other.id, post.id).await?.id, post.id);

    // Without a list, the whole roster witnesses it.
    let svc = service.clone();
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.edit_witnesses(txn, gm, id, vec![alice]).await })
    })
    .await?;
    assert_eq!(out.value.witnesses, vec![t.alice.id]);
    let svc = service.clone();
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.unhide_post(txn, gm, id, None).await })
    })
    .await?;
    assert_eq!(out.value.witnesses, t.roster());
    Ok(())
}

#[tokio::test]
async fn list_hidden_is_gm_only() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let service = PostService::from_state(&env.state);
    let hidden = PostContent {
        is_hidden: true,
        ..post_as(Some(t.alice.id), "Sneaking")
    };
    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, hidden).await?;

    let (svc, gm, scene) = (service.clone(), t.gm.id, t.scene.id);
    let listed = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_hidden(txn, gm, scene).await })
    })
    .await?;
    assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![post.id]);

    let (svc, player) = (service.clone(), t.player.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_hidden(txn, player, scene).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);
    Ok(())
}

#[tokio::test]
async fn witnesses_cleared_by_the_gm_survive_phase_changes() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "A whisper")).await?;
    assert!(!post.awaiting_reveal);

    let service = PostService::from_state(&env.state);
    let (gm, id) = (t.gm.id, post.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { service.edit_witnesses(txn, gm, id, Vec::new()).await })
    })
    .await?;
    assert!(out.value.witnesses.is_empty());

    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase).await?;
    assert!(reload(&env, post.id).await?.witnesses.is_empty());

    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    let after = reload(&env, post.id).await?;
    assert!(after.witnesses.is_empty());
    assert!(!after.awaiting_reveal);
    Ok(())
}
