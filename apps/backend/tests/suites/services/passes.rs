use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::entities::pass_states::PassState;
use scriptorium::errors::ErrorCode;
use scriptorium::repos::scenes;
use scriptorium::services::passes::{PassService, PassSummary};
use scriptorium::AppError;

use crate::support::actions::{
    create_roll, force_transition, lock_and_submit, post_as, roll_request, set_pass,
};
use crate::support::factory::{add_scene, seed_table, Table};
use crate::support::test_state::{test_env, TestEnv};

async fn pc_table() -> Result<(TestEnv, Table), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    Ok((env, t))
}

async fn state_of(env: &TestEnv, t: &Table, character_id: i64) -> Result<PassState, AppError> {
    let service = PassService::from_state(&env.state);
    let (gm, scene) = (t.gm.id, t.scene.id);
    let states = with_txn(None, &env.state, |txn| {
        Box::pin(async move { service.scene_states(txn, gm, scene).await })
    })
    .await?;
    Ok(states
        .into_iter()
        .find(|c| c.character_id == character_id)
        .map(|c| c.state)
        .unwrap_or_default())
}

async fn summary(env: &TestEnv, user_id: i64, campaign_id: i64) -> Result<PassSummary, AppError> {
    let service = PassService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { service.summary(txn, user_id, campaign_id).await })
    })
    .await
}

#[tokio::test]
async fn passing_requires_pc_phase() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let err = set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::Passed)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);
    Ok(())
}

#[tokio::test]
async fn pending_roll_blocks_passing() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 2, 20, 1)).await?;

    let err = set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::HardPassed)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotPassPendingRolls);

    // Declaring `none` is always allowed.
    set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::None).await?;
    Ok(())
}

#[tokio::test]
async fn pending_roll_in_another_scene_blocks_passing() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let side = add_scene(&env.state, t.campaign.id, vec![t.alice.id]).await?;
    create_roll(&env.state, t.player.id, side.id, roll_request(t.alice.id, 0, 6, 1)).await?;

    let err = set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::Passed)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotPassPendingRolls);

    // Other characters are unaffected.
    set_pass(&env.state, t.other.id, t.scene.id, t.bob.id, PassState::Passed).await?;
    Ok(())
}

#[tokio::test]
async fn posting_clears_passed_but_not_hard_passed() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;

    set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::Passed).await?;
    set_pass(&env.state, t.other.id, t.scene.id, t.bob.id, PassState::HardPassed).await?;

    lock_and_submit(&env.state, t.player.id, t.scene.id, post_as(Some(t.alice.id), "Wait!")).await?;
    lock_and_submit(&env.state, t.other.id, t.scene.id, post_as(Some(t.bob.id), "Fine.")).await?;

    assert_eq!(state_of(&env, &t, t.alice.id).await?, PassState::None);
    assert_eq!(state_of(&env, &t, t.bob.id).await?, PassState::HardPassed);
    Ok(())
}

#[tokio::test]
async fn clear_pass_by_owner_or_gm() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let service = PassService::from_state(&env.state);
    set_pass(&env.state, t.other.id, t.scene.id, t.bob.id, PassState::HardPassed).await?;

    let (svc, player, scene, bob) = (service.clone(), t.player.id, t.scene.id, t.bob.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.clear_pass(txn, player, scene, bob).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotCharacterOwner);

    let (svc, gm) = (service.clone(), t.gm.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.clear_pass(txn, gm, scene, bob).await })
    })
    .await?;
    assert_eq!(out.value.state, PassState::None);
    assert_eq!(state_of(&env, &t, t.bob.id).await?, PassState::None);
    Ok(())
}

#[tokio::test]
async fn summary_covers_active_scenes_only() -> Result<(), AppError> {
    let (env, t) = pc_table().await?;
    let side = add_scene(&env.state, t.campaign.id, vec![t.alice.id]).await?;

    for (user, character) in [(t.player.id, t.alice.id), (t.other.id, t.bob.id), (t.gm.id, t.npc.id)] {
        set_pass(&env.state, user, t.scene.id, character, PassState::Passed).await?;
    }

    let report = summary(&env, t.player.id, t.campaign.id).await?;
    assert_eq!(report.scenes.len(), 2);
    assert!(!report.all_passed, "alice has not passed in the side room");
    let main = report.scenes.iter().find(|s| s.scene_id == t.scene.id).unwrap();
    assert!(main.all_passed);

    let side_id = side.id;
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { Ok(scenes::set_archived(txn, side_id, true).await?) })
    })
    .await?;
    let report = summary(&env, t.player.id, t.campaign.id).await?;
    assert_eq!(report.scenes.len(), 1);
    assert!(report.all_passed);

    let err = summary(&env, t.outsider.id, t.campaign.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAMember);
    Ok(())
}
