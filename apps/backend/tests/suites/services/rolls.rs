use std::time::Duration;

use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::entities::rolls::RollStatus;
use scriptorium::errors::ErrorCode;
use scriptorium::repos::rolls::Roll;
use scriptorium::services::rolls::RollService;
use scriptorium::AppError;

use scriptorium::services::posts::PostContent;

use crate::support::actions::{create_roll, force_transition, lock_and_submit, post_as, roll_request};
use crate::support::factory::{seed_table, Table};
use crate::support::rolls::wait_for_settled;
use crate::support::test_state::{test_env, TestEnv};

const SETTLE: Duration = Duration::from_secs(5);

async fn pc_table(faces: Vec<i32>) -> Result<(TestEnv, Table), AppError> {
    let env = test_env().with_dice(faces).build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    Ok((env, t))
}

fn executor(env: &TestEnv) -> &scriptorium::services::rolls::executor::RollExecutor {
    env.state.rolls.as_ref().expect("db-backed state runs an executor")
}

async fn override_intention(env: &TestEnv, gm: i64, roll_id: i64) -> Result<Roll, AppError> {
    let service = RollService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            service
                .override_intention(txn, gm, roll_id, "Intimidation", Some("Tone was threatening".into()))
                .await
        })
    })
    .await
}

async fn manually_resolve(env: &TestEnv, gm: i64, roll_id: i64, result: i32) -> Result<Roll, AppError> {
    let service = RollService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            Ok(service
                .manually_resolve(txn, gm, roll_id, result, None)
                .await?
                .value)
        })
    })
    .await
}

async fn invalidate(env: &TestEnv, gm: i64, roll_id: i64) -> Result<Roll, AppError> {
    let service = RollService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { Ok(service.invalidate(txn, gm, roll_id).await?.value) })
    })
    .await
}

#[tokio::test]
async fn create_returns_pending_and_executor_completes() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![3, 4]).await?;

    let roll = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 5, 6, 2)).await?;
    assert_eq!(roll.status, RollStatus::Pending);
    assert_eq!(roll.total, None);

    assert!(executor(&env).submit(roll.id));
    let settled = wait_for_settled(&env.state, roll.id, SETTLE).await?;
    assert_eq!(settled.status, RollStatus::Completed);
    assert_eq!(settled.result, vec![3, 4]);
    assert_eq!(settled.total, Some(3 + 4 + 5));
    assert!(settled.rolled_at.is_some());
    Ok(())
}

#[tokio::test]
async fn bounds_are_inclusive_at_one_hundred() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![1]).await?;

    let err = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 6, 101))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDiceCount);
    assert_eq!(err.status().as_u16(), 400);

    let err = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 101, 6, 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidModifier);

    let err = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 7, 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDiceType);

    let roll = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 100, 6, 100)).await?;
    assert_eq!(roll.dice_count, 100);
    assert_eq!(roll.modifier, 100);
    Ok(())
}

#[tokio::test]
async fn invalidated_roll_accepts_no_further_changes() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![6]).await?;
    let roll = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 6, 1)).await?;
    executor(&env).submit(roll.id);
    let settled = wait_for_settled(&env.state, roll.id, SETTLE).await?;
    assert_eq!(settled.status, RollStatus::Completed);

    let gone = invalidate(&env, t.gm.id, roll.id).await?;
    assert_eq!(gone.status, RollStatus::Invalidated);
    assert_eq!(gone.invalidated_by, Some(t.gm.id));

    let err = override_intention(&env, t.gm.id, roll.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RollInvalidated);
    let err = manually_resolve(&env, t.gm.id, roll.id, 12).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RollInvalidated);
    let err = invalidate(&env, t.gm.id, roll.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RollInvalidated);
    Ok(())
}

#[tokio::test]
async fn override_keeps_the_original_intention() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![2]).await?;
    let roll = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 20, 1)).await?;

    let err = override_intention(&env, t.player.id, roll.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);

    let first = override_intention(&env, t.gm.id, roll.id).await?;
    assert!(first.was_overridden);
    assert_eq!(first.intention, "Intimidation");
    assert_eq!(first.original_intention.as_deref(), Some("Persuasion"));
    assert_eq!(first.overridden_by, Some(t.gm.id));
    assert_eq!(first.override_reason.as_deref(), Some("Tone was threatening"));

    let second = override_intention(&env, t.gm.id, roll.id).await?;
    assert_eq!(second.original_intention.as_deref(), Some("Persuasion"));
    Ok(())
}

#[tokio::test]
async fn manual_resolution_wins_over_the_executor() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![1]).await?;
    let roll = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 20, 1)).await?;

    let resolved = manually_resolve(&env, t.gm.id, roll.id, 17).await?;
    assert_eq!(resolved.status, RollStatus::Completed);
    assert_eq!(resolved.manual_result, Some(17));
    assert_eq!(resolved.total, Some(17));

    // A late executor job is a no-op.
    executor(&env).submit(roll.id);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let after = wait_for_settled(&env.state, roll.id, SETTLE).await?;
    assert_eq!(after.total, Some(17));

    let err = manually_resolve(&env, t.gm.id, roll.id, 3).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RollAlreadyResolved);
    Ok(())
}

#[tokio::test]
async fn unresolved_listing_is_gm_only() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![1]).await?;
    let pending = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 8, 1)).await?;
    let service = RollService::from_state(&env.state);

    let (svc, gm, campaign) = (service.clone(), t.gm.id, t.campaign.id);
    let listed = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_unresolved_for_campaign(txn, gm, campaign).await })
    })
    .await?;
    assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![pending.id]);

    let (svc, player) = (service.clone(), t.player.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_unresolved_for_campaign(txn, player, campaign).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);

    let (svc, scene, alice) = (service.clone(), t.scene.id, t.alice.id);
    let mine = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_pending_for_character(txn, player, scene, alice).await })
    })
    .await?;
    assert_eq!(mine.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rolls_on_a_hidden_post_stay_with_its_witnesses() -> Result<(), AppError> {
    let (env, t) = pc_table(vec![1]).await?;
    let hidden = PostContent {
        is_hidden: true,
        ..post_as(Some(t.alice.id), "Alice palms the key.")
    };
    let post = lock_and_submit(&env.state, t.player.id, t.scene.id, hidden).await?;
    let mut req = roll_request(t.alice.id, 0, 20, 1);
    req.post_id = Some(post.id);
    let secret = create_roll(&env.state, t.player.id, t.scene.id, req).await?;
    let open = create_roll(&env.state, t.player.id, t.scene.id, roll_request(t.alice.id, 0, 6, 1)).await?;
    let service = RollService::from_state(&env.state);

    let (svc, other, roll_id) = (service.clone(), t.other.id, secret.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.get_roll(txn, other, roll_id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RollNotFound);

    let (svc, scene) = (service.clone(), t.scene.id);
    let listed = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_by_scene(txn, other, scene).await })
    })
    .await?;
    assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![open.id]);

    let (svc, player) = (service.clone(), t.player.id);
    let own = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list_by_scene(txn, player, scene).await })
    })
    .await?;
    assert_eq!(own.len(), 2);

    let (svc, gm) = (service.clone(), t.gm.id);
    let seen = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.get_roll(txn, gm, roll_id).await })
    })
    .await?;
    assert_eq!(seen.post_id, Some(post.id));
    Ok(())
}
