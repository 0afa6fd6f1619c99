use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::entities::pass_states::PassState;
use scriptorium::entities::phase_transitions::TransitionReason;
use scriptorium::errors::ErrorCode;
use scriptorium::events::CoordinationEvent;
use scriptorium::repos::scenes;
use scriptorium::infra::clock::Clock;
use scriptorium::services::compose_locks::ComposeLockService;
use scriptorium::services::phase::{PhaseService, PhaseStatus};
use scriptorium::services::rolls::RollService;
use scriptorium::AppError;
use time::Duration;

use crate::support::actions::{
    acquire_lock, create_roll, force_transition, roll_request, set_pass, transition,
};
use crate::support::factory::{add_scene, seed_table, Table};
use crate::support::test_state::{test_env, TestEnv};

async fn status(env: &TestEnv, user_id: i64, campaign_id: i64) -> Result<PhaseStatus, AppError> {
    let service = PhaseService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { service.get_status(txn, user_id, campaign_id).await })
    })
    .await
}

async fn pause(env: &TestEnv, user_id: i64, campaign_id: i64) -> Result<(), AppError> {
    let service = PhaseService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            service.pause(txn, user_id, campaign_id).await?;
            Ok(())
        })
    })
    .await
}

async fn resume(env: &TestEnv, user_id: i64, campaign_id: i64) -> Result<(), AppError> {
    let service = PhaseService::from_state(&env.state);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            service.resume(txn, user_id, campaign_id).await?;
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn entering_pc_phase_sets_deadline_and_resets_passes() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let campaign = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    assert_eq!(campaign.phase, CampaignPhase::PcPhase);
    assert_eq!(
        campaign.phase_expires_at,
        Some(env.clock.now() + Duration::hours(24))
    );

    set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::HardPassed).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase).await?;
    transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;

    let report = status(&env, t.player.id, t.campaign.id).await?;
    assert_eq!(report.guards.unpassed_character_ids, t.roster());
    Ok(())
}

#[tokio::test]
async fn guards_report_each_blocker_in_turn() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;

    let lock = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;
    let roll = create_roll(&env.state, t.other.id, t.scene.id, roll_request(t.bob.id, 0, 20, 1)).await?;

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ActiveComposeLocks);
    assert_eq!(err.status().as_u16(), 409);

    let locks = ComposeLockService::from_state(&env.state);
    let (player, lock_id) = (t.player.id, lock.id);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { locks.release(txn, player, lock_id).await })
    })
    .await?;

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PendingRolls);

    let rolls = RollService::from_state(&env.state);
    let (gm, roll_id) = (t.gm.id, roll.id);
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { rolls.invalidate(txn, gm, roll_id).await })
    })
    .await?;

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAllPassed);

    set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::Passed).await?;
    set_pass(&env.state, t.other.id, t.scene.id, t.bob.id, PassState::HardPassed).await?;
    set_pass(&env.state, t.gm.id, t.scene.id, t.npc.id, PassState::Passed).await?;

    assert!(status(&env, t.gm.id, t.campaign.id).await?.guards.is_clear());
    let campaign = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase).await?;
    assert_eq!(campaign.phase, CampaignPhase::GmPhase);
    assert_eq!(campaign.phase_expires_at, None);
    Ok(())
}

/// pc_phase with every main-scene character hard-passed.
async fn passed_pc_table(env: &TestEnv) -> Result<Table, AppError> {
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::HardPassed).await?;
    set_pass(&env.state, t.other.id, t.scene.id, t.bob.id, PassState::HardPassed).await?;
    set_pass(&env.state, t.gm.id, t.scene.id, t.npc.id, PassState::HardPassed).await?;
    Ok(t)
}

async fn archive(env: &TestEnv, scene_id: i64) -> Result<(), AppError> {
    with_txn(None, &env.state, |txn| {
        Box::pin(async move { Ok(scenes::set_archived(txn, scene_id, true).await?) })
    })
    .await
}

#[tokio::test]
async fn lock_in_an_archived_scene_still_blocks() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = passed_pc_table(&env).await?;
    let side = add_scene(&env.state, t.campaign.id, vec![t.alice.id]).await?;
    acquire_lock(&env.state, t.player.id, side.id, t.alice.id, false).await?;
    archive(&env, side.id).await?;

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ActiveComposeLocks);
    Ok(())
}

#[tokio::test]
async fn pending_roll_in_an_archived_scene_still_blocks() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = passed_pc_table(&env).await?;
    let side = add_scene(&env.state, t.campaign.id, vec![t.bob.id]).await?;
    let roll = create_roll(&env.state, t.other.id, side.id, roll_request(t.bob.id, 0, 20, 1)).await?;
    archive(&env, side.id).await?;

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PendingRolls);

    let rolls = RollService::from_state(&env.state);
    let (gm, campaign) = (t.gm.id, t.campaign.id);
    let unresolved = with_txn(None, &env.state, |txn| {
        Box::pin(async move { rolls.list_unresolved_for_campaign(txn, gm, campaign).await })
    })
    .await?;
    assert_eq!(unresolved.iter().map(|r| r.id).collect::<Vec<_>>(), vec![roll.id]);
    Ok(())
}

#[tokio::test]
async fn force_transition_bypasses_guards_and_is_audited() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;
    create_roll(&env.state, t.other.id, t.scene.id, roll_request(t.bob.id, 0, 6, 2)).await?;

    let service = PhaseService::from_state(&env.state);
    let (gm, campaign_id) = (t.gm.id, t.campaign.id);
    let svc = service.clone();
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            svc.force_transition(txn, gm, campaign_id, CampaignPhase::GmPhase)
                .await
        })
    })
    .await?;
    assert_eq!(out.value.phase, CampaignPhase::GmPhase);
    assert!(out.events.iter().any(|e| matches!(
        e,
        CoordinationEvent::PhaseTransitioned { forced: true, .. }
    )));

    let history = with_txn(None, &env.state, |txn| {
        Box::pin(async move { service.history(txn, gm, campaign_id).await })
    })
    .await?;
    let reasons: Vec<_> = history.iter().map(|h| h.reason).collect();
    assert_eq!(reasons, vec![TransitionReason::Gm, TransitionReason::GmForce]);
    assert_eq!(history[1].from_phase, CampaignPhase::PcPhase);
    assert_eq!(history[1].to_phase, CampaignPhase::GmPhase);
    Ok(())
}

#[tokio::test]
async fn same_phase_and_non_gm_are_refused() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::GmPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyInPhase);

    let err = force_transition(&env.state, t.player.id, t.campaign.id, CampaignPhase::PcPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);
    assert_eq!(err.status().as_u16(), 403);
    Ok(())
}

#[tokio::test]
async fn paused_campaign_refuses_every_transition() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    pause(&env, t.gm.id, t.campaign.id).await?;
    let err = pause(&env, t.gm.id, t.campaign.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyPaused);

    let err = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CampaignPaused);
    let err = force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CampaignPaused);

    resume(&env, t.gm.id, t.campaign.id).await?;
    let err = resume(&env, t.gm.id, t.campaign.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotPaused);
    transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    Ok(())
}

#[tokio::test]
async fn pause_freezes_the_countdown() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let campaign = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    let deadline = campaign.phase_expires_at.expect("pc_phase has a deadline");

    env.clock.advance(Duration::hours(20));
    pause(&env, t.gm.id, t.campaign.id).await?;
    env.clock.advance(Duration::hours(10));

    let paused = status(&env, t.player.id, t.campaign.id).await?;
    assert!(paused.is_paused);
    assert!(!paused.is_expired, "countdown is frozen while paused");

    resume(&env, t.gm.id, t.campaign.id).await?;
    let resumed = status(&env, t.player.id, t.campaign.id).await?;
    assert_eq!(resumed.phase_expires_at, Some(deadline + Duration::hours(10)));
    assert!(!resumed.is_expired);

    env.clock.advance(Duration::hours(4));
    assert!(status(&env, t.player.id, t.campaign.id).await?.is_expired);
    Ok(())
}

#[tokio::test]
async fn campaign_time_gate_overrides_default() -> Result<(), AppError> {
    use scriptorium::adapters::campaigns_sea::CampaignCreate;
    use scriptorium::entities::campaign_members::MemberRole;
    use scriptorium::repos::campaigns;

    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let now = env.clock.now();
    let gm = t.gm.id;
    let campaign = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            let c = campaigns::create_campaign(
                txn,
                CampaignCreate::new("One-shot", gm).with_time_gate_secs(3600),
                now,
            )
            .await?;
            campaigns::create_membership(txn, c.id, gm, MemberRole::Gm, now).await?;
            Ok(c)
        })
    })
    .await?;

    let updated = transition(&env.state, gm, campaign.id, CampaignPhase::PcPhase).await?;
    assert_eq!(updated.phase_expires_at, Some(now + Duration::hours(1)));
    Ok(())
}
