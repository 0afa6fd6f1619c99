use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::entities::characters::CharacterKind;
use scriptorium::entities::pass_states::PassState;
use scriptorium::errors::ErrorCode;
use scriptorium::events::CoordinationEvent;
use scriptorium::infra::clock::Clock;
use scriptorium::repos::{characters, compose_locks};
use scriptorium::services::roster::RosterService;
use scriptorium::AppError;

use crate::support::actions::{acquire_lock, force_transition, set_pass};
use crate::support::factory::seed_table;
use crate::support::test_state::test_env;

#[tokio::test]
async fn gm_appends_characters_to_the_roster() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let service = RosterService::from_state(&env.state);
    let now = env.state.clock.now();

    let (campaign, player) = (t.campaign.id, t.player.id);
    let carol = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            Ok(characters::create_character(txn, campaign, Some(player), "Carol", CharacterKind::Pc, now).await?)
        })
    })
    .await?;

    let (svc, scene, carol_id) = (service.clone(), t.scene.id, carol.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.add_character(txn, player, scene, carol_id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);

    let (svc, gm) = (service.clone(), t.gm.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.add_character(txn, gm, scene, carol_id).await })
    })
    .await?;
    assert_eq!(out.value.position, 3);
    assert!(matches!(
        out.events.as_slice(),
        [CoordinationEvent::CharacterJoinedScene { character_id, .. }] if *character_id == carol_id
    ));

    let svc = service.clone();
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.add_character(txn, gm, scene, carol_id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CharacterAlreadyInScene);

    let svc = service.clone();
    let roster = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.list(txn, player, scene).await })
    })
    .await?;
    let ids: Vec<i64> = roster.iter().map(|e| e.character_id).collect();
    assert_eq!(ids, vec![t.alice.id, t.bob.id, t.npc.id, carol.id]);
    Ok(())
}

#[tokio::test]
async fn removal_drops_pass_and_lock() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    set_pass(&env.state, t.player.id, t.scene.id, t.alice.id, PassState::HardPassed).await?;
    let lock = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;

    let service = RosterService::from_state(&env.state);
    let (svc, gm, scene, alice) = (service.clone(), t.gm.id, t.scene.id, t.alice.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.remove_character(txn, gm, scene, alice).await })
    })
    .await?;
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoordinationEvent::LockReleased { lock_id, .. } if *lock_id == lock.id)));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoordinationEvent::CharacterLeftScene { .. })));

    let remaining = with_txn(None, &env.state, |txn| {
        Box::pin(async move { Ok(compose_locks::find_by_scene(txn, scene).await?) })
    })
    .await?;
    assert!(remaining.is_none());

    let svc = service.clone();
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.remove_character(txn, gm, scene, alice).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CharacterNotInScene);
    Ok(())
}
