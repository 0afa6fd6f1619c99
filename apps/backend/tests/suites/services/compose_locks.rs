use scriptorium::adapters::compose_locks_sea::LockCreate;
use scriptorium::db::txn::with_txn;
use scriptorium::errors::ErrorCode;
use scriptorium::events::CoordinationEvent;
use scriptorium::infra::clock::Clock;
use scriptorium::repos::compose_locks;
use scriptorium::services::compose_locks::ComposeLockService;
use scriptorium::AppError;
use time::Duration;

use crate::support::actions::acquire_lock;
use crate::support::factory::seed_table;
use crate::support::test_state::test_env;

#[tokio::test]
async fn second_acquire_in_scene_conflicts() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let lock = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;
    assert_eq!(lock.expires_at - lock.acquired_at, Duration::seconds(600));

    let err = acquire_lock(&env.state, t.other.id, t.scene.id, t.bob.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LockAlreadyHeld);
    Ok(())
}

#[tokio::test]
async fn concurrent_acquires_yield_exactly_one_lock() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let (a, b) = tokio::join!(
        acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false),
        acquire_lock(&env.state, t.other.id, t.scene.id, t.bob.id, false),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = a.err().or(b.err()).expect("one acquire must fail");
    assert_eq!(loser.code(), ErrorCode::LockAlreadyHeld);
    Ok(())
}

/// Two writers that both saw an empty scene race on the insert; the
/// unique scene index decides, and the loser surfaces as a lock conflict.
#[tokio::test]
async fn unique_scene_index_rejects_a_second_lock_row() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let now = env.clock.now();
    let row = move |character_id: i64, user_id: i64| LockCreate {
        scene_id: t.scene.id,
        character_id,
        user_id,
        acquired_at: now,
        expires_at: now + Duration::seconds(600),
        is_hidden: false,
    };
    let (first, second) = (row(t.alice.id, t.player.id), row(t.bob.id, t.other.id));

    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            compose_locks::insert_lock(txn, first).await?;
            compose_locks::insert_lock(txn, second).await?;
            Ok(())
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LockAlreadyHeld);
    Ok(())
}

#[tokio::test]
async fn expired_lock_is_absent_and_replaceable() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let first = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;
    env.clock.advance(Duration::seconds(601));

    let service = ComposeLockService::from_state(&env.state);
    let (gm_id, scene_id) = (t.gm.id, t.scene.id);
    let listed = with_txn(None, &env.state, |txn| {
        Box::pin(async move { service.list_for_scene(txn, gm_id, scene_id).await })
    })
    .await?;
    assert!(listed.is_empty(), "expired lock must not be listed");

    let second = acquire_lock(&env.state, t.other.id, t.scene.id, t.bob.id, false).await?;
    assert_ne!(first.id, second.id);
    assert_eq!(second.user_id, t.other.id);
    Ok(())
}

#[tokio::test]
async fn heartbeat_extends_and_fails_after_expiry() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let lock = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;
    let service = ComposeLockService::from_state(&env.state);

    env.clock.advance(Duration::seconds(300));
    let (svc, user, id) = (service.clone(), t.player.id, lock.id);
    let beat = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.heartbeat(txn, user, id).await })
    })
    .await?;
    assert!(beat.expires_at > lock.expires_at);
    assert_eq!(beat.expires_at, env.clock.now() + Duration::seconds(600));

    let (svc, stranger) = (service.clone(), t.other.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.heartbeat(txn, stranger, id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotLockOwner);

    env.clock.advance(Duration::seconds(601));
    let svc = service.clone();
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.heartbeat(txn, user, id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LockNotFound);
    Ok(())
}

#[tokio::test]
async fn acquire_requires_ownership_and_roster() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let err = acquire_lock(&env.state, t.player.id, t.scene.id, t.bob.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotCharacterOwner);

    let err = acquire_lock(&env.state, t.outsider.id, t.scene.id, t.alice.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAMember);

    // GM may act for the NPC.
    acquire_lock(&env.state, t.gm.id, t.scene.id, t.npc.id, false).await?;
    Ok(())
}

#[tokio::test]
async fn release_and_force_release_rules() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let service = ComposeLockService::from_state(&env.state);

    let lock = acquire_lock(&env.state, t.player.id, t.scene.id, t.alice.id, false).await?;
    let id = lock.id;

    let (svc, other) = (service.clone(), t.other.id);
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.release(txn, other, id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotLockOwner);

    let svc = service.clone();
    let err = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.force_release(txn, other, id).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotGm);

    let (svc, gm) = (service.clone(), t.gm.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.force_release(txn, gm, id).await })
    })
    .await?;
    assert!(matches!(
        out.events.as_slice(),
        [CoordinationEvent::LockReleased { lock_id, .. }] if *lock_id == id
    ));

    // Scene is free again.
    acquire_lock(&env.state, t.other.id, t.scene.id, t.bob.id, false).await?;
    Ok(())
}

#[tokio::test]
async fn hidden_lock_conceals_identity() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let service = ComposeLockService::from_state(&env.state);

    let (svc, player, scene, alice) = (service.clone(), t.player.id, t.scene.id, t.alice.id);
    let out = with_txn(None, &env.state, |txn| {
        Box::pin(async move { svc.acquire(txn, player, scene, alice, true).await })
    })
    .await?;
    assert!(matches!(
        out.events.as_slice(),
        [CoordinationEvent::LockAcquired {
            character_id: None,
            user_id: None,
            ..
        }]
    ));

    for (reader, reveals) in [(t.other.id, false), (t.gm.id, true), (t.player.id, true)] {
        let svc = service.clone();
        let views = with_txn(None, &env.state, |txn| {
            Box::pin(async move { svc.list_for_scene(txn, reader, scene).await })
        })
        .await?;
        assert_eq!(views.len(), 1);
        assert!(views[0].is_hidden);
        assert_eq!(views[0].character_id.is_some(), reveals, "reader {reader}");
    }
    Ok(())
}
