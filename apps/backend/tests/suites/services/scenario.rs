//! A whole turn: GM narration in private, the floor opens, a player answers.

use scriptorium::db::txn::with_txn;
use scriptorium::entities::campaigns::CampaignPhase;
use scriptorium::entities::pass_states::PassState;
use scriptorium::infra::clock::Clock;
use scriptorium::repos::{compose_locks, posts};
use scriptorium::services::passes::PassService;
use scriptorium::AppError;
use time::Duration;

use crate::support::actions::{get_post, lock_and_submit, post_as, submit, transition};
use crate::support::factory::{add_scene, seed_table};
use crate::support::test_state::test_env;

#[tokio::test]
async fn narration_backfill_then_player_post() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;

    let narration = submit(
        &env.state,
        t.gm.id,
        t.scene.id,
        post_as(None, "Rain hammers the shutters of the Crooked Lantern."),
    )
    .await?;
    assert!(narration.witnesses.is_empty());
    let err = get_post(&env.state, t.player.id, narration.id).await.unwrap_err();
    assert_eq!(err.status().as_u16(), 404);

    let campaign = transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    assert_eq!(
        campaign.phase_expires_at,
        Some(env.clock.now() + Duration::hours(24))
    );

    let passes = PassService::from_state(&env.state);
    let (gm, scene) = (t.gm.id, t.scene.id);
    let states = with_txn(None, &env.state, |txn| {
        Box::pin(async move { passes.scene_states(txn, gm, scene).await })
    })
    .await?;
    assert!(states.iter().all(|c| c.state == PassState::None));

    let revealed = get_post(&env.state, t.player.id, narration.id).await?;
    assert_eq!(revealed.witnesses, t.roster());

    let reply = lock_and_submit(
        &env.state,
        t.player.id,
        t.scene.id,
        post_as(Some(t.alice.id), "Alice shakes off her cloak and orders a cider."),
    )
    .await?;
    assert_eq!(reply.witnesses, t.roster());
    assert!(!reply.is_locked);

    let (narration_id, scene_id) = (narration.id, t.scene.id);
    let (narration_after, lock) = with_txn(None, &env.state, |txn| {
        Box::pin(async move {
            let post = posts::require_post(txn, narration_id).await?;
            let lock = compose_locks::find_by_scene(txn, scene_id).await?;
            Ok((post, lock))
        })
    })
    .await?;
    assert!(narration_after.is_locked);
    assert!(lock.is_none(), "submitting releases the author's lock");
    Ok(())
}

#[tokio::test]
async fn each_scene_reveals_narration_to_its_own_roster() -> Result<(), AppError> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let cellar = add_scene(&env.state, t.campaign.id, vec![t.bob.id]).await?;

    let tavern_note = submit(&env.state, t.gm.id, t.scene.id, post_as(None, "The fire gutters.")).await?;
    let cellar_note = submit(&env.state, t.gm.id, cellar.id, post_as(None, "Water drips in the dark.")).await?;
    assert!(cellar_note.witnesses.is_empty());

    transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;

    assert_eq!(get_post(&env.state, t.player.id, tavern_note.id).await?.witnesses, t.roster());
    let revealed = get_post(&env.state, t.other.id, cellar_note.id).await?;
    assert_eq!(revealed.witnesses, vec![t.bob.id]);
    Ok(())
}
