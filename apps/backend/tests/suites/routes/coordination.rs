//! Locks, posts, passes and rolls over HTTP.

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem;
use scriptorium::entities::campaigns::CampaignPhase;
use serde_json::{json, Value};

use crate::support::actions::force_transition;
use crate::support::app_builder::create_test_app;
use crate::support::auth::bearer_for;
use crate::support::factory::seed_table;
use crate::support::test_state::test_env;

#[actix_web::test]
async fn phase_status_reports_guards() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let player = bearer_for(&t.player, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{}/phase", t.campaign.id))
        .insert_header(("Authorization", player))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["campaign_id"], t.campaign.id);
    assert_eq!(body["phase"], "gm_phase");
    assert_eq!(body["is_paused"], false);
    assert!(body["phase_expires_at"].is_null());
    Ok(())
}

#[actix_web::test]
async fn player_cannot_transition() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let player = bearer_for(&t.player, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/campaigns/{}/phase/transition", t.campaign.id))
        .insert_header(("Authorization", player))
        .set_json(json!({ "to_phase": "pc_phase" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "NOT_GM").await;
    Ok(())
}

#[actix_web::test]
async fn second_lock_on_a_scene_conflicts() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    let player = bearer_for(&t.player, &env.state.security);
    let other = bearer_for(&t.other, &env.state.security);
    let app = create_test_app(env.state).await;
    let uri = format!("/api/scenes/{}/compose-locks", t.scene.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(("Authorization", player))
        .set_json(json!({ "character_id": t.alice.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let lock: Value = test::read_body_json(resp).await;
    assert_eq!(lock["character_id"], t.alice.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(("Authorization", other))
        .set_json(json!({ "character_id": t.bob.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::CONFLICT, "LOCK_ALREADY_HELD").await;
    Ok(())
}

#[actix_web::test]
async fn narration_stays_hidden_until_unhidden() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let gm = bearer_for(&t.gm, &env.state.security);
    let player = bearer_for(&t.player, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/scenes/{}/posts", t.scene.id))
        .insert_header(("Authorization", gm.clone()))
        .set_json(json!({
            "blocks": [{ "kind": "narrative", "content": "The door creaks open." }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(resp).await;
    let post_id = post["id"].as_i64().ok_or("post id")?;
    assert_eq!(post["witnesses"], json!([]));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{post_id}"))
        .insert_header(("Authorization", player.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::NOT_FOUND, "POST_NOT_FOUND").await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{post_id}/unhide"))
        .insert_header(("Authorization", gm))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let revealed: Value = test::read_body_json(resp).await;
    assert_eq!(revealed["witnesses"], json!(t.roster()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{post_id}"))
        .insert_header(("Authorization", player))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn malformed_unhide_body_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let gm = bearer_for(&t.gm, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::post()
        .uri("/api/posts/1/unhide")
        .insert_header(("Authorization", gm))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
    Ok(())
}

#[actix_web::test]
async fn roll_settles_in_the_background() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().with_dice(vec![6, 2]).build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    let player = bearer_for(&t.player, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/scenes/{}/rolls", t.scene.id))
        .insert_header(("Authorization", player.clone()))
        .set_json(json!({
            "character_id": t.alice.id,
            "intention": "Athletics",
            "modifier": 1,
            "dice_type": 6,
            "dice_count": 2
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let roll: Value = test::read_body_json(resp).await;
    assert_eq!(roll["status"], "pending");
    let roll_id = roll["id"].as_i64().ok_or("roll id")?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let settled = loop {
        let req = test::TestRequest::get()
            .uri(&format!("/api/rolls/{roll_id}"))
            .insert_header(("Authorization", player.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        if body["status"] != "pending" {
            break body;
        }
        assert!(tokio::time::Instant::now() < deadline, "roll never settled");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(settled["status"], "completed");
    assert_eq!(settled["result"], json!([6, 2]));
    assert_eq!(settled["total"], 9);
    Ok(())
}

#[actix_web::test]
async fn out_of_range_roll_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    force_transition(&env.state, t.gm.id, t.campaign.id, CampaignPhase::PcPhase).await?;
    let player = bearer_for(&t.player, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/scenes/{}/rolls", t.scene.id))
        .insert_header(("Authorization", player))
        .set_json(json!({
            "character_id": t.alice.id,
            "intention": "Athletics",
            "dice_type": 7,
            "dice_count": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_DICE_TYPE").await;
    Ok(())
}
