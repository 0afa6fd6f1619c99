use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem;
use scriptorium::auth::jwt::mint_access_token;
use serde_json::Value;

use crate::support::app_builder::create_test_app;
use crate::support::auth::{bearer_for, expired_bearer};
use crate::support::factory::seed_table;
use crate::support::test_state::test_env;

#[actix_web::test]
async fn health_is_open() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let app = create_test_app(env.state).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "up");
    Ok(())
}

#[actix_web::test]
async fn api_rejects_missing_bearer() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{}/phase", t.campaign.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED_MISSING_BEARER").await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{}/phase", t.campaign.id))
        .insert_header(("Authorization", "Basic Zm9vOmJhcg=="))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED_MISSING_BEARER").await;
    Ok(())
}

#[actix_web::test]
async fn api_rejects_bad_and_expired_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let expired = expired_bearer(&t.player.sub, "player@example.test", &env.state.security);
    let app = create_test_app(env.state).await;
    let uri = format!("/api/campaigns/{}/phase", t.campaign.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(("Authorization", "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED_INVALID_JWT").await;

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(("Authorization", expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let problem = assert_problem(resp, StatusCode::UNAUTHORIZED, "UNAUTHORIZED_EXPIRED_JWT").await;
    assert_eq!(problem.status, 401);
    Ok(())
}

#[actix_web::test]
async fn unknown_subject_is_forbidden() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let token = mint_access_token(
        "ghost-sub",
        "ghost@example.test",
        std::time::SystemTime::now(),
        &env.state.security,
    )?;
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/scenes/{}/posts", t.scene.id))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "FORBIDDEN_USER_NOT_FOUND").await;
    Ok(())
}

#[actix_web::test]
async fn campaign_scoped_routes_check_membership() -> Result<(), Box<dyn std::error::Error>> {
    let env = test_env().build().await?;
    let t = seed_table(&env.state).await?;
    let outsider = bearer_for(&t.outsider, &env.state.security);
    let player = bearer_for(&t.player, &env.state.security);
    let app = create_test_app(env.state).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{}/phase", t.campaign.id))
        .insert_header(("Authorization", outsider))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::FORBIDDEN, "NOT_A_MEMBER").await;

    let req = test::TestRequest::get()
        .uri("/api/campaigns/not-a-number/phase")
        .insert_header(("Authorization", player))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_CAMPAIGN_ID").await;
    Ok(())
}
