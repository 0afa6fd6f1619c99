//! Dice roll routes.
//!
//! Creating a roll commits it as `pending` and then hands its id to the
//! roll executor; the response never waits for the dice.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::warn;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::extractors::{CampaignMembership, CurrentUser, ValidatedJson};
use crate::services::rolls::CreateRollRequest;
use crate::services::RollService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct OverrideRequest {
    intention: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManualResolveRequest {
    result: i32,
    #[serde(default)]
    reason: Option<String>,
}

/// POST /api/scenes/{scene_id}/rolls
async fn create_roll(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<CreateRollRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let scene_id = path.into_inner();
    let request = body.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.create_roll(txn, user.id, scene_id, request).await })
    })
    .await?;

    let roll = outcome.publish(&app_state.events);
    match &app_state.rolls {
        Some(executor) => {
            executor.submit(roll.id);
        }
        None => warn!(roll_id = roll.id, "no roll executor; roll left pending"),
    }
    Ok(HttpResponse::Created().json(roll))
}

/// GET /api/scenes/{scene_id}/rolls
async fn list_scene_rolls(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let scene_id = path.into_inner();
    let rolls = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.list_by_scene(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(rolls))
}

/// GET /api/scenes/{scene_id}/characters/{character_id}/rolls/pending
async fn list_pending_for_character(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<(i64, i64)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let (scene_id, character_id) = path.into_inner();
    let rolls = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .list_pending_for_character(txn, user.id, scene_id, character_id)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(rolls))
}

/// GET /api/campaigns/{campaign_id}/rolls/unresolved
async fn list_unresolved(
    http_req: HttpRequest,
    member: CampaignMembership,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let rolls = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .list_unresolved_for_campaign(txn, user_id, campaign_id)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(rolls))
}

/// GET /api/posts/{post_id}/rolls
async fn list_post_rolls(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let post_id = path.into_inner();
    let rolls = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.list_by_post(txn, user.id, post_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(rolls))
}

/// GET /api/rolls/{roll_id}
async fn get_roll(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let roll_id = path.into_inner();
    let roll = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.get_roll(txn, user.id, roll_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(roll))
}

/// POST /api/rolls/{roll_id}/override
async fn override_intention(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<OverrideRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let roll_id = path.into_inner();
    let OverrideRequest { intention, reason } = body.into_inner();
    let roll = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .override_intention(txn, user.id, roll_id, &intention, reason)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(roll))
}

/// POST /api/rolls/{roll_id}/manual-resolve
async fn manually_resolve(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<ManualResolveRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let roll_id = path.into_inner();
    let ManualResolveRequest { result, reason } = body.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .manually_resolve(txn, user.id, roll_id, result, reason)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

/// POST /api/rolls/{roll_id}/invalidate
async fn invalidate(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RollService::from_state(&app_state);
    let roll_id = path.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.invalidate(txn, user.id, roll_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/scenes/{scene_id}/rolls", web::get().to(list_scene_rolls))
        .route("/scenes/{scene_id}/rolls", web::post().to(create_roll))
        .route(
            "/scenes/{scene_id}/characters/{character_id}/rolls/pending",
            web::get().to(list_pending_for_character),
        )
        .route(
            "/campaigns/{campaign_id}/rolls/unresolved",
            web::get().to(list_unresolved),
        )
        .route("/posts/{post_id}/rolls", web::get().to(list_post_rolls))
        .route("/rolls/{roll_id}", web::get().to(get_roll))
        .route(
            "/rolls/{roll_id}/override",
            web::post().to(override_intention),
        )
        .route(
            "/rolls/{roll_id}/manual-resolve",
            web::post().to(manually_resolve),
        )
        .route("/rolls/{roll_id}/invalidate", web::post().to(invalidate));
}
