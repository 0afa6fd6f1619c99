use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::extractors::{CampaignMembership, CurrentUser, ValidatedJson};
use crate::services::passes::parse_state;
use crate::services::PassService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct SetPassRequest {
    state: String,
}

/// GET /api/campaigns/{campaign_id}/passes
async fn campaign_summary(
    http_req: HttpRequest,
    member: CampaignMembership,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PassService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let summary = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.summary(txn, user_id, campaign_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /api/scenes/{scene_id}/passes
async fn scene_states(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PassService::from_state(&app_state);
    let scene_id = path.into_inner();
    let states = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.scene_states(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(states))
}

/// PUT /api/scenes/{scene_id}/characters/{character_id}/pass
async fn set_pass(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<(i64, i64)>,
    body: ValidatedJson<SetPassRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PassService::from_state(&app_state);
    let (scene_id, character_id) = path.into_inner();
    let state = parse_state(&body.state)?;
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .set_pass(txn, user.id, scene_id, character_id, state)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

/// DELETE /api/scenes/{scene_id}/characters/{character_id}/pass
async fn clear_pass(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<(i64, i64)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PassService::from_state(&app_state);
    let (scene_id, character_id) = path.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .clear_pass(txn, user.id, scene_id, character_id)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/campaigns/{campaign_id}/passes",
        web::get().to(campaign_summary),
    )
    .route("/scenes/{scene_id}/passes", web::get().to(scene_states))
    .route(
        "/scenes/{scene_id}/characters/{character_id}/pass",
        web::put().to(set_pass),
    )
    .route(
        "/scenes/{scene_id}/characters/{character_id}/pass",
        web::delete().to(clear_pass),
    );
}
