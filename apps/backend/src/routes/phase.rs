//! Campaign phase routes: status, transitions, pause and resume.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::entities::campaigns::CampaignPhase;
use crate::error::AppError;
use crate::extractors::{CampaignMembership, ValidatedJson};
use crate::services::PhaseService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    to_phase: CampaignPhase,
}

/// GET /api/campaigns/{campaign_id}/phase
async fn get_status(
    http_req: HttpRequest,
    member: CampaignMembership,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PhaseService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let status = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.get_status(txn, user_id, campaign_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

/// GET /api/campaigns/{campaign_id}/phase/history
async fn get_history(
    http_req: HttpRequest,
    member: CampaignMembership,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PhaseService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let history = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.history(txn, user_id, campaign_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(history))
}

async fn run_transition(
    http_req: HttpRequest,
    member: CampaignMembership,
    body: TransitionRequest,
    app_state: web::Data<AppState>,
    forced: bool,
) -> Result<HttpResponse, AppError> {
    let service = PhaseService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let to = body.to_phase;
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            if forced {
                service.force_transition(txn, user_id, campaign_id, to).await
            } else {
                service.transition(txn, user_id, campaign_id, to).await
            }
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

/// POST /api/campaigns/{campaign_id}/phase/transition
async fn transition(
    http_req: HttpRequest,
    member: CampaignMembership,
    body: ValidatedJson<TransitionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    run_transition(http_req, member, body.into_inner(), app_state, false).await
}

/// POST /api/campaigns/{campaign_id}/phase/force-transition
async fn force_transition(
    http_req: HttpRequest,
    member: CampaignMembership,
    body: ValidatedJson<TransitionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    run_transition(http_req, member, body.into_inner(), app_state, true).await
}

/// POST /api/campaigns/{campaign_id}/pause
async fn pause(
    http_req: HttpRequest,
    member: CampaignMembership,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PhaseService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.pause(txn, user_id, campaign_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

/// POST /api/campaigns/{campaign_id}/resume
async fn resume(
    http_req: HttpRequest,
    member: CampaignMembership,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PhaseService::from_state(&app_state);
    let (user_id, campaign_id) = (member.user_id(), member.campaign_id);
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.resume(txn, user_id, campaign_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/campaigns/{campaign_id}/phase", web::get().to(get_status))
        .route(
            "/campaigns/{campaign_id}/phase/history",
            web::get().to(get_history),
        )
        .route(
            "/campaigns/{campaign_id}/phase/transition",
            web::post().to(transition),
        )
        .route(
            "/campaigns/{campaign_id}/phase/force-transition",
            web::post().to(force_transition),
        )
        .route("/campaigns/{campaign_id}/pause", web::post().to(pause))
        .route("/campaigns/{campaign_id}/resume", web::post().to(resume));
}
