use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::services::RosterService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct AddCharacterRequest {
    character_id: i64,
}

/// GET /api/scenes/{scene_id}/roster
async fn list_roster(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RosterService::from_state(&app_state);
    let scene_id = path.into_inner();
    let roster = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.list(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(roster))
}

/// POST /api/scenes/{scene_id}/roster
async fn add_character(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<AddCharacterRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RosterService::from_state(&app_state);
    let scene_id = path.into_inner();
    let character_id = body.character_id;
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .add_character(txn, user.id, scene_id, character_id)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Created().json(outcome.publish(&app_state.events)))
}

/// DELETE /api/scenes/{scene_id}/roster/{character_id}
async fn remove_character(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<(i64, i64)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = RosterService::from_state(&app_state);
    let (scene_id, character_id) = path.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .remove_character(txn, user.id, scene_id, character_id)
                .await
        })
    })
    .await?;
    outcome.publish(&app_state.events);
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/scenes/{scene_id}/roster", web::get().to(list_roster))
        .route("/scenes/{scene_id}/roster", web::post().to(add_character))
        .route(
            "/scenes/{scene_id}/roster/{character_id}",
            web::delete().to(remove_character),
        );
}
