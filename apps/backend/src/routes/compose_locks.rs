use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::services::ComposeLockService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct AcquireLockRequest {
    character_id: i64,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Debug, Deserialize)]
struct UpdateLockRequest {
    is_hidden: bool,
}

/// GET /api/scenes/{scene_id}/compose-locks
async fn list_locks(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = ComposeLockService::from_state(&app_state);
    let scene_id = path.into_inner();
    let locks = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.list_for_scene(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(locks))
}

/// POST /api/scenes/{scene_id}/compose-locks
async fn acquire_lock(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<AcquireLockRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = ComposeLockService::from_state(&app_state);
    let scene_id = path.into_inner();
    let AcquireLockRequest {
        character_id,
        is_hidden,
    } = body.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .acquire(txn, user.id, scene_id, character_id, is_hidden)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Created().json(outcome.publish(&app_state.events)))
}

/// POST /api/compose-locks/{lock_id}/heartbeat
async fn heartbeat(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = ComposeLockService::from_state(&app_state);
    let lock_id = path.into_inner();
    let lock = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.heartbeat(txn, user.id, lock_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(lock))
}

/// DELETE /api/compose-locks/{lock_id}
async fn release(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = ComposeLockService::from_state(&app_state);
    let lock_id = path.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.release(txn, user.id, lock_id).await })
    })
    .await?;
    outcome.publish(&app_state.events);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/compose-locks/{lock_id}/force-release
async fn force_release(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = ComposeLockService::from_state(&app_state);
    let lock_id = path.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.force_release(txn, user.id, lock_id).await })
    })
    .await?;
    outcome.publish(&app_state.events);
    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /api/compose-locks/{lock_id}
async fn update_lock(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<UpdateLockRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = ComposeLockService::from_state(&app_state);
    let lock_id = path.into_inner();
    let is_hidden = body.is_hidden;
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .update_hidden(txn, user.id, lock_id, is_hidden)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/scenes/{scene_id}/compose-locks", web::get().to(list_locks))
        .route(
            "/scenes/{scene_id}/compose-locks",
            web::post().to(acquire_lock),
        )
        .route(
            "/compose-locks/{lock_id}/heartbeat",
            web::post().to(heartbeat),
        )
        .route(
            "/compose-locks/{lock_id}/force-release",
            web::post().to(force_release),
        )
        .route("/compose-locks/{lock_id}", web::delete().to(release))
        .route("/compose-locks/{lock_id}", web::patch().to(update_lock));
}
