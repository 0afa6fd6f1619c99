//! Post routes: drafts, submission, fog-of-war reads and GM reveal tools.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::repos::posts::PostBlock;
use crate::services::posts::PostContent;
use crate::services::PostService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct EditPostRequest {
    blocks: Vec<PostBlock>,
    #[serde(default)]
    ooc_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UnhideRequest {
    #[serde(default)]
    witnesses: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct WitnessesRequest {
    witnesses: Vec<i64>,
}

/// An absent body means "reveal to everyone"; a malformed one is rejected
/// rather than read as absent.
fn parse_unhide(body: &[u8]) -> Result<UnhideRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UnhideRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::bad_request(ErrorCode::BadRequest, format!("Invalid unhide body: {e}"))
    })
}

/// GET /api/scenes/{scene_id}/posts
async fn list_posts(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let scene_id = path.into_inner();
    let posts = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.list_scene_posts(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/scenes/{scene_id}/posts
async fn submit_post(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<PostContent>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let scene_id = path.into_inner();
    let content = body.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.submit(txn, user.id, scene_id, content).await })
    })
    .await?;
    Ok(HttpResponse::Created().json(outcome.publish(&app_state.events)))
}

/// GET /api/scenes/{scene_id}/posts/hidden
async fn list_hidden(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let scene_id = path.into_inner();
    let posts = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.list_hidden(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/scenes/{scene_id}/draft
async fn get_draft(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let scene_id = path.into_inner();
    let draft = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.get_draft(txn, user.id, scene_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(draft))
}

/// PUT /api/scenes/{scene_id}/draft
async fn save_draft(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<PostContent>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let scene_id = path.into_inner();
    let content = body.into_inner();
    let draft = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.save_draft(txn, user.id, scene_id, content).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(draft))
}

/// GET /api/posts/{post_id}
async fn get_post(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let post_id = path.into_inner();
    let post = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.get_post(txn, user.id, post_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PATCH /api/posts/{post_id}
async fn update_post(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<EditPostRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let post_id = path.into_inner();
    let EditPostRequest { blocks, ooc_text } = body.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .update_post(txn, user.id, post_id, blocks, ooc_text)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

/// DELETE /api/posts/{post_id}
async fn delete_post(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let post_id = path.into_inner();
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { service.delete_post(txn, user.id, post_id).await })
    })
    .await?;
    outcome.publish(&app_state.events);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{post_id}/unhide
///
/// An empty body reveals the post to the whole current roster.
async fn unhide_post(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let post_id = path.into_inner();
    let witnesses = parse_unhide(&body)?.witnesses;
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .unhide_post(txn, user.id, post_id, witnesses)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

/// PUT /api/posts/{post_id}/witnesses
async fn edit_witnesses(
    http_req: HttpRequest,
    user: CurrentUser,
    path: web::Path<i64>,
    body: ValidatedJson<WitnessesRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let service = PostService::from_state(&app_state);
    let post_id = path.into_inner();
    let witnesses = body.into_inner().witnesses;
    let outcome = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            service
                .edit_witnesses(txn, user.id, post_id, witnesses)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(outcome.publish(&app_state.events)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/scenes/{scene_id}/posts", web::get().to(list_posts))
        .route("/scenes/{scene_id}/posts", web::post().to(submit_post))
        .route(
            "/scenes/{scene_id}/posts/hidden",
            web::get().to(list_hidden),
        )
        .route("/scenes/{scene_id}/draft", web::get().to(get_draft))
        .route("/scenes/{scene_id}/draft", web::put().to(save_draft))
        .route("/posts/{post_id}", web::get().to(get_post))
        .route("/posts/{post_id}", web::patch().to(update_post))
        .route("/posts/{post_id}", web::delete().to(delete_post))
        .route("/posts/{post_id}/unhide", web::post().to(unhide_post))
        .route(
            "/posts/{post_id}/witnesses",
            web::put().to(edit_witnesses),
        );
}
