use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::state::app_state::AppState;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    db: &'static str,
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let db = match state.db() {
        Some(conn) => match conn.ping().await {
            Ok(()) => "up",
            Err(_) => "down",
        },
        None => "absent",
    };
    HttpResponse::Ok().json(Health { status: "ok", db })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
