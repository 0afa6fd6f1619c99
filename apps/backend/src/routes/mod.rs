use actix_web::web;

use crate::health;
use crate::middleware::jwt_extract::JwtExtract;

pub mod compose_locks;
pub mod passes;
pub mod phase;
pub mod posts;
pub mod rolls;
pub mod roster;

/// Everything under `/api`, without the auth wrapper.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(phase::configure_routes)
        .configure(passes::configure_routes)
        .configure(compose_locks::configure_routes)
        .configure(rolls::configure_routes)
        .configure(posts::configure_routes)
        .configure(roster::configure_routes);
}

/// Full application routing: open `/health` plus the authenticated `/api`
/// scope. Used by `main` and by route tests alike.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure).service(
        web::scope("/api")
            .wrap(JwtExtract)
            .configure(configure_api),
    );
}
