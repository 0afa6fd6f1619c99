use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use scriptorium::config::coordination::CoordinationConfig;
use scriptorium::config::db::{DbKind, RuntimeEnv};
use scriptorium::events::{EventSink, NoopEventSink, RedisEventSink};
use scriptorium::infra::state::build_state;
use scriptorium::middleware::cors::cors_middleware;
use scriptorium::middleware::request_trace::RequestTrace;
use scriptorium::middleware::structured_logger::StructuredLogger;
use scriptorium::middleware::trace_span::TraceSpan;
use scriptorium::routes;
use scriptorium::state::security_config::SecurityConfig;
use scriptorium::telemetry;
use tracing::{error, info, warn};

fn fail(message: impl std::fmt::Display) -> ! {
    error!("{message}");
    eprintln!("❌ {message}");
    std::process::exit(1);
}

async fn event_sink() -> Arc<dyn EventSink> {
    match std::env::var("REDIS_URL") {
        Ok(url) if !url.trim().is_empty() => match RedisEventSink::connect(&url).await {
            Ok(sink) => {
                info!("publishing coordination events to redis");
                Arc::new(sink)
            }
            Err(e) => fail(format!("REDIS_URL is set but redis is unreachable: {e}")),
        },
        _ => {
            warn!("REDIS_URL not set; coordination events are dropped");
            Arc::new(NoopEventSink)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: docker-compose env_file or docker run --env-file
    // - Local dev: source an env file (set -a; . ./.env; set +a)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| fail("BACKEND_PORT must be a valid port number"));

    let jwt = std::env::var("BACKEND_JWT_SECRET")
        .unwrap_or_else(|_| fail("BACKEND_JWT_SECRET must be set"));
    let coordination = CoordinationConfig::from_env().unwrap_or_else(|e| fail(e));

    let app_state = build_state()
        .with_env(RuntimeEnv::Prod)
        .with_db(DbKind::Postgres)
        .with_security(SecurityConfig::new(jwt.as_bytes()))
        .with_coordination(coordination)
        .with_events(event_sink().await)
        .build()
        .await
        .unwrap_or_else(|e| fail(format!("Failed to build application state: {e}")));

    info!(%host, port, "starting Scriptorium backend");

    let rolls = app_state.rolls.clone();
    let data = web::Data::new(app_state);

    let served = HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    if let Some(rolls) = rolls {
        rolls.shutdown().await;
    }
    served
}
