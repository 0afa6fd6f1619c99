#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod errors;
pub mod events;
pub mod extractors;
pub mod health;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod trace_ctx;

// Re-exports for public API
pub use auth::claims::BackendClaims;
pub use auth::jwt::{mint_access_token, verify_access_token};
pub use config::coordination::CoordinationConfig;
pub use config::db::{db_url, DbKind, RuntimeEnv};
pub use error::AppError;
pub use errors::{DomainError, ErrorCode};
pub use events::{CoordinationEvent, EventSink, Outcome};
pub use extractors::{CampaignMembership, CurrentUser, ValidatedJson};
pub use infra::clock::{Clock, ManualClock, SystemClock};
pub use infra::db::connect_db;
pub use infra::state::{build_state, StateBuilder};
pub use middleware::cors::cors_middleware;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use middleware::trace_span::TraceSpan;
pub use state::app_state::AppState;
pub use state::security_config::SecurityConfig;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
