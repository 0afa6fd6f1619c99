use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::config::coordination::CoordinationConfig;
use crate::events::EventSink;
use crate::infra::clock::Clock;
use crate::services::rolls::executor::RollExecutor;

/// Shared application state, built once by `StateBuilder` and handed to
/// actix as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection (absent in some tests)
    db: Option<DatabaseConnection>,
    pub security: SecurityConfig,
    pub coordination: CoordinationConfig,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
    /// Present whenever a database is configured.
    pub rolls: Option<RollExecutor>,
}

impl AppState {
    pub fn new(
        db: Option<DatabaseConnection>,
        security: SecurityConfig,
        coordination: CoordinationConfig,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        rolls: Option<RollExecutor>,
    ) -> Self {
        Self {
            db,
            security,
            coordination,
            clock,
            events,
            rolls,
        }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
