use std::sync::Arc;

use crate::config::coordination::CoordinationConfig;
use crate::config::db::{DbKind, RuntimeEnv};
use crate::error::AppError;
use crate::events::{EventSink, NoopEventSink};
use crate::infra::clock::{Clock, SystemClock};
use crate::infra::db::bootstrap_db;
use crate::services::rolls::dice::{DiceRoller, ThreadRngRoller};
use crate::services::rolls::executor::RollExecutor;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    runtime: RuntimeEnv,
    db_kind: Option<DbKind>,
    security_config: SecurityConfig,
    coordination: CoordinationConfig,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    roller: Arc<dyn DiceRoller>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            runtime: RuntimeEnv::Prod,
            db_kind: None,
            security_config: SecurityConfig::default(),
            coordination: CoordinationConfig::default(),
            clock: Arc::new(SystemClock),
            events: Arc::new(NoopEventSink),
            roller: Arc::new(ThreadRngRoller),
        }
    }

    pub fn with_env(mut self, runtime: RuntimeEnv) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = Some(kind);
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub fn with_coordination(mut self, coordination: CoordinationConfig) -> Self {
        self.coordination = coordination;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_dice_roller(mut self, roller: Arc<dyn DiceRoller>) -> Self {
        self.roller = roller;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let Some(kind) = self.db_kind else {
            return Ok(AppState::new(
                None,
                self.security_config,
                self.coordination,
                self.clock,
                self.events,
                None,
            ));
        };

        // single entrypoint: connect + migrate, then start the roll workers
        let conn = bootstrap_db(self.runtime, kind).await?;
        let executor = RollExecutor::spawn(
            conn.clone(),
            self.roller,
            Arc::clone(&self.clock),
            Arc::clone(&self.events),
            self.coordination.roll_workers,
            self.coordination.roll_queue_capacity,
        );
        Ok(AppState::new(
            Some(conn),
            self.security_config,
            self.coordination,
            self.clock,
            self.events,
            Some(executor),
        ))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
