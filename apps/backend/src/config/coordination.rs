//! Tunables for the coordination engine: lock lifetime, PC phase time gate
//! and the roll executor's pool size.

use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationConfig {
    /// How long a compose lock lives without a heartbeat.
    pub lock_ttl: Duration,
    /// PC phase deadline used when a campaign has no override.
    pub default_time_gate: Duration,
    pub roll_workers: usize,
    pub roll_queue_capacity: usize,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(600),
            default_time_gate: Duration::from_secs(24 * 60 * 60),
            roll_workers: 4,
            roll_queue_capacity: 256,
        }
    }
}

impl CoordinationConfig {
    /// Defaults overridden by `SCRIPTORIUM_LOCK_TTL_SECS`,
    /// `SCRIPTORIUM_TIME_GATE_SECS`, `SCRIPTORIUM_ROLL_WORKERS` and
    /// `SCRIPTORIUM_ROLL_QUEUE`. Each must be a positive integer.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            lock_ttl: read_positive("SCRIPTORIUM_LOCK_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.lock_ttl),
            default_time_gate: read_positive("SCRIPTORIUM_TIME_GATE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_time_gate),
            roll_workers: read_positive("SCRIPTORIUM_ROLL_WORKERS")?
                .map(|n| n as usize)
                .unwrap_or(defaults.roll_workers),
            roll_queue_capacity: read_positive("SCRIPTORIUM_ROLL_QUEUE")?
                .map(|n| n as usize)
                .unwrap_or(defaults.roll_queue_capacity),
        })
    }
}

fn read_positive(name: &str) -> Result<Option<u64>, AppError> {
    match env::var(name) {
        Err(_) => Ok(None),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(AppError::config(format!(
                "{name} must be a positive integer, got '{raw}'"
            ))),
        },
    }
}
