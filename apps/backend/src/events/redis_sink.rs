use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use super::{CoordinationEvent, EventSink};
use crate::error::AppError;

/// Publishes each event as JSON on `campaign:{id}`. One attempt per event.
#[derive(Clone)]
pub struct RedisEventSink {
    manager: ConnectionManager,
}

impl RedisEventSink {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| AppError::internal(format!("Unable to initialize Redis connection manager: {err}")))?;
        info!("redis event sink connected");
        Ok(Self { manager })
    }
}

#[async_trait]
impl EventSink for RedisEventSink {
    async fn publish(&self, event: CoordinationEvent) -> Result<(), AppError> {
        let channel = event.channel();
        let encoded = serde_json::to_string(&event)
            .map_err(|err| AppError::internal(format!("Failed to serialize event: {err}")))?;

        // ConnectionManager is a cheap handle; each publish gets its own.
        let mut conn = self.manager.clone();
        conn.publish::<_, _, ()>(channel, encoded)
            .await
            .map_err(|err| AppError::internal(format!("Failed to publish event to Redis: {err}")))
    }
}
