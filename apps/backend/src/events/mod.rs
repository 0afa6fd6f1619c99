//! Best-effort, at-most-once change notifications.
//!
//! Services describe what changed as `CoordinationEvent`s returned next to
//! their result; handlers hand them to `broadcast_all` only after the
//! transaction commits. Payloads carry ids only.

mod redis_sink;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use redis_sink::RedisEventSink;

use crate::entities::campaigns::CampaignPhase;
use crate::entities::pass_states::PassState;
use crate::entities::rolls::RollStatus;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinationEvent {
    /// Identity fields are `None` when the lock is for a hidden post.
    LockAcquired {
        campaign_id: i64,
        scene_id: i64,
        lock_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        character_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<i64>,
    },
    LockReleased {
        campaign_id: i64,
        scene_id: i64,
        lock_id: i64,
    },
    LockUpdated {
        campaign_id: i64,
        scene_id: i64,
        lock_id: i64,
        is_hidden: bool,
    },
    PostCreated {
        campaign_id: i64,
        scene_id: i64,
        post_id: i64,
    },
    PostUpdated {
        campaign_id: i64,
        scene_id: i64,
        post_id: i64,
    },
    PostDeleted {
        campaign_id: i64,
        scene_id: i64,
        post_id: i64,
    },
    PhaseTransitioned {
        campaign_id: i64,
        from: CampaignPhase,
        to: CampaignPhase,
        forced: bool,
    },
    CampaignPaused {
        campaign_id: i64,
    },
    CampaignResumed {
        campaign_id: i64,
    },
    PassChanged {
        campaign_id: i64,
        scene_id: i64,
        character_id: i64,
        state: PassState,
    },
    CharacterJoinedScene {
        campaign_id: i64,
        scene_id: i64,
        character_id: i64,
    },
    CharacterLeftScene {
        campaign_id: i64,
        scene_id: i64,
        character_id: i64,
    },
    RollCreated {
        campaign_id: i64,
        scene_id: i64,
        roll_id: i64,
    },
    RollResolved {
        campaign_id: i64,
        scene_id: i64,
        roll_id: i64,
        status: RollStatus,
    },
}

impl CoordinationEvent {
    pub fn campaign_id(&self) -> i64 {
        match self {
            Self::LockAcquired { campaign_id, .. }
            | Self::LockReleased { campaign_id, .. }
            | Self::LockUpdated { campaign_id, .. }
            | Self::PostCreated { campaign_id, .. }
            | Self::PostUpdated { campaign_id, .. }
            | Self::PostDeleted { campaign_id, .. }
            | Self::PhaseTransitioned { campaign_id, .. }
            | Self::CampaignPaused { campaign_id }
            | Self::CampaignResumed { campaign_id }
            | Self::PassChanged { campaign_id, .. }
            | Self::CharacterJoinedScene { campaign_id, .. }
            | Self::CharacterLeftScene { campaign_id, .. }
            | Self::RollCreated { campaign_id, .. }
            | Self::RollResolved { campaign_id, .. } => *campaign_id,
        }
    }

    /// Pub/sub channel the event is published on.
    pub fn channel(&self) -> String {
        format!("campaign:{}", self.campaign_id())
    }
}

/// A service result plus the events to publish once it is committed.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<CoordinationEvent>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, events: Vec<CoordinationEvent>) -> Self {
        Self { value, events }
    }

    pub fn quiet(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn with_event(value: T, event: CoordinationEvent) -> Self {
        Self::new(value, vec![event])
    }

    /// Hand the events to `sink` and keep the value. Only call this once
    /// the transaction that produced the outcome has committed.
    pub fn publish(self, sink: &Arc<dyn EventSink>) -> T {
        broadcast_all(sink, self.events);
        self.value
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: CoordinationEvent) -> Result<(), AppError>;
}

/// Publish in the background. Failures are logged and dropped.
pub fn broadcast_all(sink: &Arc<dyn EventSink>, events: Vec<CoordinationEvent>) {
    if events.is_empty() {
        return;
    }
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        for event in events {
            let channel = event.channel();
            if let Err(err) = sink.publish(event).await {
                warn!(channel = %channel, error = %err, "event publish failed; dropping");
            }
        }
    });
}

pub fn broadcast(sink: &Arc<dyn EventSink>, event: CoordinationEvent) {
    broadcast_all(sink, vec![event]);
}

/// Used when no broker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, event: CoordinationEvent) -> Result<(), AppError> {
        debug!(channel = %event.channel(), ?event, "event (no broker configured)");
        Ok(())
    }
}

/// Keeps every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CoordinationEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CoordinationEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: CoordinationEvent) -> Result<(), AppError> {
        self.events.lock().push(event);
        Ok(())
    }
}
