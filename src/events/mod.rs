// Outbound notification events for session lifecycle changes
// Published after the primary mutation commits; delivery is best-effort and
// never part of the session mutation's failure surface.

use crate::session::types::DeviceType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

/// Event name for new-session notifications.
pub const SESSION_CREATED: &str = "session.created";
/// Event name for eviction notifications.
pub const SESSION_EVICTED: &str = "session.evicted";

/// Notification payload emitted by the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new session was created for the user.
    #[serde(rename = "session.created")]
    Created {
        user_id: String,
        session_id: String,
        device_type: DeviceType,
        ip_address: String,
        created_at: DateTime<Utc>,
    },
    /// An existing session was evicted to make room for a new one.
    #[serde(rename = "session.evicted")]
    Evicted {
        user_id: String,
        session_id: String,
        evicted_by_session_id: String,
        evicted_at: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Created { .. } => SESSION_CREATED,
            SessionEvent::Evicted { .. } => SESSION_EVICTED,
        }
    }
}

/// Trait for notification bus backends
#[async_trait]
pub trait NotificationBus: Send + Sync {
    /// Publish an event. Failures are reported to the caller, who logs and
    /// continues; they must never abort a session mutation.
    async fn emit(&self, event: SessionEvent) -> Result<(), String>;
}

/// In-memory notification bus that records emitted events, for tests and
/// single-process consumers.
pub struct MemoryNotificationBus {
    events: Arc<RwLock<Vec<SessionEvent>>>,
}

impl MemoryNotificationBus {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All events emitted so far, in order.
    pub async fn emitted(&self) -> Vec<SessionEvent> {
        self.events.read().await.clone()
    }
}

impl Default for MemoryNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationBus for MemoryNotificationBus {
    async fn emit(&self, event: SessionEvent) -> Result<(), String> {
        let mut events = self.events.write().await;
        events.push(event);
        Ok(())
    }
}

/// Emit an event, logging and swallowing any delivery failure.
pub async fn emit_best_effort(bus: &dyn NotificationBus, event: SessionEvent) {
    let name = event.name();
    if let Err(e) = bus.emit(event).await {
        error!("Failed to emit {} notification: {}", name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_bus_records_events_in_order() {
        let bus = MemoryNotificationBus::new();
        let now = Utc::now();

        bus.emit(SessionEvent::Created {
            user_id: "user-123".to_string(),
            session_id: "session-1".to_string(),
            device_type: DeviceType::Web,
            ip_address: "192.168.1.1".to_string(),
            created_at: now,
        })
        .await
        .unwrap();

        bus.emit(SessionEvent::Evicted {
            user_id: "user-123".to_string(),
            session_id: "session-0".to_string(),
            evicted_by_session_id: "session-1".to_string(),
            evicted_at: now,
        })
        .await
        .unwrap();

        let events = bus.emitted().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), SESSION_CREATED);
        assert_eq!(events[1].name(), SESSION_EVICTED);
    }

    #[tokio::test]
    async fn test_event_serialization_carries_event_name() {
        let event = SessionEvent::Created {
            user_id: "user-123".to_string(),
            session_id: "session-1".to_string(),
            device_type: DeviceType::Android,
            ip_address: "10.0.0.1".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "session.created");
        assert_eq!(json["device_type"], "android");
    }
}
