// Eviction victim selection

use super::storage::{DeviceScope, SessionOrder, SessionStore};
use super::types::EnforcementMode;
use crate::error::SessionResult;
use std::sync::Arc;
use tracing::debug;

/// Picks the session to terminate when a limit forces an eviction.
pub struct EvictionSelector {
    store: Arc<dyn SessionStore>,
}

impl EvictionSelector {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Select the eviction victim for a user within a device scope.
    ///
    /// EvictOldest orders by creation time, EvictIdle by last activity, both
    /// ascending with session ID as the tie-break, so selection is
    /// deterministic. Returns `None` when the scope holds no live session;
    /// Block mode never selects a victim.
    pub async fn select_victim(
        &self,
        user_id: &str,
        mode: EnforcementMode,
        scope: DeviceScope,
    ) -> SessionResult<Option<String>> {
        let order = match mode {
            EnforcementMode::EvictOldest => SessionOrder::CreatedAsc,
            EnforcementMode::EvictIdle => SessionOrder::LastActivityAsc,
            EnforcementMode::Block => return Ok(None),
        };

        let candidates = self.store.find_live(user_id, scope, order).await?;

        match candidates.first() {
            Some(victim) => {
                debug!(
                    "Selected eviction victim {} for user {} ({:?}, {:?})",
                    victim.id, user_id, mode, scope
                );
                Ok(Some(victim.id.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemorySessionStore;
    use crate::session::types::{DeviceType, NewSessionInfo, Session};
    use chrono::{Duration, Utc};

    async fn seed(store: &MemorySessionStore, id: &str, device: DeviceType, offset: i64) -> String {
        let mut session = Session::new(
            "user-123".to_string(),
            "hash".to_string(),
            &NewSessionInfo {
                device_type: Some(device),
                ..Default::default()
            },
        );
        session.id = id.to_string();
        session.created_at = Utc::now() + Duration::seconds(offset);
        session.last_activity_at = Utc::now() + Duration::seconds(offset);
        store.create(session).await.unwrap();
        id.to_string()
    }

    #[tokio::test]
    async fn test_evict_oldest_selects_earliest_created() {
        let store = Arc::new(MemorySessionStore::new());
        seed(&store, "s-new", DeviceType::Web, 10).await;
        let oldest = seed(&store, "s-old", DeviceType::Web, -10).await;
        let selector = EvictionSelector::new(store);

        let victim = selector
            .select_victim("user-123", EnforcementMode::EvictOldest, DeviceScope::Web)
            .await
            .unwrap();

        assert_eq!(victim, Some(oldest));
    }

    #[tokio::test]
    async fn test_evict_idle_selects_least_recently_active() {
        let store = Arc::new(MemorySessionStore::new());
        seed(&store, "s-busy", DeviceType::Ios, 0).await;
        let idle = seed(&store, "s-idle", DeviceType::Android, -60).await;
        let selector = EvictionSelector::new(store);

        let victim = selector
            .select_victim("user-123", EnforcementMode::EvictIdle, DeviceScope::Mobile)
            .await
            .unwrap();

        assert_eq!(victim, Some(idle));
    }

    #[tokio::test]
    async fn test_cross_device_tie_breaks_by_session_id() {
        let store = Arc::new(MemorySessionStore::new());
        let now = Utc::now();

        // Oldest iOS and oldest Android created at the same instant
        for (id, device) in [("s-b", DeviceType::Ios), ("s-a", DeviceType::Android)] {
            let mut session = Session::new(
                "user-123".to_string(),
                "hash".to_string(),
                &NewSessionInfo {
                    device_type: Some(device),
                    ..Default::default()
                },
            );
            session.id = id.to_string();
            session.created_at = now;
            store.create(session).await.unwrap();
        }
        let selector = EvictionSelector::new(store);

        let victim = selector
            .select_victim("user-123", EnforcementMode::EvictOldest, DeviceScope::Mobile)
            .await
            .unwrap();

        assert_eq!(victim, Some("s-a".to_string()));
    }

    #[tokio::test]
    async fn test_empty_scope_selects_nothing() {
        let store = Arc::new(MemorySessionStore::new());
        seed(&store, "s-web", DeviceType::Web, 0).await;
        let selector = EvictionSelector::new(store);

        let victim = selector
            .select_victim("user-123", EnforcementMode::EvictOldest, DeviceScope::Mobile)
            .await
            .unwrap();

        assert_eq!(victim, None);
    }

    #[tokio::test]
    async fn test_block_mode_never_selects() {
        let store = Arc::new(MemorySessionStore::new());
        seed(&store, "s-web", DeviceType::Web, 0).await;
        let selector = EvictionSelector::new(store);

        let victim = selector
            .select_victim("user-123", EnforcementMode::Block, DeviceScope::Any)
            .await
            .unwrap();

        assert_eq!(victim, None);
    }
}
