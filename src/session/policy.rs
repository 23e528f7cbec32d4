// Session limit policy resolution and settings storage

use super::types::{SessionLimitConfig, SessionLimitUpdate};
use crate::error::SessionResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Persisted session-limit settings for one scope.
/// `scope` is an organization ID, or `None` for the global scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub scope: Option<String>,
    pub config: SessionLimitConfig,
}

/// Trait for settings storage backends.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the settings row for a scope, if one exists.
    async fn get(&self, scope: Option<&str>) -> SessionResult<Option<SessionSettings>>;

    /// Insert or replace the settings row for a scope.
    async fn upsert(&self, settings: SessionSettings) -> SessionResult<SessionSettings>;
}

/// In-memory settings store implementation.
pub struct MemorySettingsStore {
    rows: Arc<RwLock<HashMap<Option<String>, SessionSettings>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, scope: Option<&str>) -> SessionResult<Option<SessionSettings>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&scope.map(|s| s.to_string())).cloned())
    }

    async fn upsert(&self, settings: SessionSettings) -> SessionResult<SessionSettings> {
        let mut rows = self.rows.write().await;
        rows.insert(settings.scope.clone(), settings.clone());
        Ok(settings)
    }
}

/// Resolves the active session-limit config for a scope.
///
/// Defaults are computed once at startup (see `config::limit_defaults_from_env`)
/// and injected here; there is no package-level policy state. Resolution always
/// succeeds apart from store I/O failures.
pub struct PolicyProvider {
    store: Arc<dyn SettingsStore>,
    defaults: SessionLimitConfig,
}

impl PolicyProvider {
    pub fn new(store: Arc<dyn SettingsStore>, defaults: SessionLimitConfig) -> Self {
        Self { store, defaults }
    }

    /// Resolve the config for a scope: the stored row when present, the
    /// startup defaults otherwise. Resolved fresh on every call.
    pub async fn resolve(&self, scope: Option<&str>) -> SessionResult<SessionLimitConfig> {
        match self.store.get(scope).await? {
            Some(settings) => Ok(settings.config),
            None => {
                debug!(
                    "No stored session settings for scope {:?}, using defaults",
                    scope
                );
                Ok(self.defaults.clone())
            }
        }
    }

    /// Upsert only the provided fields for a scope. When no row exists, the
    /// update is overlaid on the full defaults.
    pub async fn update(
        &self,
        update: &SessionLimitUpdate,
        scope: Option<&str>,
    ) -> SessionResult<SessionLimitConfig> {
        let base = match self.store.get(scope).await? {
            Some(settings) => settings.config,
            None => self.defaults.clone(),
        };

        let merged = update.apply_to(&base).with_limit_floor();
        let stored = self
            .store
            .upsert(SessionSettings {
                scope: scope.map(|s| s.to_string()),
                config: merged,
            })
            .await?;

        info!("Updated session settings for scope {:?}", scope);
        Ok(stored.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::EnforcementMode;

    fn provider() -> PolicyProvider {
        PolicyProvider::new(
            Arc::new(MemorySettingsStore::new()),
            SessionLimitConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_defaults() {
        let provider = provider();

        let config = provider.resolve(None).await.unwrap();
        assert_eq!(config, SessionLimitConfig::default());

        let config = provider.resolve(Some("org-1")).await.unwrap();
        assert_eq!(config, SessionLimitConfig::default());
    }

    #[tokio::test]
    async fn test_update_creates_row_over_defaults() {
        let provider = provider();

        let update = SessionLimitUpdate {
            max_concurrent_sessions: Some(2),
            ..Default::default()
        };
        let config = provider.update(&update, Some("org-1")).await.unwrap();

        assert_eq!(config.max_concurrent_sessions, 2);
        assert_eq!(config.max_mobile_sessions, 3);

        // Subsequent resolve sees the stored row
        let resolved = provider.resolve(Some("org-1")).await.unwrap();
        assert_eq!(resolved.max_concurrent_sessions, 2);
    }

    #[tokio::test]
    async fn test_update_preserves_existing_fields() {
        let provider = provider();

        let first = SessionLimitUpdate {
            max_concurrent_sessions: Some(10),
            ..Default::default()
        };
        provider.update(&first, None).await.unwrap();

        let second = SessionLimitUpdate {
            enforcement_mode: Some(EnforcementMode::Block),
            ..Default::default()
        };
        let config = provider.update(&second, None).await.unwrap();

        assert_eq!(config.max_concurrent_sessions, 10);
        assert_eq!(config.enforcement_mode, EnforcementMode::Block);
    }

    #[tokio::test]
    async fn test_update_floors_zero_limits_to_one() {
        let provider = provider();

        let update = SessionLimitUpdate {
            max_concurrent_sessions: Some(0),
            max_mobile_sessions: Some(0),
            max_web_sessions: Some(2),
            ..Default::default()
        };
        let config = provider.update(&update, None).await.unwrap();

        assert_eq!(config.max_concurrent_sessions, 1);
        assert_eq!(config.max_mobile_sessions, 1);
        assert_eq!(config.max_web_sessions, 2);

        // The floored values are what got stored
        let resolved = provider.resolve(None).await.unwrap();
        assert_eq!(resolved.max_concurrent_sessions, 1);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let provider = provider();

        let update = SessionLimitUpdate {
            max_web_sessions: Some(1),
            ..Default::default()
        };
        provider.update(&update, Some("org-1")).await.unwrap();

        let global = provider.resolve(None).await.unwrap();
        assert_eq!(global.max_web_sessions, 3);

        let scoped = provider.resolve(Some("org-1")).await.unwrap();
        assert_eq!(scoped.max_web_sessions, 1);
    }
}
