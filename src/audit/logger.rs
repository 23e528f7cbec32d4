// Audit logger implementation

use super::storage::AuditStorage;
use super::types::{AuditAction, AuditEntry, AuditLevel};
use crate::session::types::DeviceType;
use std::sync::Arc;
use tracing::{error, info};

/// Audit logger for recording session lifecycle events.
///
/// Recording is best-effort bookkeeping: a storage failure is logged and
/// swallowed, it never aborts or rolls back the primary operation.
#[derive(Clone)]
pub struct AuditLogger {
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a new audit logger with the specified storage backend
    pub fn new(storage: Arc<dyn AuditStorage>) -> Self {
        Self { storage }
    }

    /// Log an audit event
    pub async fn log(&self, entry: AuditEntry) {
        info!(
            "Audit: {} for user {} (session {:?}) - success: {}",
            entry.action.as_str(),
            entry.user_id,
            entry.session_id,
            entry.success
        );

        if let Err(e) = self.storage.store(entry).await {
            error!("Failed to store audit entry: {}", e);
        }
    }

    /// Log a session creation, noting the evicted session if the creation
    /// displaced one.
    pub async fn log_session_created(
        &self,
        user_id: &str,
        session_id: &str,
        device_type: DeviceType,
        evicted_session_id: Option<&str>,
    ) {
        let mut builder = AuditEntry::builder()
            .user_id(user_id)
            .session_id(session_id)
            .action(AuditAction::SessionCreated)
            .level(AuditLevel::Info)
            .success(true)
            .metadata("device_type", format!("{:?}", device_type).to_lowercase());

        if let Some(evicted) = evicted_session_id {
            builder = builder.metadata("evicted_session_id", evicted);
        }

        self.log(builder.build()).await;
    }

    /// Log a single-session termination.
    pub async fn log_session_terminated(&self, user_id: &str, session_id: &str, reason: &str) {
        let entry = AuditEntry::builder()
            .user_id(user_id)
            .session_id(session_id)
            .action(AuditAction::SessionTerminated)
            .level(AuditLevel::Info)
            .success(true)
            .metadata("reason", reason)
            .build();

        self.log(entry).await;
    }

    /// Log an eviction forced by the session limit.
    pub async fn log_session_evicted(&self, user_id: &str, session_id: &str) {
        let entry = AuditEntry::builder()
            .user_id(user_id)
            .session_id(session_id)
            .action(AuditAction::SessionEvicted)
            .level(AuditLevel::Security)
            .success(true)
            .build();

        self.log(entry).await;
    }

    /// Log a bulk termination as a single aggregate record.
    pub async fn log_bulk_termination(
        &self,
        user_id: &str,
        count: u32,
        except_session_id: Option<&str>,
        reason: &str,
    ) {
        let mut builder = AuditEntry::builder()
            .user_id(user_id)
            .action(AuditAction::SessionsBulkTerminated)
            .level(AuditLevel::Security)
            .success(true)
            .metadata("count", count.to_string())
            .metadata("reason", reason);

        if let Some(except) = except_session_id {
            builder = builder.metadata("except_session_id", except);
        }

        self.log(builder.build()).await;
    }

    /// Log an admin settings change.
    pub async fn log_settings_updated(&self, actor_id: &str, scope: Option<&str>) {
        let entry = AuditEntry::builder()
            .user_id(actor_id)
            .action(AuditAction::SessionSettingsUpdated)
            .level(AuditLevel::Security)
            .success(true)
            .metadata("scope", scope.unwrap_or("global"))
            .build();

        self.log(entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::storage::MemoryAuditStorage;
    use crate::audit::types::AuditQuery;

    #[tokio::test]
    async fn test_log_session_created_with_eviction() {
        let storage = Arc::new(MemoryAuditStorage::new());
        let logger = AuditLogger::new(storage.clone());

        logger
            .log_session_created("user-123", "session-1", DeviceType::Ios, Some("session-0"))
            .await;

        let results = storage
            .query(AuditQuery {
                user_id: Some("user-123".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].action, AuditAction::SessionCreated);
        assert_eq!(
            results[0].metadata.get("evicted_session_id"),
            Some(&"session-0".to_string())
        );
        assert_eq!(
            results[0].metadata.get("device_type"),
            Some(&"ios".to_string())
        );
    }

    #[tokio::test]
    async fn test_log_bulk_termination_aggregate() {
        let storage = Arc::new(MemoryAuditStorage::new());
        let logger = AuditLogger::new(storage.clone());

        logger
            .log_bulk_termination("user-123", 4, Some("session-keep"), "logout_all")
            .await;

        let results = storage
            .query(AuditQuery {
                action: Some(AuditAction::SessionsBulkTerminated),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.get("count"), Some(&"4".to_string()));
        assert_eq!(
            results[0].metadata.get("except_session_id"),
            Some(&"session-keep".to_string())
        );
    }
}
