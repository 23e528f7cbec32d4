// Audit log storage backends

use super::types::{AuditEntry, AuditQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for audit log storage backends
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Store an audit entry
    async fn store(&self, entry: AuditEntry) -> Result<(), String>;

    /// Query audit entries
    async fn query(&self, query: AuditQuery) -> Result<Vec<AuditEntry>, String>;
}

/// In-memory audit storage implementation
pub struct MemoryAuditStorage {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditStorage {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryAuditStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStorage {
    async fn store(&self, entry: AuditEntry) -> Result<(), String> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn query(&self, query: AuditQuery) -> Result<Vec<AuditEntry>, String> {
        let entries = self.entries.read().await;

        let mut results: Vec<AuditEntry> = entries
            .iter()
            .filter(|entry| {
                if let Some(ref user_id) = query.user_id {
                    if &entry.user_id != user_id {
                        return false;
                    }
                }

                if let Some(ref action) = query.action {
                    if &entry.action != action {
                        return false;
                    }
                }

                if let Some(ref session_id) = query.session_id {
                    if entry.session_id.as_ref() != Some(session_id) {
                        return false;
                    }
                }

                if let Some(start) = query.start_time {
                    if entry.timestamp < start {
                        return false;
                    }
                }

                if let Some(end) = query.end_time {
                    if entry.timestamp > end {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        // Most recent first
        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::AuditAction;

    #[tokio::test]
    async fn test_store_and_query_by_user() {
        let storage = MemoryAuditStorage::new();

        for user in ["user-1", "user-1", "user-2"] {
            let entry = AuditEntry::builder()
                .user_id(user)
                .action(AuditAction::SessionCreated)
                .build();
            storage.store(entry).await.unwrap();
        }

        let results = storage
            .query(AuditQuery {
                user_id: Some("user-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_query_by_action_with_limit() {
        let storage = MemoryAuditStorage::new();

        for action in [
            AuditAction::SessionCreated,
            AuditAction::SessionEvicted,
            AuditAction::SessionEvicted,
            AuditAction::SessionEvicted,
        ] {
            let entry = AuditEntry::builder().user_id("user-1").action(action).build();
            storage.store(entry).await.unwrap();
        }

        let results = storage
            .query(AuditQuery {
                action: Some(AuditAction::SessionEvicted),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|e| e.action == AuditAction::SessionEvicted));
    }
}
