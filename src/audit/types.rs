// Audit log types and structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Audit log entry representing a single auditable session event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for the audit entry
    pub id: String,
    /// Timestamp when the event occurred
    pub timestamp: DateTime<Utc>,
    /// User who owns the affected session(s)
    pub user_id: String,
    /// Action that was performed
    pub action: AuditAction,
    /// Session ID that was affected, when the action targets one session
    pub session_id: Option<String>,
    /// Severity level of the audit event
    pub level: AuditLevel,
    /// Whether the action was successful
    pub success: bool,
    /// Error message if the action failed
    pub error_message: Option<String>,
    /// Additional metadata about the event
    pub metadata: HashMap<String, String>,
}

/// Types of auditable session actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SessionCreated,
    SessionTerminated,
    SessionEvicted,
    SessionsBulkTerminated,
    SessionSettingsUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SessionCreated => "session_created",
            AuditAction::SessionTerminated => "session_terminated",
            AuditAction::SessionEvicted => "session_evicted",
            AuditAction::SessionsBulkTerminated => "sessions_bulk_terminated",
            AuditAction::SessionSettingsUpdated => "session_settings_updated",
        }
    }
}

/// Severity level of audit events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    /// Informational events (normal operations)
    Info,
    /// Security-relevant events (evictions, forced logouts)
    Security,
}

/// Query parameters for searching audit logs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// Filter by user ID
    pub user_id: Option<String>,
    /// Filter by action type
    pub action: Option<AuditAction>,
    /// Filter by session ID
    pub session_id: Option<String>,
    /// Filter by start timestamp
    pub start_time: Option<DateTime<Utc>>,
    /// Filter by end timestamp
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl AuditEntry {
    /// Create a new audit entry builder
    pub fn builder() -> AuditEntryBuilder {
        AuditEntryBuilder::default()
    }
}

/// Builder for creating audit entries
#[derive(Default)]
pub struct AuditEntryBuilder {
    user_id: Option<String>,
    action: Option<AuditAction>,
    session_id: Option<String>,
    level: Option<AuditLevel>,
    success: Option<bool>,
    error_message: Option<String>,
    metadata: HashMap<String, String>,
}

impl AuditEntryBuilder {
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn level(mut self, level: AuditLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self.success = Some(false);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> AuditEntry {
        AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: self.user_id.unwrap_or_else(|| "unknown".to_string()),
            action: self.action.unwrap_or(AuditAction::SessionCreated),
            session_id: self.session_id,
            level: self.level.unwrap_or(AuditLevel::Info),
            success: self.success.unwrap_or(true),
            error_message: self.error_message,
            metadata: self.metadata,
        }
    }
}
