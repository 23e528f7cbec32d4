// Session types and data structures

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default session lifetime: 7 days from creation.
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 7;

/// Revocation reason recorded when a session is evicted to make room.
pub const EVICTION_REASON: &str = "session_limit_exceeded";

/// Device class of the client that opened the session.
/// Drives which per-device sub-limit applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Web,
    Ios,
    Android,
    Desktop,
}

impl DeviceType {
    /// iOS and Android share a combined mobile sub-limit.
    pub fn is_mobile(&self) -> bool {
        matches!(self, DeviceType::Ios | DeviceType::Android)
    }
}

impl Default for DeviceType {
    fn default() -> Self {
        DeviceType::Web
    }
}

/// What to do when a new session would exceed a limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Reject the new session outright.
    Block,
    /// Terminate the longest-lived session to make room.
    EvictOldest,
    /// Terminate the least-recently-active session to make room.
    EvictIdle,
}

/// Concurrent-session policy for a scope (global or per-organization).
///
/// Immutable once resolved for a single enforcement decision; resolved fresh
/// per call, never cached inside the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionLimitConfig {
    /// Total live-session ceiling per user, all device types.
    pub max_concurrent_sessions: u32,
    /// Ceiling across iOS and Android combined.
    pub max_mobile_sessions: u32,
    /// Ceiling for web sessions.
    pub max_web_sessions: u32,
    /// What happens when a limit is hit.
    pub enforcement_mode: EnforcementMode,
    /// Idle-classification threshold, informational for clients.
    pub idle_timeout_minutes: u32,
    /// Emit a notification event when a session is created.
    pub notify_on_new_session: bool,
    /// Emit a notification event when a session is evicted.
    pub notify_on_eviction: bool,
}

impl SessionLimitConfig {
    /// Session ceilings are at least one; a zero ceiling could never admit a
    /// login. Applied wherever config enters the system (admin updates, env
    /// defaults).
    pub fn with_limit_floor(mut self) -> Self {
        self.max_concurrent_sessions = self.max_concurrent_sessions.max(1);
        self.max_mobile_sessions = self.max_mobile_sessions.max(1);
        self.max_web_sessions = self.max_web_sessions.max(1);
        self
    }
}

impl Default for SessionLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: 5,
            max_mobile_sessions: 3,
            max_web_sessions: 3,
            enforcement_mode: EnforcementMode::EvictOldest,
            idle_timeout_minutes: 30,
            notify_on_new_session: true,
            notify_on_eviction: true,
        }
    }
}

/// Partial config for upserts; omitted fields keep their current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionLimitUpdate {
    pub max_concurrent_sessions: Option<u32>,
    pub max_mobile_sessions: Option<u32>,
    pub max_web_sessions: Option<u32>,
    pub enforcement_mode: Option<EnforcementMode>,
    pub idle_timeout_minutes: Option<u32>,
    pub notify_on_new_session: Option<bool>,
    pub notify_on_eviction: Option<bool>,
}

impl SessionLimitUpdate {
    /// Overlay the provided fields onto an existing config.
    pub fn apply_to(&self, base: &SessionLimitConfig) -> SessionLimitConfig {
        SessionLimitConfig {
            max_concurrent_sessions: self
                .max_concurrent_sessions
                .unwrap_or(base.max_concurrent_sessions),
            max_mobile_sessions: self.max_mobile_sessions.unwrap_or(base.max_mobile_sessions),
            max_web_sessions: self.max_web_sessions.unwrap_or(base.max_web_sessions),
            enforcement_mode: self.enforcement_mode.unwrap_or(base.enforcement_mode),
            idle_timeout_minutes: self
                .idle_timeout_minutes
                .unwrap_or(base.idle_timeout_minutes),
            notify_on_new_session: self
                .notify_on_new_session
                .unwrap_or(base.notify_on_new_session),
            notify_on_eviction: self.notify_on_eviction.unwrap_or(base.notify_on_eviction),
        }
    }
}

/// Geolocation attached to a session; descriptive only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One authenticated client connection.
///
/// Rows are never physically deleted by this core; revoked sessions are
/// retained for audit. Revocation is permanent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Server-generated unique identifier.
    pub id: String,
    /// Owning user; a user may hold many sessions.
    pub user_id: String,
    /// One-way hash of the session token. The plaintext is returned exactly
    /// once at creation and never stored.
    pub token_hash: String,
    /// Device class, drives sub-limit selection.
    pub device_type: DeviceType,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    /// Bumped by the request-handling layer on each authenticated call.
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_revoked: bool,
    pub revoked_reason: Option<String>,
}

/// Metadata supplied by the login flow for a prospective session.
///
/// A missing device type defaults to web at the entry point, so downstream
/// code never sees an unset device class.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSessionInfo {
    pub device_type: Option<DeviceType>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub location: Option<Location>,
    /// Organization whose limit policy applies; `None` uses the global scope.
    pub organization_id: Option<String>,
}

impl Session {
    /// Build a fresh live session. The caller supplies the already-hashed
    /// token; expiry is a fixed offset from creation.
    pub fn new(user_id: String, token_hash: String, info: &NewSessionInfo) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            token_hash,
            device_type: info.device_type.unwrap_or_default(),
            ip_address: info
                .ip_address
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            user_agent: info.user_agent.clone(),
            device_id: info.device_id.clone(),
            device_name: info.device_name.clone(),
            location: info.location.clone(),
            created_at: now,
            last_activity_at: now,
            expires_at: now + Duration::days(DEFAULT_SESSION_LIFETIME_DAYS),
            revoked_at: None,
            is_active: true,
            is_revoked: false,
            revoked_reason: None,
        }
    }

    /// A session is live iff it is active, not revoked, and not yet expired.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_revoked && self.expires_at > now
    }

    /// Permanently revoke the session.
    pub fn revoke(&mut self, reason: &str, at: DateTime<Utc>) {
        self.is_active = false;
        self.is_revoked = true;
        self.revoked_at = Some(at);
        self.revoked_reason = Some(reason.to_string());
    }

    /// Convert to the display shape, dropping the token hash.
    pub fn to_info(&self, is_current: bool) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            device_type: self.device_type,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            device_name: self.device_name.clone(),
            location: self.location.clone(),
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            expires_at: self.expires_at,
            is_current,
        }
    }
}

/// Session information for display (without the token hash).
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub user_id: String,
    pub device_type: DeviceType,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub device_name: Option<String>,
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_current: bool,
}

/// Outcome of one enforcement call. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementDecision {
    pub allowed: bool,
    pub evicted_session_id: Option<String>,
    pub reason: Option<String>,
    /// The ceiling that triggered a rejection, for client messaging.
    pub exceeded_limit: Option<u32>,
}

impl EnforcementDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            evicted_session_id: None,
            reason: None,
            exceeded_limit: None,
        }
    }

    pub fn allowed_with_eviction(victim: String) -> Self {
        Self {
            allowed: true,
            evicted_session_id: Some(victim),
            reason: None,
            exceeded_limit: None,
        }
    }

    pub fn rejected(reason: String, limit: u32) -> Self {
        Self {
            allowed: false,
            evicted_session_id: None,
            reason: Some(reason),
            exceeded_limit: Some(limit),
        }
    }
}

/// Result of a successful session creation. The plaintext token appears here
/// exactly once and is never retrievable again.
#[derive(Debug, Clone)]
pub struct CreateSessionResult {
    pub session: Session,
    pub plain_token: String,
    pub evicted_session_id: Option<String>,
}

/// Result of a successful termination.
#[derive(Debug, Clone, Serialize)]
pub struct TerminationResult {
    pub session_id: String,
    pub reason: String,
    pub terminated_at: DateTime<Utc>,
}

/// Read-only per-user aggregate for status display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub total: u32,
    pub mobile: u32,
    pub web: u32,
    pub limits: SessionLimitConfig,
}
