// Session storage backends

use super::types::{DeviceType, Session};
use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Device-class filter for counting and eviction queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceScope {
    /// All device types.
    Any,
    /// Web sessions only.
    Web,
    /// iOS and Android combined.
    Mobile,
}

impl DeviceScope {
    /// The scope a prospective session of the given device type is
    /// counted under for sub-limit purposes.
    pub fn for_device(device: DeviceType) -> Self {
        if device.is_mobile() {
            DeviceScope::Mobile
        } else {
            DeviceScope::Web
        }
    }

    pub fn matches(&self, device: DeviceType) -> bool {
        match self {
            DeviceScope::Any => true,
            DeviceScope::Web => device == DeviceType::Web,
            DeviceScope::Mobile => device.is_mobile(),
        }
    }
}

/// Ordering for live-session queries. Ties are broken by session ID lexical
/// order so selection stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrder {
    CreatedAsc,
    LastActivityAsc,
    LastActivityDesc,
}

impl SessionOrder {
    fn sort(&self, sessions: &mut [Session]) {
        match self {
            SessionOrder::CreatedAsc => {
                sessions.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)))
            }
            SessionOrder::LastActivityAsc => sessions
                .sort_by(|a, b| (a.last_activity_at, &a.id).cmp(&(b.last_activity_at, &b.id))),
            SessionOrder::LastActivityDesc => sessions
                .sort_by(|a, b| (b.last_activity_at, &b.id).cmp(&(a.last_activity_at, &a.id))),
        }
    }
}

/// Trait for session storage backends.
///
/// This is the only surface that touches session rows; all mutation goes
/// through the lifecycle manager's entry points. Backends map their own
/// failures to `SessionError::Infrastructure`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session row.
    async fn create(&self, session: Session) -> SessionResult<Session>;

    /// Fetch a session by ID.
    async fn get(&self, session_id: &str) -> SessionResult<Option<Session>>;

    /// Count live sessions for a user within a device scope.
    async fn count_live(&self, user_id: &str, scope: DeviceScope) -> SessionResult<u32>;

    /// List live sessions for a user within a device scope, ordered.
    async fn find_live(
        &self,
        user_id: &str,
        scope: DeviceScope,
        order: SessionOrder,
    ) -> SessionResult<Vec<Session>>;

    /// Mark a session revoked. Fails with `NotFound` for unknown IDs and
    /// with `AlreadyTerminated` for rows that are already revoked or
    /// inactive: revocation is a single permanent transition, so the first
    /// revocation record is never overwritten.
    async fn mark_revoked(
        &self,
        session_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> SessionResult<Session>;

    /// Revoke every live session for a user except the optionally-excluded
    /// one. Returns the number of sessions actually revoked.
    async fn revoke_all_live(
        &self,
        user_id: &str,
        except_session_id: Option<&str>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> SessionResult<u32>;

    /// Bump the last-activity timestamp of a session.
    async fn touch_activity(&self, session_id: &str, at: DateTime<Utc>) -> SessionResult<()>;
}

/// In-memory session store implementation.
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> SessionResult<Session> {
        let mut sessions = self.sessions.write().await;
        debug!(
            "Storing session {} for user {}",
            session.id, session.user_id
        );
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> SessionResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn count_live(&self, user_id: &str, scope: DeviceScope) -> SessionResult<u32> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        let count = sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_live(now) && scope.matches(s.device_type))
            .count();
        Ok(count as u32)
    }

    async fn find_live(
        &self,
        user_id: &str,
        scope: DeviceScope,
        order: SessionOrder,
    ) -> SessionResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();

        let mut results: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_live(now) && scope.matches(s.device_type))
            .cloned()
            .collect();

        order.sort(&mut results);
        Ok(results)
    }

    async fn mark_revoked(
        &self,
        session_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> SessionResult<Session> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(session) if session.is_revoked || !session.is_active => {
                Err(SessionError::AlreadyTerminated {
                    session_id: session_id.to_string(),
                })
            }
            Some(session) => {
                session.revoke(reason, at);
                info!("Revoked session {}: {}", session_id, reason);
                Ok(session.clone())
            }
            None => Err(SessionError::NotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    async fn revoke_all_live(
        &self,
        user_id: &str,
        except_session_id: Option<&str>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> SessionResult<u32> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;

        for session in sessions.values_mut() {
            if session.user_id != user_id || !session.is_live(at) {
                continue;
            }
            if except_session_id == Some(session.id.as_str()) {
                continue;
            }
            session.revoke(reason, at);
            count += 1;
        }

        info!("Revoked {} sessions for user {}", count, user_id);
        Ok(count)
    }

    async fn touch_activity(&self, session_id: &str, at: DateTime<Utc>) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(session) => {
                session.last_activity_at = at;
                Ok(())
            }
            None => Err(SessionError::NotFound {
                session_id: session_id.to_string(),
            }),
        }
    }
}
