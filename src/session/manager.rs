// Session lifecycle manager for high-level session operations

use super::enforcer::SessionLimitEnforcer;
use super::policy::PolicyProvider;
use super::storage::{DeviceScope, SessionOrder, SessionStore};
use super::token;
use super::types::{
    CreateSessionResult, NewSessionInfo, Session, SessionInfo, SessionLimitConfig,
    SessionLimitUpdate, SessionStats, TerminationResult, EVICTION_REASON,
};
use crate::audit::AuditLogger;
use crate::error::{SessionError, SessionResult};
use crate::events::{emit_best_effort, NotificationBus, SessionEvent};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Orchestrates session creation and termination: token issuance, limit
/// enforcement, persistence, audit records, and notification events.
///
/// All session-row mutation in the system goes through this type. Creation
/// and bulk termination for a user run inside a per-user critical section
/// covering count, decide, evict, and insert, so concurrent logins by the
/// same user can never leave more live sessions than the configured maximum.
pub struct SessionLifecycleManager {
    store: Arc<dyn SessionStore>,
    policy: Arc<PolicyProvider>,
    enforcer: SessionLimitEnforcer,
    audit: AuditLogger,
    bus: Arc<dyn NotificationBus>,
    /// Keyed serialization locks. Entries are dropped once the last task
    /// touching a user releases its lock, so the map tracks only users with
    /// in-flight operations rather than the lifetime user population.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLifecycleManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        policy: Arc<PolicyProvider>,
        audit: AuditLogger,
        bus: Arc<dyn NotificationBus>,
    ) -> Self {
        let enforcer = SessionLimitEnforcer::new(store.clone(), policy.clone());
        Self {
            store,
            policy,
            enforcer,
            audit,
            bus,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The serialization lock for one user's session set.
    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a user's lock entry once no task holds a handle to it. Callers
    /// release their own `Arc` clone before calling this; a strong count of
    /// one means only the map's reference remains.
    async fn release_user_lock(&self, user_id: &str) {
        let mut locks = self.user_locks.lock().await;
        if let Some(entry) = locks.get(user_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(user_id);
            }
        }
    }

    /// Create a new session for a user, enforcing concurrent-session limits.
    ///
    /// Rejection under a blocking policy fails with `LimitExceeded` and
    /// leaves no side effects. When the policy evicts, the victim is revoked
    /// before the new row is inserted so an external observer never sees the
    /// user over the limit; an eviction failure aborts the whole call.
    ///
    /// The plaintext token is returned exactly once and never retrievable
    /// again.
    pub async fn create_session(
        &self,
        user_id: &str,
        info: NewSessionInfo,
        raw_token: Option<String>,
    ) -> SessionResult<CreateSessionResult> {
        let lock = self.user_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.create_session_locked(user_id, info, raw_token).await
        };
        drop(lock);
        self.release_user_lock(user_id).await;
        result
    }

    /// The creation critical section; runs with the user's lock held.
    async fn create_session_locked(
        &self,
        user_id: &str,
        mut info: NewSessionInfo,
        raw_token: Option<String>,
    ) -> SessionResult<CreateSessionResult> {
        // Device type defaults once at the entry point; downstream code
        // never sees it unset.
        let device_type = info.device_type.unwrap_or_default();
        info.device_type = Some(device_type);

        let scope = info.organization_id.clone();
        let config = self.policy.resolve(scope.as_deref()).await?;
        let decision = self
            .enforcer
            .enforce_with_config(user_id, device_type, &config)
            .await?;

        if !decision.allowed {
            let max = decision
                .exceeded_limit
                .unwrap_or(config.max_concurrent_sessions);
            let reason = decision
                .reason
                .unwrap_or_else(|| "Maximum concurrent sessions reached".to_string());
            warn!("Rejected new session for user {}: {}", user_id, reason);
            return Err(SessionError::LimitExceeded { max, reason });
        }

        // Evict first, then create.
        if let Some(victim_id) = &decision.evicted_session_id {
            self.store
                .mark_revoked(victim_id, EVICTION_REASON, Utc::now())
                .await?;
            self.audit.log_session_evicted(user_id, victim_id).await;
        }

        let plain_token = raw_token.unwrap_or_else(token::generate_token);
        let token_hash = token::hash_token(&plain_token);
        let session = self
            .store
            .create(Session::new(user_id.to_string(), token_hash, &info))
            .await?;

        info!(
            "Created session {} for user {} ({:?})",
            session.id, user_id, device_type
        );

        self.audit
            .log_session_created(
                user_id,
                &session.id,
                device_type,
                decision.evicted_session_id.as_deref(),
            )
            .await;

        // Notifications go out after the mutations are committed.
        if config.notify_on_new_session {
            emit_best_effort(
                self.bus.as_ref(),
                SessionEvent::Created {
                    user_id: user_id.to_string(),
                    session_id: session.id.clone(),
                    device_type,
                    ip_address: session.ip_address.clone(),
                    created_at: session.created_at,
                },
            )
            .await;
        }

        if let Some(victim_id) = &decision.evicted_session_id {
            if config.notify_on_eviction {
                emit_best_effort(
                    self.bus.as_ref(),
                    SessionEvent::Evicted {
                        user_id: user_id.to_string(),
                        session_id: victim_id.clone(),
                        evicted_by_session_id: session.id.clone(),
                        evicted_at: Utc::now(),
                    },
                )
                .await;
            }
        }

        Ok(CreateSessionResult {
            session,
            plain_token,
            evicted_session_id: decision.evicted_session_id,
        })
    }

    /// Terminate a specific session.
    ///
    /// Not idempotent: a second call on the same session fails with
    /// `AlreadyTerminated`.
    pub async fn terminate_session(
        &self,
        session_id: &str,
        reason: &str,
    ) -> SessionResult<TerminationResult> {
        let session =
            self.store
                .get(session_id)
                .await?
                .ok_or_else(|| SessionError::NotFound {
                    session_id: session_id.to_string(),
                })?;

        if session.is_revoked || !session.is_active {
            return Err(SessionError::AlreadyTerminated {
                session_id: session_id.to_string(),
            });
        }

        // Serialize with creations and other terminations for this user;
        // the store's single-transition guard settles any remaining race.
        let lock = self.user_lock(&session.user_id).await;
        let now = Utc::now();
        let outcome = {
            let _guard = lock.lock().await;
            self.store.mark_revoked(session_id, reason, now).await
        };
        drop(lock);
        self.release_user_lock(&session.user_id).await;
        outcome?;

        self.audit
            .log_session_terminated(&session.user_id, session_id, reason)
            .await;

        Ok(TerminationResult {
            session_id: session_id.to_string(),
            reason: reason.to_string(),
            terminated_at: now,
        })
    }

    /// Terminate a session owned by a specific user.
    ///
    /// A session that exists but belongs to another user fails with
    /// `NotFound`, indistinguishable from a missing row, so callers cannot
    /// probe other users' sessions.
    pub async fn terminate_user_session(
        &self,
        user_id: &str,
        session_id: &str,
        reason: &str,
    ) -> SessionResult<TerminationResult> {
        let owned = match self.store.get(session_id).await? {
            Some(session) => session.user_id == user_id,
            None => false,
        };

        if !owned {
            return Err(SessionError::NotFound {
                session_id: session_id.to_string(),
            });
        }

        self.terminate_session(session_id, reason).await
    }

    /// Terminate all live sessions for a user, optionally sparing one
    /// (typically the caller's own). Returns the number revoked; 0 when none
    /// were live.
    pub async fn terminate_all_sessions(
        &self,
        user_id: &str,
        except_session_id: Option<&str>,
        reason: &str,
    ) -> SessionResult<u32> {
        let lock = self.user_lock(user_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.store
                .revoke_all_live(user_id, except_session_id, reason, Utc::now())
                .await
        };
        drop(lock);
        self.release_user_lock(user_id).await;
        let count = outcome?;

        self.audit
            .log_bulk_termination(user_id, count, except_session_id, reason)
            .await;

        Ok(count)
    }

    /// All live sessions for a user, most recently active first, each
    /// annotated with whether it is the caller's current session.
    pub async fn get_user_active_sessions(
        &self,
        user_id: &str,
        current_session_id: Option<&str>,
    ) -> SessionResult<Vec<SessionInfo>> {
        let sessions = self
            .store
            .find_live(user_id, DeviceScope::Any, SessionOrder::LastActivityDesc)
            .await?;

        Ok(sessions
            .into_iter()
            .map(|s| {
                let is_current = current_session_id == Some(s.id.as_str());
                s.to_info(is_current)
            })
            .collect())
    }

    /// Read-only per-user aggregate of live counts and the resolved policy.
    pub async fn get_session_stats(
        &self,
        user_id: &str,
        scope: Option<&str>,
    ) -> SessionResult<SessionStats> {
        let total = self.store.count_live(user_id, DeviceScope::Any).await?;
        let mobile = self.store.count_live(user_id, DeviceScope::Mobile).await?;
        let web = self.store.count_live(user_id, DeviceScope::Web).await?;
        let limits = self.policy.resolve(scope).await?;

        Ok(SessionStats {
            total,
            mobile,
            web,
            limits,
        })
    }

    /// Admin surface: upsert session-limit settings for a scope.
    pub async fn update_session_settings(
        &self,
        actor_id: &str,
        update: &SessionLimitUpdate,
        scope: Option<&str>,
    ) -> SessionResult<SessionLimitConfig> {
        let config = self.policy.update(update, scope).await?;
        self.audit.log_settings_updated(actor_id, scope).await;
        Ok(config)
    }

    /// Bump a session's last-activity timestamp. Called by the
    /// request-handling layer on authenticated requests.
    pub async fn touch_activity(&self, session_id: &str) -> SessionResult<()> {
        self.store.touch_activity(session_id, Utc::now()).await
    }
}
