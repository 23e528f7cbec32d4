// Concurrent-session limit enforcement

use super::eviction::EvictionSelector;
use super::policy::PolicyProvider;
use super::storage::{DeviceScope, SessionStore};
use super::types::{DeviceType, EnforcementDecision, EnforcementMode, SessionLimitConfig};
use crate::error::SessionResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a prospective session is admitted outright, admitted with
/// an eviction, or rejected, per the active policy.
///
/// Every branch returns a decision value; this component itself never fails.
/// Store errors while counting or querying propagate as infrastructure
/// failures, not decisions.
pub struct SessionLimitEnforcer {
    store: Arc<dyn SessionStore>,
    policy: Arc<PolicyProvider>,
    selector: EvictionSelector,
}

impl SessionLimitEnforcer {
    pub fn new(store: Arc<dyn SessionStore>, policy: Arc<PolicyProvider>) -> Self {
        let selector = EvictionSelector::new(store.clone());
        Self {
            store,
            policy,
            selector,
        }
    }

    /// Resolve the policy for the scope and run the enforcement decision.
    pub async fn enforce(
        &self,
        user_id: &str,
        device_type: DeviceType,
        scope: Option<&str>,
    ) -> SessionResult<EnforcementDecision> {
        let config = self.policy.resolve(scope).await?;
        self.enforce_with_config(user_id, device_type, &config).await
    }

    /// Run the enforcement decision against an already-resolved config.
    /// The config is held fixed for the whole decision.
    pub async fn enforce_with_config(
        &self,
        user_id: &str,
        device_type: DeviceType,
        config: &SessionLimitConfig,
    ) -> SessionResult<EnforcementDecision> {
        let device_scope = DeviceScope::for_device(device_type);
        let device_limit = if device_type.is_mobile() {
            config.max_mobile_sessions
        } else {
            config.max_web_sessions
        };

        let total_count = self.store.count_live(user_id, DeviceScope::Any).await?;
        let device_count = self.store.count_live(user_id, device_scope).await?;

        let exceeds_total = total_count >= config.max_concurrent_sessions;
        let exceeds_device = device_count >= device_limit;

        if !exceeds_total && !exceeds_device {
            return Ok(EnforcementDecision::allowed());
        }

        if config.enforcement_mode == EnforcementMode::Block {
            let (reason, limit) = if exceeds_total {
                (
                    format!(
                        "Maximum concurrent sessions reached ({}). Please log out from another device to continue.",
                        config.max_concurrent_sessions
                    ),
                    config.max_concurrent_sessions,
                )
            } else {
                (
                    format!(
                        "Maximum {} sessions reached ({}). Please log out from another device to continue.",
                        if device_type.is_mobile() { "mobile" } else { "web" },
                        device_limit
                    ),
                    device_limit,
                )
            };

            warn!(
                "Blocking new {:?} session for user {}: {} total, {} in scope",
                device_type, user_id, total_count, device_count
            );
            return Ok(EnforcementDecision::rejected(reason, limit));
        }

        // Evict within the exceeded device scope first; fall back to the
        // unrestricted scope when the device scope is empty but the total is
        // exceeded. Exactly one eviction per decision.
        let mode = config.enforcement_mode;
        let mut victim = if exceeds_device {
            self.selector
                .select_victim(user_id, mode, device_scope)
                .await?
        } else {
            None
        };

        if victim.is_none() && exceeds_total {
            victim = self
                .selector
                .select_victim(user_id, mode, DeviceScope::Any)
                .await?;
        }

        match victim {
            Some(victim_id) => {
                debug!(
                    "Admitting new {:?} session for user {} by evicting {}",
                    device_type, user_id, victim_id
                );
                Ok(EnforcementDecision::allowed_with_eviction(victim_id))
            }
            // Limits exceeded but nothing evictable: pass through rather
            // than crash.
            None => {
                warn!(
                    "User {} over limit but no evictable session found, admitting",
                    user_id
                );
                Ok(EnforcementDecision::allowed())
            }
        }
    }
}
