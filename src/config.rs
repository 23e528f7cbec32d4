// Environment-derived session limit defaults

use crate::session::types::{EnforcementMode, SessionLimitConfig};
use std::str::FromStr;
use tracing::warn;

/// Compute the default session-limit config from the environment.
///
/// Intended to run once at startup; the result is injected into the
/// `PolicyProvider` rather than read from any global. Missing or malformed
/// variables fall back per-field to the hardcoded defaults, so this never
/// fails.
pub fn limit_defaults_from_env() -> SessionLimitConfig {
    limit_defaults_from(|name| std::env::var(name).ok())
}

/// Same as `limit_defaults_from_env`, with the variable lookup injected.
pub fn limit_defaults_from(lookup: impl Fn(&str) -> Option<String>) -> SessionLimitConfig {
    let base = SessionLimitConfig::default();

    SessionLimitConfig {
        max_concurrent_sessions: parse_var(
            &lookup,
            "SESSION_MAX_CONCURRENT",
            base.max_concurrent_sessions,
        ),
        max_mobile_sessions: parse_var(&lookup, "SESSION_MAX_MOBILE", base.max_mobile_sessions),
        max_web_sessions: parse_var(&lookup, "SESSION_MAX_WEB", base.max_web_sessions),
        enforcement_mode: parse_mode(&lookup, base.enforcement_mode),
        idle_timeout_minutes: parse_var(
            &lookup,
            "SESSION_IDLE_TIMEOUT_MINUTES",
            base.idle_timeout_minutes,
        ),
        notify_on_new_session: parse_var(&lookup, "SESSION_NOTIFY_NEW", base.notify_on_new_session),
        notify_on_eviction: parse_var(
            &lookup,
            "SESSION_NOTIFY_EVICTION",
            base.notify_on_eviction,
        ),
    }
    .with_limit_floor()
}

fn parse_var<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    fallback: T,
) -> T {
    match lookup(name) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value for {}: '{}', using default", name, raw);
                fallback
            }
        },
        None => fallback,
    }
}

fn parse_mode(
    lookup: &impl Fn(&str) -> Option<String>,
    fallback: EnforcementMode,
) -> EnforcementMode {
    match lookup("SESSION_ENFORCEMENT_MODE") {
        Some(raw) => match raw.to_lowercase().as_str() {
            "block" => EnforcementMode::Block,
            "evict_oldest" => EnforcementMode::EvictOldest,
            "evict_idle" => EnforcementMode::EvictIdle,
            _ => {
                warn!(
                    "Invalid value for SESSION_ENFORCEMENT_MODE: '{}', using default",
                    raw
                );
                fallback
            }
        },
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_environment_yields_hardcoded_defaults() {
        let config = limit_defaults_from(|_| None);
        assert_eq!(config, SessionLimitConfig::default());
        assert_eq!(config.max_concurrent_sessions, 5);
        assert_eq!(config.enforcement_mode, EnforcementMode::EvictOldest);
    }

    #[test]
    fn test_environment_overrides() {
        let env = env_of(&[
            ("SESSION_MAX_CONCURRENT", "10"),
            ("SESSION_ENFORCEMENT_MODE", "block"),
            ("SESSION_NOTIFY_EVICTION", "false"),
        ]);
        let config = limit_defaults_from(|name| env.get(name).cloned());

        assert_eq!(config.max_concurrent_sessions, 10);
        assert_eq!(config.enforcement_mode, EnforcementMode::Block);
        assert!(!config.notify_on_eviction);
        // Untouched fields keep their defaults
        assert_eq!(config.max_mobile_sessions, 3);
    }

    #[test]
    fn test_zero_limits_are_floored_to_one() {
        let env = env_of(&[("SESSION_MAX_CONCURRENT", "0"), ("SESSION_MAX_WEB", "0")]);
        let config = limit_defaults_from(|name| env.get(name).cloned());

        assert_eq!(config.max_concurrent_sessions, 1);
        assert_eq!(config.max_web_sessions, 1);
        assert_eq!(config.max_mobile_sessions, 3);
    }

    #[test]
    fn test_malformed_values_fall_back_per_field() {
        let env = env_of(&[
            ("SESSION_MAX_CONCURRENT", "not-a-number"),
            ("SESSION_ENFORCEMENT_MODE", "evict_idle"),
        ]);
        let config = limit_defaults_from(|name| env.get(name).cloned());

        assert_eq!(config.max_concurrent_sessions, 5);
        assert_eq!(config.enforcement_mode, EnforcementMode::EvictIdle);
    }
}
