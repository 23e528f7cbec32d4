// Session management module
// Provides session lifecycle, concurrent-session limits with configurable
// eviction policies, and per-user race-safe creation

pub mod enforcer;
pub mod eviction;
pub mod manager;
pub mod policy;
pub mod storage;
pub mod token;
pub mod types;

pub use enforcer::SessionLimitEnforcer;
pub use eviction::EvictionSelector;
pub use manager::SessionLifecycleManager;
pub use policy::{MemorySettingsStore, PolicyProvider, SessionSettings, SettingsStore};
pub use storage::{DeviceScope, MemorySessionStore, SessionOrder, SessionStore};
pub use types::{
    CreateSessionResult, DeviceType, EnforcementDecision, EnforcementMode, Location,
    NewSessionInfo, Session, SessionInfo, SessionLimitConfig, SessionLimitUpdate, SessionStats,
    TerminationResult,
};
