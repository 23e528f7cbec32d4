// Audit logging for session lifecycle events
// Provides a best-effort audit trail for creations, terminations, and evictions

pub mod logger;
pub mod storage;
pub mod types;

pub use logger::AuditLogger;
pub use storage::{AuditStorage, MemoryAuditStorage};
pub use types::{AuditAction, AuditEntry, AuditLevel, AuditQuery};
