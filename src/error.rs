// Error types for session lifecycle and limit enforcement

use thiserror::Error;

/// Errors surfaced by session operations.
///
/// Enforcement decisions (allow/evict/reject) are plain values, not errors;
/// only a BLOCK-mode rejection crosses into the error domain so that login
/// flows can map it to a user-facing response.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The user is at their concurrent session limit and the active policy
    /// blocks new logins instead of evicting.
    #[error("{reason}")]
    LimitExceeded { max: u32, reason: String },

    /// The session does not exist, or does not belong to the claimed owner.
    /// Ownership misses deliberately look identical to missing rows so that
    /// callers cannot probe other users' sessions.
    #[error("Session not found: {session_id}")]
    NotFound { session_id: String },

    /// The session was already revoked or inactive. Terminate is not
    /// idempotent: a second call is an error, not a no-op.
    #[error("Session already terminated: {session_id}")]
    AlreadyTerminated { session_id: String },

    /// The underlying store or a collaborator failed unexpectedly. Always
    /// propagated; never a decision outcome.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
