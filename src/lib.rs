// Session lifecycle and concurrent-session limit enforcement.
// Invoked in-process by the login flow; persistence, audit, and notification
// backends are pluggable collaborators.

pub mod audit;
pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use error::{SessionError, SessionResult};
