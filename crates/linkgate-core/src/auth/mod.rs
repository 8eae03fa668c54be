//! Authentication module for gating access behind a session.
//!
//! This module provides:
//! - `SessionManager`: login/logout state machine with inactivity expiry
//! - `SessionStore`: durable key-value record of the signed-in user
//! - `CredentialVerifier`: pluggable username/password check
//!
//! Sessions expire after 30 minutes without user activity.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::{CredentialVerifier, KeyringVerifier, PlaceholderVerifier};
pub use session::{AuthError, Session, SessionEvent, SessionManager, SessionSettings, SessionState};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
