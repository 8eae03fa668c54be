use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::credentials::CredentialVerifier;
use super::store::{SessionStore, KEY_LAST_ACTIVITY, KEY_LOGGED_IN_USER};
use crate::clock::{is_expired, ActivityClock};

/// Inactivity allowed before the session is closed (30 minutes)
pub const SESSION_TIMEOUT_MS: i64 = 30 * 60 * 1000;

/// How often the background check compares last activity against the timeout
pub const ACTIVITY_CHECK_INTERVAL_MS: i64 = 60 * 1000;

/// Minimum gap between writes of `lastActivity` to the store. The in-memory
/// timestamp is always exact; the stored one may trail it by this much.
pub const ACTIVITY_PERSIST_INTERVAL_MS: i64 = 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub timeout: Duration,
    pub check_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::milliseconds(SESSION_TIMEOUT_MS),
            check_interval: Duration::milliseconds(ACTIVITY_CHECK_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Session),
}

/// Messages emitted by the expiry timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Time to run `SessionManager::check_expiry`
    CheckDue,
}

/// Periodic task that nudges the owner to check for expiry.
/// Dropping it stops the task.
struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    fn arm(period: Duration, tx: mpsc::Sender<SessionEvent>) -> Option<Self> {
        let period = match period.to_std() {
            Ok(period) if !period.is_zero() => period,
            _ => std::time::Duration::from_millis(ACTIVITY_CHECK_INTERVAL_MS as u64),
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime available, expiry timer not armed");
                return None;
            }
        };

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match tx.try_send(SessionEvent::CheckDue) {
                    Ok(()) => {}
                    // A check is already queued
                    Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });
        Some(Self { handle })
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Owns the authentication state and the persisted session record.
pub struct SessionManager {
    settings: SessionSettings,
    state: SessionState,
    store: Box<dyn SessionStore>,
    verifier: Box<dyn CredentialVerifier>,
    clock: Arc<dyn ActivityClock>,
    events: Option<mpsc::Sender<SessionEvent>>,
    timer: Option<ExpiryTimer>,
    /// `lastActivity` as last written to the store
    persisted_activity: Option<DateTime<Utc>>,
}

impl SessionManager {
    pub fn new(
        settings: SessionSettings,
        store: Box<dyn SessionStore>,
        verifier: Box<dyn CredentialVerifier>,
        clock: Arc<dyn ActivityClock>,
    ) -> Self {
        Self {
            settings,
            state: SessionState::Anonymous,
            store,
            verifier,
            clock,
            events: None,
            timer: None,
            persisted_activity: None,
        }
    }

    /// Attach a channel for `CheckDue` ticks. While a session is
    /// authenticated a timer task sends on it every check interval.
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        if matches!(self.state, SessionState::Authenticated(_)) {
            self.arm_timer();
        }
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    /// Authenticated and still inside the inactivity window
    pub fn is_authenticated(&self) -> bool {
        match &self.state {
            SessionState::Authenticated(session) => !self.is_session_expired(session),
            SessionState::Anonymous => false,
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session.username.as_str()),
            SessionState::Anonymous => None,
        }
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session.last_activity),
            SessionState::Anonymous => None,
        }
    }

    /// Time left before the inactivity timeout, floored at zero
    pub fn time_remaining(&self) -> Option<Duration> {
        self.last_activity().map(|last| {
            let deadline = last + self.settings.timeout;
            (deadline - self.clock.now()).max(Duration::zero())
        })
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Pick up a session persisted by an earlier run.
    ///
    /// A record whose timeout elapsed while the process was closed is cleared
    /// without ever becoming authenticated.
    pub fn restore(&mut self) -> bool {
        let persisted = match self.read_persisted() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session record");
                None
            }
        };

        match persisted {
            Some(session) if !self.is_session_expired(&session) => {
                info!(username = %session.username, "Restored session");
                self.persisted_activity = Some(session.last_activity);
                self.enter(session);
                true
            }
            Some(session) => {
                info!(
                    username = %session.username,
                    last_activity = %session.last_activity,
                    "Stored session expired while inactive"
                );
                self.clear_store();
                false
            }
            None => {
                self.clear_store();
                false
            }
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        if !self.verifier.verify(username, password) {
            warn!(username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            username: username.to_string(),
            last_activity: self.clock.now(),
        };
        self.persist(&session);
        self.enter(session);
        info!(username, "Login successful");
        Ok(())
    }

    /// Refresh the inactivity window. Ignored while anonymous or once the
    /// window has already closed; the next expiry check handles the latter.
    pub fn record_activity(&mut self) {
        let now = self.clock.now();
        let timeout = self.settings.timeout;
        let SessionState::Authenticated(session) = &mut self.state else {
            return;
        };
        if now - session.last_activity > timeout || now <= session.last_activity {
            return;
        }
        session.last_activity = now;

        let persist_after = Duration::milliseconds(ACTIVITY_PERSIST_INTERVAL_MS);
        let due = self
            .persisted_activity
            .map_or(true, |persisted| now - persisted >= persist_after);
        if due {
            self.flush_activity();
        }
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated(session) = &self.state {
            info!(username = %session.username, "Logged out");
            self.end_session();
        }
    }

    /// Periodic check. Logs out and returns true when the inactivity
    /// timeout has been exceeded.
    pub fn check_expiry(&mut self) -> bool {
        let expired = match &self.state {
            SessionState::Authenticated(session) => self.is_session_expired(session),
            SessionState::Anonymous => false,
        };
        if expired {
            info!(username = ?self.current_user(), "Session expired after inactivity");
            self.end_session();
        } else {
            self.flush_activity();
            debug!(remaining = ?self.time_remaining(), "Session still active");
        }
        expired
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn is_session_expired(&self, session: &Session) -> bool {
        is_expired(self.clock.as_ref(), session.last_activity, self.settings.timeout)
    }

    fn enter(&mut self, session: Session) {
        self.state = SessionState::Authenticated(session);
        self.arm_timer();
    }

    fn end_session(&mut self) {
        self.timer = None;
        self.persisted_activity = None;
        self.state = SessionState::Anonymous;
        self.clear_store();
    }

    fn arm_timer(&mut self) {
        self.timer = self
            .events
            .as_ref()
            .and_then(|tx| ExpiryTimer::arm(self.settings.check_interval, tx.clone()));
    }

    fn read_persisted(&self) -> Result<Option<Session>> {
        let username = self.store.get(KEY_LOGGED_IN_USER)?;
        let last_activity = self.store.get(KEY_LAST_ACTIVITY)?;
        let (Some(username), Some(last_activity)) = (username, last_activity) else {
            return Ok(None);
        };

        let millis: i64 = last_activity
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", KEY_LAST_ACTIVITY, last_activity))?;
        let last_activity = DateTime::from_timestamp_millis(millis)
            .with_context(|| format!("{} out of range: {}", KEY_LAST_ACTIVITY, millis))?;

        Ok(Some(Session {
            username,
            last_activity,
        }))
    }

    fn persist(&mut self, session: &Session) {
        let millis = session.last_activity.timestamp_millis().to_string();
        let result = self
            .store
            .set(KEY_LOGGED_IN_USER, &session.username)
            .and_then(|_| self.store.set(KEY_LAST_ACTIVITY, &millis));
        match result {
            Ok(()) => self.persisted_activity = Some(session.last_activity),
            Err(e) => warn!(error = %e, "Failed to save session"),
        }
    }

    /// Write the in-memory `lastActivity` if the store is behind it
    fn flush_activity(&mut self) {
        let Some(last) = self.last_activity() else {
            return;
        };
        if self.persisted_activity == Some(last) {
            return;
        }
        let millis = last.timestamp_millis().to_string();
        match self.store.set(KEY_LAST_ACTIVITY, &millis) {
            Ok(()) => self.persisted_activity = Some(last),
            Err(e) => warn!(error = %e, "Failed to persist activity timestamp"),
        }
    }

    fn clear_store(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session record");
        }
    }
}
