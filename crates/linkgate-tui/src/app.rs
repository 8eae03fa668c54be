//! Application state management for linkgate.
//!
//! This module contains the `App` struct that owns the session gate, the
//! login and shortening forms, and the channels that bring background work
//! (provider responses, expiry checks) back onto the UI loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use linkgate_core::auth::FileSessionStore;
use linkgate_core::shorten::{ShortenResult, Ticket};
use linkgate_core::{
    Config, Gate, ProviderId, SessionEvent, SessionManager, ShortenRequest, ShorteningClient,
    SystemClock,
};

use crate::clipboard;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channels.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for URL input.
/// 2048 matches the practical limit most browsers and providers accept.
const MAX_URL_LENGTH: usize = 2048;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Shortening form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Provider,
    Url,
    Shorten,
}

impl FormFocus {
    pub fn next(&self) -> Self {
        match self {
            FormFocus::Provider => FormFocus::Url,
            FormFocus::Url => FormFocus::Shorten,
            FormFocus::Shorten => FormFocus::Provider,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormFocus::Provider => FormFocus::Shorten,
            FormFocus::Url => FormFocus::Provider,
            FormFocus::Shorten => FormFocus::Url,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned tasks.
enum BackgroundResult {
    /// A provider request finished
    Shortened(Ticket, ShortenResult),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub gate: Gate,

    // UI State
    pub state: AppState,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Shortening form state
    pub url_input: String,
    pub provider: ProviderId,
    pub form_focus: FormFocus,

    // Status message
    pub status_message: Option<String>,

    // Background task channels
    background_rx: mpsc::Receiver<BackgroundResult>,
    background_tx: mpsc::Sender<BackgroundResult>,
    session_rx: mpsc::Receiver<SessionEvent>,
}

impl App {
    /// Create a new application instance
    pub async fn new() -> Result<Self> {
        debug!("App::new() starting");
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let (session_tx, session_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let gate = build_gate(&config, Some(session_tx))?;

        Ok(Self::from_parts(config, gate, session_rx))
    }

    /// Assemble an app around an existing gate
    pub fn from_parts(
        config: Config,
        gate: Gate,
        session_rx: mpsc::Receiver<SessionEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Get username from env var or config
        let login_username = std::env::var("LINKGATE_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();

        let provider = config.default_provider;

        Self {
            config,
            gate,

            state: AppState::Normal,

            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,

            url_input: String::new(),
            provider,
            form_focus: FormFocus::Url,

            status_message: None,

            background_rx: rx,
            background_tx: tx,
            session_rx,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Check if the user is authenticated with a live session
    pub fn is_authenticated(&self) -> bool {
        self.gate.is_authenticated()
    }

    /// Pick up a session left by a previous run. Expired sessions are
    /// cleared before anything is shown.
    pub fn restore_session(&mut self) -> bool {
        let restored = self.gate.restore();
        if restored {
            self.state = AppState::Normal;
        } else {
            self.start_login();
        }
        restored
    }

    /// Attempt login with the credentials from the login form
    pub fn attempt_login(&mut self) {
        let username = self.login_username.trim().to_string();

        if username.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        match self.gate.login(&username, &self.login_password) {
            Ok(()) => {
                self.login_password.clear();
                self.login_error = None;
                self.url_input.clear();
                self.state = AppState::Normal;
                self.form_focus = FormFocus::Url;
                self.status_message = Some(format!("Signed in as {}", username));

                if self.config.last_username.as_deref() != Some(username.as_str()) {
                    self.config.last_username = Some(username);
                    if let Err(e) = self.config.save() {
                        warn!(error = %e, "Failed to save config");
                    }
                }
            }
            Err(e) => {
                self.login_password.clear();
                self.login_focus = LoginFocus::Password;
                self.login_error = Some(e.to_string());
            }
        }
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Explicit logout from the main screen
    pub fn logout(&mut self) {
        self.gate.logout();
        self.url_input.clear();
        self.status_message = None;
        self.start_login();
    }

    /// Any key press or mouse event
    pub fn record_activity(&mut self) {
        if matches!(self.state, AppState::LoggingIn | AppState::Quitting) {
            return;
        }
        self.gate.record_activity();
        self.sync_session();
    }

    /// Leave the main screen if the session ended underneath us
    fn sync_session(&mut self) {
        if self.is_authenticated()
            || matches!(self.state, AppState::LoggingIn | AppState::Quitting)
        {
            return;
        }
        info!("Session ended, returning to login");
        // Clears the persisted record if the timer has not fired yet
        self.gate.tick();
        self.url_input.clear();
        self.status_message = None;
        self.start_login();
        self.login_error = Some(format!(
            "Session expired after {} minutes of inactivity",
            self.timeout_minutes()
        ));
    }

    pub fn timeout_minutes(&self) -> i64 {
        self.gate.session().settings().timeout.num_minutes()
    }

    /// Minutes left before the inactivity timeout, for the status bar
    pub fn session_minutes_left(&self) -> Option<i64> {
        self.gate
            .session()
            .time_remaining()
            .map(|left| (left.num_seconds() + 59) / 60)
    }

    // =========================================================================
    // Shortening
    // =========================================================================

    /// Validate the form and send the request on a background task
    pub fn submit(&mut self) {
        let request = ShortenRequest::new(self.url_input.clone(), self.provider);
        let Some(dispatch) = self.gate.begin_submit(&request) else {
            self.sync_session();
            return;
        };

        debug!(provider = self.provider.as_str(), "Dispatching shorten request");
        let client = self.gate.client().clone();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let (ticket, result) = dispatch.run(&client).await;
            if let Err(e) = tx.send(BackgroundResult::Shortened(ticket, result)).await {
                warn!(error = %e, "Failed to deliver shorten result - channel closed");
            }
        });
        self.status_message = None;
    }

    pub fn is_loading(&self) -> bool {
        self.gate.controller().is_loading()
    }

    pub fn cycle_provider(&mut self, forward: bool) {
        self.provider = if forward {
            self.provider.next()
        } else {
            self.provider.prev()
        };
    }

    /// Copy the displayed short link to the clipboard
    pub fn copy_short_url(&mut self) {
        let Some(url) = self.gate.controller().short_url() else {
            return;
        };
        match clipboard::copy(url) {
            Ok(()) => self.status_message = Some("Copied to clipboard".to_string()),
            Err(e) => warn!(error = %e, "Clipboard write failed"),
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Check for completed background tasks and timer ticks
    pub fn check_background_tasks(&mut self) {
        let mut check_due = false;
        while let Ok(event) = self.session_rx.try_recv() {
            match event {
                SessionEvent::CheckDue => check_due = true,
            }
        }
        if check_due && self.gate.tick() {
            info!("Logged out after inactivity");
        }

        let results: Vec<BackgroundResult> = {
            let mut results = Vec::new();
            while let Ok(result) = self.background_rx.try_recv() {
                results.push(result);
            }
            results
        };

        for result in results {
            match result {
                BackgroundResult::Shortened(ticket, result) => {
                    if !self.gate.finish(ticket, result) {
                        debug!("Ignored stale shorten result");
                    }
                }
            }
        }

        self.sync_session();
    }
}

/// Wire the session (file store, configured verifier, wall clock) and the
/// HTTP client into a gate. Without an event channel no expiry timer runs.
pub fn build_gate(config: &Config, events: Option<mpsc::Sender<SessionEvent>>) -> Result<Gate> {
    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    debug!(?cache_dir, "Cache directory configured");

    let mut session = SessionManager::new(
        config.session_settings(),
        Box::new(FileSessionStore::new(cache_dir)),
        config.credential_verifier(),
        Arc::new(SystemClock),
    );
    if let Some(tx) = events {
        session = session.with_events(tx);
    }

    let client = ShorteningClient::http(config.provider_registry(), config.request_timeout())?;
    Ok(Gate::new(session, client))
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a URL character should be accepted.
/// Spaces are allowed so the validator can report multiple URLs.
pub fn can_add_url_char(current_len: usize, c: char) -> bool {
    current_len < MAX_URL_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use linkgate_core::auth::{MemorySessionStore, PlaceholderVerifier};
    use linkgate_core::shorten::{Transport, TransportError, TransportResponse};
    use linkgate_core::{ManualClock, ProviderRegistry, SessionSettings, ShortenState};
    use reqwest::Url;

    use super::*;

    struct StubProvider {
        body: String,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Transport for StubProvider {
        async fn get(&self, _url: &Url) -> std::result::Result<TransportResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            Ok(TransportResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    fn app() -> (App, ManualClock, Arc<StubProvider>) {
        let clock = ManualClock::from_millis(1_700_000_000_000);
        let (session_tx, session_rx) = mpsc::channel(4);
        let session = SessionManager::new(
            SessionSettings::default(),
            Box::new(MemorySessionStore::new()),
            Box::new(PlaceholderVerifier::default()),
            Arc::new(clock.clone()),
        )
        .with_events(session_tx);
        let provider = Arc::new(StubProvider {
            body: "https://tiny.example/abc".to_string(),
            calls: Mutex::new(0),
        });
        let client = ShorteningClient::new(provider.clone(), ProviderRegistry::with_defaults());

        // Matching last_username keeps login from writing the real config file
        let config = Config {
            last_username: Some("admin".to_string()),
            ..Config::default()
        };
        let mut app = App::from_parts(config, Gate::new(session, client), session_rx);
        app.login_username = "admin".to_string();
        (app, clock, provider)
    }

    fn logged_in() -> (App, ManualClock, Arc<StubProvider>) {
        let (mut app, clock, provider) = app();
        app.start_login();
        app.login_password = "1234".to_string();
        app.attempt_login();
        (app, clock, provider)
    }

    async fn settle(app: &mut App) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
            app.check_background_tasks();
        }
    }

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_success() {
        let (app, _, _) = logged_in();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.is_authenticated());
        assert!(app.login_password.is_empty());
        assert_eq!(app.login_error, None);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (mut app, _, _) = app();
        app.start_login();
        app.login_password = "4321".to_string();
        app.attempt_login();

        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error.as_deref(), Some("Invalid credentials"));
        assert!(app.login_password.is_empty());
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (mut app, _, _) = app();
        app.start_login();
        app.attempt_login();
        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
        assert!(!app.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_without_session_shows_login() {
        let (mut app, _, _) = app();
        assert!(!app.restore_session());
        assert_eq!(app.state, AppState::LoggingIn);
    }

    // -------------------------------------------------------------------------
    // Shortening
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let (mut app, _, provider) = logged_in();
        app.url_input = "https://example.com".to_string();
        app.submit();
        assert!(app.is_loading());

        settle(&mut app).await;

        assert!(!app.is_loading());
        assert_eq!(app.gate.controller().short_url(), Some("https://tiny.example/abc"));
        assert_eq!(*provider.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_input_shows_error() {
        let (mut app, _, provider) = logged_in();
        app.url_input = "   ".to_string();
        app.submit();

        assert_eq!(
            app.gate.controller().error_message().as_deref(),
            Some("Please enter a URL")
        );
        settle(&mut app).await;
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_form_and_result() {
        let (mut app, _, _) = logged_in();
        app.url_input = "https://example.com".to_string();
        app.submit();
        settle(&mut app).await;

        app.logout();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.url_input.is_empty());
        assert_eq!(app.gate.controller().state(), &ShortenState::Idle);
    }

    #[tokio::test]
    async fn test_result_landing_after_logout_is_dropped() {
        let (mut app, _, _) = logged_in();
        app.url_input = "https://example.com".to_string();
        app.submit();
        app.logout();

        settle(&mut app).await;
        assert_eq!(app.gate.controller().short_url(), None);
    }

    #[tokio::test]
    async fn test_cycle_provider() {
        let (mut app, _, _) = app();
        assert_eq!(app.provider, ProviderId::TinyUrl);
        app.cycle_provider(true);
        assert_eq!(app.provider, ProviderId::IsGd);
        app.cycle_provider(false);
        assert_eq!(app.provider, ProviderId::TinyUrl);
    }

    // -------------------------------------------------------------------------
    // Session expiry
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_activity_after_timeout_returns_to_login() {
        let (mut app, clock, _) = logged_in();
        app.url_input = "https://example.com".to_string();

        clock.advance(Duration::minutes(31));
        app.record_activity();

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.url_input.is_empty());
        assert!(app.login_error.is_some());
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive() {
        let (mut app, clock, _) = logged_in();
        clock.advance(Duration::minutes(20));
        app.record_activity();
        clock.advance(Duration::minutes(20));
        app.check_background_tasks();

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.session_minutes_left(), Some(10));
    }

    #[tokio::test]
    async fn test_expiry_noticed_without_input() {
        let (mut app, clock, _) = logged_in();
        clock.advance(Duration::minutes(45));
        app.check_background_tasks();
        assert_eq!(app.state, AppState::LoggingIn);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_form_focus_cycle() {
        assert_eq!(FormFocus::Provider.next(), FormFocus::Url);
        assert_eq!(FormFocus::Url.next(), FormFocus::Shorten);
        assert_eq!(FormFocus::Shorten.next(), FormFocus::Provider); // Wraps around
        assert_eq!(FormFocus::Provider.prev(), FormFocus::Shorten);
        assert_eq!(FormFocus::Url.prev(), FormFocus::Provider);
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_url_char() {
        assert!(can_add_url_char(0, 'h'));
        assert!(can_add_url_char(10, ' '));
        assert!(!can_add_url_char(2048, 'a'));
        assert!(!can_add_url_char(0, '\t'));
    }
}
