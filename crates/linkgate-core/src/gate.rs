//! Session-gated access to the shortening pipeline.
//!
//! Every UI intent goes through `Gate`: the session decides whether a
//! submission may start, and leaving the authenticated state (explicit
//! logout or inactivity) resets the controller so a result that was on
//! screen, or still in flight, is never shown afterwards.

use tracing::debug;

use crate::auth::{AuthError, SessionManager};
use crate::shorten::{
    Dispatch, ShortenController, ShortenRequest, ShortenResult, ShortenState, ShorteningClient,
    Ticket,
};

pub struct Gate {
    session: SessionManager,
    controller: ShortenController,
    client: ShorteningClient,
}

impl Gate {
    pub fn new(session: SessionManager, client: ShorteningClient) -> Self {
        Self {
            session,
            controller: ShortenController::new(),
            client,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn controller(&self) -> &ShortenController {
        &self.controller
    }

    pub fn client(&self) -> &ShorteningClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Startup check against the persisted session record
    pub fn restore(&mut self) -> bool {
        self.controller.reset();
        self.session.restore()
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        self.session.login(username, password)?;
        self.controller.reset();
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.controller.reset();
    }

    /// Periodic expiry check. Returns true if it ended the session.
    pub fn tick(&mut self) -> bool {
        let expired = self.session.check_expiry();
        if expired {
            self.controller.reset();
        }
        expired
    }

    /// An interaction happened. Expiry is checked first so a late key press
    /// cannot revive a session that already ran out.
    pub fn record_activity(&mut self) {
        if !self.tick() {
            self.session.record_activity();
        }
    }

    /// Start a submission if a session is active. `None` means nothing needs
    /// to be sent: either no session, or validation already failed (the
    /// controller holds the reason).
    pub fn begin_submit(&mut self, request: &ShortenRequest) -> Option<Dispatch> {
        if self.tick() || !self.session.is_authenticated() {
            debug!("Submission ignored without an active session");
            return None;
        }
        self.controller.begin(request)
    }

    /// Apply a finished request, unless the session ended or a newer
    /// submission replaced it in the meantime.
    pub fn finish(&mut self, ticket: Ticket, result: ShortenResult) -> bool {
        if !self.session.is_authenticated() {
            debug!("Dropping shorten result after session ended");
            // The window may have closed while the request was out
            self.tick();
            return false;
        }
        self.controller.complete(ticket, result)
    }

    pub async fn submit(&mut self, request: &ShortenRequest) -> &ShortenState {
        if let Some(dispatch) = self.begin_submit(request) {
            let (ticket, result) = dispatch.run(&self.client).await;
            self.finish(ticket, result);
        }
        self.controller.state()
    }
}
