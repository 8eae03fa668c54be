//! Orchestration of a single shortening submission.
//!
//! `Idle → Validating → InFlight → (Success | Failed)`, restarting on the next
//! submission. Each dispatched request carries a `Ticket`; only the ticket
//! issued by the latest `begin` may complete the controller. Results for
//! older tickets are dropped, so the most recent submission always wins no
//! matter which request finishes first.

use tracing::debug;

use super::client::{validate_input, ShortenResult, ShorteningClient};
use super::error::ShortenError;
use super::provider::ProviderId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenState {
    Idle,
    Validating,
    InFlight,
    Success(String),
    Failed(ShortenError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenRequest {
    pub raw_input: String,
    pub provider: ProviderId,
}

impl ShortenRequest {
    pub fn new(raw_input: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            raw_input: raw_input.into(),
            provider,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A validated request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub url: String,
    pub provider: ProviderId,
}

impl Dispatch {
    pub async fn run(self, client: &ShorteningClient) -> (Ticket, ShortenResult) {
        let result = client.shorten(&self.url, self.provider).await;
        (self.ticket, result)
    }
}

#[derive(Debug)]
pub struct ShortenController {
    state: ShortenState,
    generation: u64,
}

impl Default for ShortenController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortenController {
    pub fn new() -> Self {
        Self {
            state: ShortenState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ShortenState {
        &self.state
    }

    /// Whether the loading indicator should be shown
    pub fn is_loading(&self) -> bool {
        matches!(self.state, ShortenState::InFlight)
    }

    pub fn short_url(&self) -> Option<&str> {
        match &self.state {
            ShortenState::Success(url) => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ShortenError> {
        match &self.state {
            ShortenState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }

    /// Start a submission. Clears the previous result, validates the input
    /// and, if it passes, returns the request to send.
    pub fn begin(&mut self, request: &ShortenRequest) -> Option<Dispatch> {
        // Any outstanding ticket is superseded from here on
        self.generation += 1;
        self.state = ShortenState::Validating;

        match validate_input(&request.raw_input) {
            Ok(url) => {
                self.state = ShortenState::InFlight;
                Some(Dispatch {
                    ticket: Ticket(self.generation),
                    url: url.to_string(),
                    provider: request.provider,
                })
            }
            Err(e) => {
                debug!(reason = %e, "Submission rejected");
                self.state = ShortenState::Failed(e);
                None
            }
        }
    }

    /// Apply a finished request. Returns false if the ticket is stale.
    pub fn complete(&mut self, ticket: Ticket, result: ShortenResult) -> bool {
        if ticket.0 != self.generation || !self.is_loading() {
            debug!(ticket = ticket.0, current = self.generation, "Discarding superseded result");
            return false;
        }
        self.state = match result {
            Ok(url) => ShortenState::Success(url),
            Err(e) => ShortenState::Failed(e),
        };
        true
    }

    /// Back to Idle; anything still in flight will be ignored.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = ShortenState::Idle;
    }

    /// Validate, send and apply in one go.
    pub async fn submit(
        &mut self,
        client: &ShorteningClient,
        request: &ShortenRequest,
    ) -> &ShortenState {
        if let Some(dispatch) = self.begin(request) {
            let (ticket, result) = dispatch.run(client).await;
            self.complete(ticket, result);
        }
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::shorten::testing::FakeTransport;
    use crate::shorten::ProviderRegistry;

    fn client(transport: &Arc<FakeTransport>) -> ShorteningClient {
        ShorteningClient::new(transport.clone(), ProviderRegistry::with_defaults())
    }

    fn request(raw: &str) -> ShortenRequest {
        ShortenRequest::new(raw, ProviderId::TinyUrl)
    }

    #[test]
    fn test_begin_valid_goes_in_flight() {
        let mut controller = ShortenController::new();
        let dispatch = controller.begin(&request("  https://example.com ")).unwrap();

        assert_eq!(dispatch.url, "https://example.com");
        assert_eq!(dispatch.provider, ProviderId::TinyUrl);
        assert_eq!(controller.state(), &ShortenState::InFlight);
        assert!(controller.is_loading());
    }

    #[test]
    fn test_begin_invalid_fails_without_dispatch() {
        let mut controller = ShortenController::new();

        assert!(controller.begin(&request("")).is_none());
        assert_eq!(controller.error(), Some(&ShortenError::EmptyInput));
        assert!(!controller.is_loading());

        assert!(controller.begin(&request("https://a.com https://b.com")).is_none());
        assert_eq!(controller.error(), Some(&ShortenError::MultipleUrls));
    }

    #[test]
    fn test_begin_clears_previous_result() {
        let mut controller = ShortenController::new();
        let dispatch = controller.begin(&request("https://example.com")).unwrap();
        controller.complete(dispatch.ticket, Ok("https://tiny.example/abc".into()));
        assert_eq!(controller.short_url(), Some("https://tiny.example/abc"));

        controller.begin(&request("https://example.org"));
        assert_eq!(controller.short_url(), None);
        assert_eq!(controller.error(), None);
    }

    #[test]
    fn test_complete_success_and_failure() {
        let mut controller = ShortenController::new();

        let dispatch = controller.begin(&request("https://example.com")).unwrap();
        assert!(controller.complete(dispatch.ticket, Ok("https://tiny.example/1".into())));
        assert_eq!(controller.state(), &ShortenState::Success("https://tiny.example/1".into()));

        let dispatch = controller.begin(&request("https://example.com")).unwrap();
        let err = ShortenError::ProviderError(ProviderId::TinyUrl);
        assert!(controller.complete(dispatch.ticket, Err(err.clone())));
        assert_eq!(controller.error(), Some(&err));
        assert_eq!(controller.error_message().as_deref(), Some("TinyURL failed"));
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_latest_submission_wins() {
        let mut controller = ShortenController::new();
        let first = controller.begin(&request("https://first.example")).unwrap();
        let second = controller.begin(&request("https://second.example")).unwrap();

        // The newer request finishes first
        assert!(controller.complete(second.ticket, Ok("https://tiny.example/2".into())));
        // The older one lands afterwards and is ignored
        assert!(!controller.complete(first.ticket, Ok("https://tiny.example/1".into())));

        assert_eq!(controller.short_url(), Some("https://tiny.example/2"));
    }

    #[test]
    fn test_superseded_result_does_not_end_loading() {
        let mut controller = ShortenController::new();
        let first = controller.begin(&request("https://first.example")).unwrap();
        let _second = controller.begin(&request("https://second.example")).unwrap();

        assert!(!controller.complete(first.ticket, Ok("https://tiny.example/1".into())));
        assert!(controller.is_loading());
    }

    #[test]
    fn test_reset_discards_in_flight() {
        let mut controller = ShortenController::new();
        let dispatch = controller.begin(&request("https://example.com")).unwrap();
        controller.reset();

        assert!(!controller.complete(dispatch.ticket, Ok("https://tiny.example/abc".into())));
        assert_eq!(controller.state(), &ShortenState::Idle);
    }

    #[test]
    fn test_ticket_cannot_complete_twice() {
        let mut controller = ShortenController::new();
        let dispatch = controller.begin(&request("https://example.com")).unwrap();
        assert!(controller.complete(dispatch.ticket, Ok("https://tiny.example/a".into())));
        assert!(!controller.complete(dispatch.ticket, Ok("https://tiny.example/b".into())));
        assert_eq!(controller.short_url(), Some("https://tiny.example/a"));
    }

    #[tokio::test]
    async fn test_submit_end_to_end() {
        let transport = Arc::new(FakeTransport::respond(200, "https://tiny.example/abc"));
        let client = client(&transport);
        let mut controller = ShortenController::new();

        let state = controller.submit(&client, &request("https://example.com")).await;
        assert_eq!(state, &ShortenState::Success("https://tiny.example/abc".into()));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_makes_no_call() {
        let transport = Arc::new(FakeTransport::respond(200, "unused"));
        let client = client(&transport);
        let mut controller = ShortenController::new();

        controller.submit(&client, &request("https://a.com https://b.com")).await;
        assert_eq!(controller.error(), Some(&ShortenError::MultipleUrls));
        assert_eq!(transport.call_count(), 0);
    }
}
