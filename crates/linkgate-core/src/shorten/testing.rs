//! Scripted transport for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;

use super::client::{Transport, TransportResponse};
use super::error::TransportError;

pub(crate) struct FakeTransport {
    outcome: Result<TransportResponse, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn respond(status: u16, body: &str) -> Self {
        Self {
            outcome: Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.outcome.clone().map_err(TransportError::Other)
    }
}
