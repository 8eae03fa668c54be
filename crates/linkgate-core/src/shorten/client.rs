//! HTTP client for the shortening providers.
//!
//! `ShorteningClient` validates one URL, looks up the provider in the
//! registry, issues exactly one GET and normalizes the outcome into a
//! `ShortenResult`. Transport is behind a trait so the pipeline can run
//! without a network.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::error::{truncate_body, ShortenError, TransportError};
use super::provider::{ProviderId, ProviderRegistry};

/// HTTP request timeout in seconds.
/// 30s allows for slow providers while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("linkgate/", env!("CARGO_PKG_VERSION"));

/// Short link on success, user-visible failure otherwise.
pub type ShortenResult = std::result::Result<String, ShortenError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> std::result::Result<TransportResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Trim the input and make sure it holds exactly one URL.
pub fn validate_input(raw: &str) -> std::result::Result<&str, ShortenError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ShortenError::EmptyInput)
    } else if trimmed.contains(char::is_whitespace) {
        Err(ShortenError::MultipleUrls)
    } else {
        Ok(trimmed)
    }
}

#[derive(Clone)]
pub struct ShorteningClient {
    transport: Arc<dyn Transport>,
    registry: Arc<ProviderRegistry>,
}

impl ShorteningClient {
    pub fn new(transport: Arc<dyn Transport>, registry: ProviderRegistry) -> Self {
        Self {
            transport,
            registry: Arc::new(registry),
        }
    }

    /// Client talking to the real providers over HTTP
    pub fn http(registry: ProviderRegistry, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(timeout)?;
        Ok(Self::new(Arc::new(transport), registry))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Shorten one URL with the given provider. No retries, no caching.
    pub async fn shorten(&self, raw: &str, provider: ProviderId) -> ShortenResult {
        let target = validate_input(raw)?;

        let Some(entry) = self.registry.get(provider) else {
            warn!(provider = provider.as_str(), "Provider is not registered");
            return Err(ShortenError::ProviderError(provider));
        };

        let Some(request) = entry.request_url(target) else {
            warn!(
                provider = provider.as_str(),
                endpoint = %entry.endpoint,
                "Provider endpoint is not a valid URL"
            );
            return Err(ShortenError::ProviderError(provider));
        };

        debug!(provider = provider.as_str(), url = %request, "Sending shorten request");

        let response = match self.transport.get(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = provider.as_str(), error = %e, "Shorten request failed");
                return Err(ShortenError::NetworkError(e.to_string()));
            }
        };

        if !response.is_success() {
            warn!(
                provider = provider.as_str(),
                status = response.status,
                body = %truncate_body(&response.body),
                "Provider returned an error status"
            );
            return Err(ShortenError::ProviderError(provider));
        }

        match entry.decode(&response.body) {
            Some(short) => {
                debug!(provider = provider.as_str(), short = %short, "Shortened");
                Ok(short)
            }
            None => {
                warn!(provider = provider.as_str(), "Provider returned an empty body");
                Err(ShortenError::ProviderError(provider))
            }
        }
    }
}
