use thiserror::Error;

use super::provider::ProviderId;

/// Why a submission produced no short link. `Display` is the user-facing text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortenError {
    #[error("Please enter a URL")]
    EmptyInput,

    #[error("Please enter only one URL at a time")]
    MultipleUrls,

    #[error("{} failed", .0.display_name())]
    ProviderError(ProviderId),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ShortenError {
    /// Validation failures are raised before any request is attempted
    pub fn is_validation(&self) -> bool {
        matches!(self, ShortenError::EmptyInput | ShortenError::MultipleUrls)
    }
}

/// Failure below the HTTP status level: DNS, connect, timeout, body read.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Maximum length for provider response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        None => body.to_string(),
        Some((cut, _)) => format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        ),
    }
}
