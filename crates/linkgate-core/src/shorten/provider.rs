//! Shortening providers and the registry that describes how to talk to them.
//!
//! Each provider is a registry entry: an endpoint, a rule that turns the
//! endpoint plus a target URL into a request URL, and a rule that decodes the
//! response body. The client executing requests knows nothing else about
//! individual providers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TinyURL creation endpoint (plain-text response)
pub const TINYURL_ENDPOINT: &str = "https://tinyurl.com/api-create.php";

/// is.gd creation endpoint (plain-text response with `format=simple`)
pub const ISGD_ENDPOINT: &str = "https://is.gd/create.php";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    TinyUrl,
    IsGd,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::TinyUrl, ProviderId::IsGd];

    /// Identifier used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::TinyUrl => "tinyurl",
            ProviderId::IsGd => "isgd",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::TinyUrl => "TinyURL",
            ProviderId::IsGd => "is.gd",
        }
    }

    /// Get the next provider (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            ProviderId::TinyUrl => ProviderId::IsGd,
            ProviderId::IsGd => ProviderId::TinyUrl,
        }
    }

    /// Get the previous provider (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            ProviderId::TinyUrl => ProviderId::IsGd,
            ProviderId::IsGd => ProviderId::TinyUrl,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown provider: {0} (expected tinyurl or isgd)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tinyurl" => Ok(ProviderId::TinyUrl),
            "isgd" | "is.gd" => Ok(ProviderId::IsGd),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Builds the request URL from `(endpoint, target)`. `None` if the endpoint
/// does not parse.
pub type BuildRequest = fn(&str, &str) -> Option<Url>;

/// Extracts the short link from a successful response body.
pub type DecodeResponse = fn(&str) -> Option<String>;

#[derive(Clone)]
pub struct ProviderEntry {
    pub id: ProviderId,
    pub endpoint: String,
    pub build_request: BuildRequest,
    pub decode_response: DecodeResponse,
}

impl ProviderEntry {
    pub fn request_url(&self, target: &str) -> Option<Url> {
        (self.build_request)(&self.endpoint, target)
    }

    pub fn decode(&self, body: &str) -> Option<String> {
        (self.decode_response)(body)
    }

    fn tinyurl() -> Self {
        Self {
            id: ProviderId::TinyUrl,
            endpoint: TINYURL_ENDPOINT.to_string(),
            build_request: tinyurl_request,
            decode_response: plain_text,
        }
    }

    fn isgd() -> Self {
        Self {
            id: ProviderId::IsGd,
            endpoint: ISGD_ENDPOINT.to_string(),
            build_request: isgd_request,
            decode_response: plain_text,
        }
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn tinyurl_request(endpoint: &str, target: &str) -> Option<Url> {
    Url::parse_with_params(endpoint, &[("url", target)]).ok()
}

fn isgd_request(endpoint: &str, target: &str) -> Option<Url> {
    Url::parse_with_params(endpoint, &[("format", "simple"), ("url", target)]).ok()
}

/// Bare-text body holding the short link
fn plain_text(body: &str) -> Option<String> {
    let link = body.trim();
    (!link.is_empty()).then(|| link.to_string())
}

#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderId, ProviderEntry>,
}

impl ProviderRegistry {
    /// Registry with no providers
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ProviderEntry::tinyurl());
        registry.register(ProviderEntry::isgd());
        registry
    }

    pub fn register(&mut self, entry: ProviderEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: ProviderId) -> Option<&ProviderEntry> {
        self.entries.get(&id)
    }

    /// Point a registered provider at a different endpoint.
    /// Returns false if the provider is not registered.
    pub fn set_endpoint(&mut self, id: ProviderId, endpoint: impl Into<String>) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.endpoint = endpoint.into();
                true
            }
            None => false,
        }
    }

    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
