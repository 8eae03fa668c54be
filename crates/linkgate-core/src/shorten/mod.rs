//! URL shortening pipeline.
//!
//! This module provides:
//! - `ShorteningClient`: sends one URL to a provider and normalizes the reply
//! - `ProviderRegistry`: per-provider request and response rules
//! - `ShortenController`: the submission state machine the UI renders
//!
//! Providers answer with a bare-text short link; nothing here parses JSON.

pub mod client;
pub mod controller;
pub mod error;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    validate_input, HttpTransport, ShortenResult, ShorteningClient, Transport, TransportResponse,
};
pub use controller::{Dispatch, ShortenController, ShortenRequest, ShortenState, Ticket};
pub use error::{ShortenError, TransportError};
pub use provider::{ProviderId, ProviderRegistry, ProviderEntry, UnknownProvider};
