//! Core library for linkgate.
//!
//! A single-user link shortener that sits behind a login with an
//! inactivity timeout:
//!
//! - `clock`: time source and inactivity comparison
//! - `auth`: session state machine, persisted session record, credential checks
//! - `shorten`: provider registry, HTTP client and submission state machine
//! - `gate`: ties the session to the shortening pipeline
//! - `config`: persisted user configuration

pub mod auth;
pub mod clock;
pub mod config;
pub mod gate;
pub mod shorten;

pub use auth::{AuthError, SessionEvent, SessionManager, SessionSettings};
pub use clock::{ActivityClock, ManualClock, SystemClock};
pub use config::{Config, VerifierKind};
pub use gate::Gate;
pub use shorten::{
    ProviderId, ProviderRegistry, ShortenController, ShortenError, ShortenRequest, ShortenState,
    ShorteningClient,
};
