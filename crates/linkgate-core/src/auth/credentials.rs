use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "linkgate";

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "1234";

/// Decides whether a username/password pair may open a session.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Fixed-pair equality check.
#[derive(Debug, Clone)]
pub struct PlaceholderVerifier {
    username: String,
    password: String,
}

impl PlaceholderVerifier {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for PlaceholderVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl CredentialVerifier for PlaceholderVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

/// Checks passwords against the OS keychain.
pub struct KeyringVerifier;

impl KeyringVerifier {
    /// Store username and password in the OS keychain
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Delete stored credentials for a username
    pub fn delete(username: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}

impl CredentialVerifier for KeyringVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        if username.is_empty() {
            return false;
        }
        match Entry::new(SERVICE_NAME, username).and_then(|e| e.get_password()) {
            Ok(stored) => stored == password,
            Err(e) => {
                debug!(error = %e, "No usable keychain entry");
                false
            }
        }
    }
}
