//! API key handling for the completion service.
//!
//! Keys are brought by the user (BYOK). They live in memory for the session
//! and can optionally be remembered in the operating system's credential
//! store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet, etc.)
//!
//! Keys are never written to a project file and never logged.

#[cfg(feature = "secrets")]
use keyring::Entry;
#[cfg(feature = "secrets")]
use zeroize::Zeroize;

use std::fmt;
use thiserror::Error;

/// The service name used for keyring entries.
const SERVICE_NAME: &str = "brainstormer";

/// Keyring entry holding the OpenAI key.
const OPENAI_KEY_NAME: &str = "openai_api_key";

/// Environment variable consulted before the keychain.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Result type for secrets operations.
pub type SecretsResult<T> = Result<T, SecretsError>;

/// Errors that can occur during secrets operations.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// Failed to access the system keychain.
    #[error("Failed to access system keychain: {0}")]
    KeychainAccess(String),

    /// Secret not found.
    #[error("API key not found: {0}")]
    NotFound(String),

    /// Failed to store secret.
    #[error("Failed to store API key: {0}")]
    StoreFailed(String),

    /// Failed to delete secret.
    #[error("Failed to delete API key: {0}")]
    DeleteFailed(String),

    /// Feature not available.
    #[error("Keychain storage not available - compile with 'secrets' feature")]
    FeatureNotAvailable,
}

/// A secret value that is zeroed on drop.
#[cfg(feature = "secrets")]
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue {
    value: String,
}

#[cfg(not(feature = "secrets"))]
#[derive(Clone)]
pub struct SecretValue {
    value: String,
}

impl SecretValue {
    /// Create a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Get the secret value.
    ///
    /// Note: Use sparingly and ensure the value is not logged.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Short hint safe to print (`sk-...wxyz`).
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.value.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

// Prevent accidental logging of secrets
impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Passed on the command line
    Explicit,
    /// Read from OPENAI_API_KEY
    Environment,
    /// Read from the OS keychain
    Keychain,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "command line",
            Self::Environment => "environment",
            Self::Keychain => "keychain",
        })
    }
}

/// Manages the stored API key.
#[derive(Debug)]
pub struct SecretsManager {
    /// Service name for keyring entries.
    service: String,
}

impl Default for SecretsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretsManager {
    /// Create a new secrets manager.
    pub fn new() -> Self {
        Self { service: SERVICE_NAME.to_string() }
    }

    /// Create a secrets manager with a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    /// Remember the API key in the system keychain.
    #[cfg(feature = "secrets")]
    pub fn store_api_key(&self, secret: &SecretValue) -> SecretsResult<()> {
        let entry = Entry::new(&self.service, OPENAI_KEY_NAME)
            .map_err(|e| SecretsError::KeychainAccess(e.to_string()))?;

        entry.set_password(secret.expose()).map_err(|e| SecretsError::StoreFailed(e.to_string()))
    }

    /// Remember the API key in the system keychain.
    #[cfg(not(feature = "secrets"))]
    pub fn store_api_key(&self, _secret: &SecretValue) -> SecretsResult<()> {
        Err(SecretsError::FeatureNotAvailable)
    }

    /// Read the API key from the system keychain.
    #[cfg(feature = "secrets")]
    pub fn retrieve_api_key(&self) -> SecretsResult<SecretValue> {
        let entry = Entry::new(&self.service, OPENAI_KEY_NAME)
            .map_err(|e| SecretsError::KeychainAccess(e.to_string()))?;

        match entry.get_password() {
            Ok(password) => Ok(SecretValue::new(password)),
            Err(keyring::Error::NoEntry) => Err(SecretsError::NotFound(OPENAI_KEY_NAME.to_string())),
            Err(e) => Err(SecretsError::KeychainAccess(e.to_string())),
        }
    }

    /// Read the API key from the system keychain.
    #[cfg(not(feature = "secrets"))]
    pub fn retrieve_api_key(&self) -> SecretsResult<SecretValue> {
        Err(SecretsError::FeatureNotAvailable)
    }

    /// Forget the API key stored in the system keychain.
    #[cfg(feature = "secrets")]
    pub fn delete_api_key(&self) -> SecretsResult<()> {
        let entry = Entry::new(&self.service, OPENAI_KEY_NAME)
            .map_err(|e| SecretsError::KeychainAccess(e.to_string()))?;

        entry.delete_credential().map_err(|e| SecretsError::DeleteFailed(e.to_string()))
    }

    /// Forget the API key stored in the system keychain.
    #[cfg(not(feature = "secrets"))]
    pub fn delete_api_key(&self) -> SecretsResult<()> {
        Err(SecretsError::FeatureNotAvailable)
    }

    /// Resolve the key: explicit value, then environment, then keychain.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> SecretsResult<(SecretValue, KeySource)> {
        if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
            return Ok((SecretValue::new(value.trim()), KeySource::Explicit));
        }

        if let Ok(value) = std::env::var(OPENAI_KEY_ENV) {
            if !value.trim().is_empty() {
                return Ok((SecretValue::new(value.trim()), KeySource::Environment));
            }
        }

        match self.retrieve_api_key() {
            Ok(secret) if !secret.is_empty() => Ok((secret, KeySource::Keychain)),
            Ok(_) | Err(SecretsError::FeatureNotAvailable) => {
                Err(SecretsError::NotFound(OPENAI_KEY_ENV.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
