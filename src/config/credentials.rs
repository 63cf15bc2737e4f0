//! Process-wide credentials, loaded once from the environment.
//!
//! # Security
//! - Values are read ONLY from environment variables, never from the config file
//! - `Debug` output redacts every field
//! - Nothing here is ever logged

use std::fmt;

use crate::config::loader::ConfigError;

/// Environment variable holding the aggregator API key.
pub const API_KEY_ENV_VAR: &str = "DEX_SWAP_API_KEY";
/// Environment variable holding the HMAC shared secret.
pub const SECRET_KEY_ENV_VAR: &str = "DEX_SWAP_SECRET_KEY";
/// Environment variable holding the API passphrase.
pub const PASSPHRASE_ENV_VAR: &str = "DEX_SWAP_PASSPHRASE";
/// Environment variable holding the wallet private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "DEX_SWAP_PRIVATE_KEY";

/// API credentials used to sign aggregator requests.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Full credential set: API credentials plus the signing key.
#[derive(Clone)]
pub struct Credentials {
    pub api: ApiCredentials,
    pub private_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api", &self.api)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load all credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through an arbitrary lookup.
    ///
    /// Every missing or blank variable is reported, not just the first.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |name: &'static str| match lookup(name) {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let api_key = read(API_KEY_ENV_VAR);
        let secret_key = read(SECRET_KEY_ENV_VAR);
        let passphrase = read(PASSPHRASE_ENV_VAR);
        let private_key = read(PRIVATE_KEY_ENV_VAR);

        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        Ok(Self {
            api: ApiCredentials {
                api_key,
                secret_key,
                passphrase,
            },
            private_key,
        })
    }
}
