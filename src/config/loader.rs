//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::credentials::Credentials;
use crate::config::schema::SwapConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file when `--config` is not given.
pub const CONFIG_PATH_ENV_VAR: &str = "DEX_SWAP_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    MissingCredentials(Vec<&'static str>),
    WalletMismatch { configured: String, derived: String },
    InvalidPrivateKey(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::MissingCredentials(names) => {
                write!(f, "Missing environment variables: {}", names.join(", "))
            }
            ConfigError::WalletMismatch { configured, derived } => write!(
                f,
                "Configured wallet {} does not match private key address {}",
                configured, derived
            ),
            ConfigError::InvalidPrivateKey(e) => write!(f, "Invalid private key: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SwapConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SwapConfig, ConfigError> {
    let config: SwapConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the config file path: explicit argument first, then `DEX_SWAP_CONFIG`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os(CONFIG_PATH_ENV_VAR).map(PathBuf::from))
}

/// Load configuration (file or defaults) together with environment credentials.
///
/// This is the single startup entry point; the result is immutable afterwards.
pub fn load_with_credentials(
    path: Option<&Path>,
) -> Result<(SwapConfig, Credentials), ConfigError> {
    let config = match path {
        Some(p) => load_config(p)?,
        None => {
            let config = SwapConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };
    let credentials = Credentials::from_env()?;
    Ok((config, credentials))
}
