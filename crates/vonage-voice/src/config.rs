//! Client configuration.
//!
//! A [`ClientConfig`] names the application, where its private key lives and
//! which API host to talk to. It can be built in code or loaded from a TOML
//! file:
//!
//! ```toml
//! application_id = "aaaaaaaa-bbbb-cccc-dddd-0123456789ab"
//! private_key_path = "private.key"
//! base_url = "https://api.nexmo.com"
//! timeout_secs = 30
//! ```
//!
//! # Resolution
//!
//! [`ClientConfig::resolve`] looks for a config file in this order:
//!
//! 1. The path in `VONAGE_VOICE_CONFIG_PATH`
//! 2. `vonage.toml` in the current directory
//! 3. `vonage.toml` in each parent directory, up to the filesystem root
//! 4. `<config dir>/vonage/voice.toml` (e.g. `~/.config/vonage/voice.toml`)
//!
//! A missing file is not an error; a file that exists but cannot be read or
//! parsed is.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    VoiceError,
    auth::{DEFAULT_TOKEN_TTL_SECS, JwtAuth},
};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.nexmo.com";

/// Environment variable overriding config file resolution.
pub const CONFIG_PATH_ENV: &str = "VONAGE_VOICE_CONFIG_PATH";

const PROJECT_FILE_NAME: &str = "vonage.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The file parsed but describes an unusable client.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings needed to build a [`VoiceClient`](crate::VoiceClient).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub application_id: String,

    /// Path to the PEM private key. Relative paths are resolved against the
    /// directory of the config file they were loaded from.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// Inline PEM private key; takes precedence over `private_key_path`.
    #[serde(default)]
    pub private_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let private_key = self.private_key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("application_id", &self.application_id)
            .field("private_key_path", &self.private_key_path)
            .field("private_key", &private_key)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_token_ttl_secs() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

impl ClientConfig {
    /// Config with an inline key and every other setting at its default.
    pub fn new(application_id: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            private_key_path: None,
            private_key: Some(private_key_pem.into()),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Loads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if:
    /// - The file cannot be read (returns `NotFound` variant)
    /// - The file cannot be parsed as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|_e| ConfigError::NotFound(path.to_path_buf()))?;

        let mut config: ClientConfig = toml::from_str(&contents)?;
        if let Some(key_path) = &config.private_key_path
            && key_path.is_relative()
            && let Some(dir) = path.parent()
        {
            config.private_key_path = Some(dir.join(key_path));
        }
        Ok(config)
    }

    /// Finds and loads a config file using the resolution order described in
    /// the module docs.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if:
    /// - The current directory cannot be determined
    /// - A found config file cannot be read
    /// - A found config file cannot be parsed
    pub fn resolve() -> Result<Option<Self>, ConfigError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let current = std::env::current_dir()?;
        resolve_from(env_path.as_deref(), &current, xdg_config_path().as_deref())
    }

    /// Loads the private key, inline or from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if neither key source is set or the key file cannot
    /// be read.
    pub fn private_key_pem(&self) -> Result<Vec<u8>, ConfigError> {
        if let Some(pem) = &self.private_key {
            return Ok(pem.as_bytes().to_vec());
        }
        match &self.private_key_path {
            Some(path) => Ok(fs::read(path)?),
            None => Err(ConfigError::Invalid(
                "one of private_key or private_key_path must be set".to_string(),
            )),
        }
    }

    /// Checks the numeric settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `timeout_secs` or
    /// `token_ttl_secs` is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            let message = "timeout_secs must be positive".to_string();
            return Err(ConfigError::Invalid(message));
        }
        if self.token_ttl_secs <= 0 {
            let message = "token_ttl_secs must be positive".to_string();
            return Err(ConfigError::Invalid(message));
        }
        Ok(())
    }

    /// Builds the token signer described by this config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the key cannot be
    /// loaded or parsed.
    pub fn authenticator(&self) -> Result<JwtAuth, VoiceError> {
        self.validate()?;
        let pem = self.private_key_pem()?;
        let auth = JwtAuth::new(self.application_id.clone(), &pem)?;
        Ok(auth.with_ttl(chrono::Duration::seconds(self.token_ttl_secs)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolution with every environmental input made explicit.
fn resolve_from(
    env_path: Option<&Path>,
    start_dir: &Path,
    xdg_path: Option<&Path>,
) -> Result<Option<ClientConfig>, ConfigError> {
    // Step 1: Environment variable override
    if let Some(path) = env_path
        && path.exists()
    {
        return ClientConfig::load(path).map(Some);
    }

    // Steps 2 and 3: current directory, then its parents
    for dir in start_dir.ancestors() {
        let candidate = dir.join(PROJECT_FILE_NAME);
        if candidate.exists() {
            return ClientConfig::load(&candidate).map(Some);
        }
    }

    // Step 4: per-user config directory
    if let Some(path) = xdg_path
        && path.exists()
    {
        return ClientConfig::load(path).map(Some);
    }

    Ok(None)
}

fn xdg_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("vonage").join("voice.toml"))
}
