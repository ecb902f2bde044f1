//! Shared configuration for VRM tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `vrm_api::ClientConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use vrm_api::{ClientConfig, DEFAULT_BASE_URL, RetryPolicy, TokenType};

/// Service name under which secrets are stored in the system keyring.
pub const KEYRING_SERVICE: &str = "vrm";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named VRM account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

/// A named VRM account profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API root; the production endpoint when unset.
    pub base_url: Option<String>,

    /// Auth mode: "token" or "password".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// Access token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// "Bearer" (default) or "Token".
    pub token_type: Option<String>,

    /// VRM account e-mail for password auth.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring).
    pub password: Option<String>,

    /// Client identifier sent with the login request.
    pub client_id: Option<String>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override retry count.
    pub max_retries: Option<u32>,
}

fn default_auth_mode() -> String {
    "token".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "vrm", "vrm").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vrm");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + `VRM_`-prefixed environment.
///
/// Nested keys use a double underscore, e.g.
/// `VRM_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VRM_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Which secret of a profile a keyring entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Token,
    Password,
}

impl SecretKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Password => "password",
        }
    }
}

fn keyring_entry(profile_name: &str, kind: SecretKind) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{}", kind.suffix()))
}

/// Store a profile secret in the system keyring.
pub fn store_secret(profile_name: &str, kind: SecretKind, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, kind)?.set_password(secret)?;
    Ok(())
}

fn keyring_secret(profile_name: &str, kind: SecretKind) -> Option<SecretString> {
    keyring_entry(profile_name, kind)
        .and_then(|entry| entry.get_password())
        .ok()
        .map(SecretString::from)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an access token from the credential chain.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var("VRM_TOKEN") {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring_secret(profile_name, SecretKind::Token) {
        return Ok(secret);
    }

    // 4. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve username + password.
pub fn resolve_password_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("VRM_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Env var
    if let Ok(pw) = std::env::var("VRM_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    // 2. Keyring
    if let Some(pw) = keyring_secret(profile_name, SecretKind::Password) {
        return Ok((username, pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn parse_token_type(profile: &Profile) -> Result<Option<TokenType>, ConfigError> {
    profile
        .token_type
        .as_deref()
        .map(str::parse::<TokenType>)
        .transpose()
        .map_err(|e| ConfigError::Validation {
            field: "token_type".into(),
            reason: e.to_string(),
        })
}

/// Build a `ClientConfig` from a profile, with `defaults` filling the
/// values the profile leaves unset.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let base_url = profile
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.into());
    url::Url::parse(&base_url).map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {base_url}"),
    })?;

    let mut config = match profile.auth_mode.as_str() {
        "token" => {
            let token = resolve_token(profile, profile_name)?;
            ClientConfig {
                token: Some(token),
                token_type: parse_token_type(profile)?,
                ..ClientConfig::default()
            }
        }
        "password" => {
            let (username, password) = resolve_password_credentials(profile, profile_name)?;
            ClientConfig {
                username: Some(username),
                password: Some(password),
                client_id: profile.client_id.clone(),
                ..ClientConfig::default()
            }
        }
        other => {
            return Err(ConfigError::Validation {
                field: "auth_mode".into(),
                reason: format!("expected 'token' or 'password', got '{other}'"),
            });
        }
    };

    config.base_url = base_url;
    config.request_timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.retry = RetryPolicy {
        max_retries: profile.max_retries.unwrap_or(defaults.max_retries),
        ..RetryPolicy::default()
    };
    Ok(config)
}
