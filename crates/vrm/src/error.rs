//! CLI error types with miette diagnostics.
//!
//! Maps `vrm_api::Error` and `vrm_config::ConfigError` into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vrm_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the VRM API after {attempts} attempt(s)")]
    #[diagnostic(
        code(vrm::connection_failed),
        help(
            "Check network access to the VRM API.\n\
             Raise --timeout or --max-retries for slow links."
        )
    )]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not connect to MQTT broker {host}: {reason}")]
    #[diagnostic(
        code(vrm::mqtt_connection),
        help("Check the broker host, port, credentials, and --no-ssl setting.")
    )]
    MqttConnection { host: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vrm::auth_failed),
        help(
            "Verify your access token or username/password.\n\
             Access tokens are created under Preferences > Integrations in the VRM portal."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(vrm::no_credentials),
        help(
            "Configure credentials with: vrm config init\n\
             Or set the VRM_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(
        code(vrm::not_found),
        help("Run: vrm sites to see the installations this account can access")
    )]
    NotFound { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(vrm::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response at `{field}`: {reason}")]
    #[diagnostic(
        code(vrm::invalid_response),
        help("The VRM API returned data in an unexpected shape. Re-run with -vv for details.")
    )]
    InvalidResponse { field: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vrm::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vrm::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vrm config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(vrm::config))]
    Config(ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(vrm::serialize))]
    Serialize(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::MqttConnection { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library errors → CliError ────────────────────────────────────────

impl From<vrm_api::Error> for CliError {
    fn from(err: vrm_api::Error) -> Self {
        use vrm_api::Error;

        let message = err.to_string();
        match err {
            Error::Configuration { message } => CliError::Validation {
                field: "credentials".into(),
                reason: message,
            },
            Error::Authentication { message } => CliError::AuthFailed { message },
            Error::Connection { attempts, source } => CliError::ConnectionFailed {
                attempts,
                source: Box::new(source),
            },
            Error::InvalidUrl(e) => CliError::Validation {
                field: "base_url".into(),
                reason: e.to_string(),
            },
            Error::Request { status: 404, .. } => CliError::NotFound { message },
            Error::Request {
                status: 401 | 403, ..
            } => CliError::AuthFailed { message },
            Error::Request { status, .. } => CliError::ApiError { status, message },
            Error::Parse { field, reason } => CliError::InvalidResponse { field, reason },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
