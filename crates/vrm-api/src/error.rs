use thiserror::Error;

/// Top-level error type for the `vrm-api` crate.
///
/// Every failure a [`VrmClient`](crate::VrmClient) can report is one of
/// these variants, so callers can match broadly (`Err(_)`) or narrowly
/// (`Err(Error::Request { status: 404, .. })`).
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Missing, partial, or ambiguous credentials, or an unusable option.
    /// Raised while constructing a client, before any network call.
    #[error("Invalid client configuration: {message}")]
    Configuration { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The login exchange failed (wrong credentials, 2FA required,
    /// unreachable auth endpoint, malformed login response).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Network-level failure (DNS, refused connection, timeout) that
    /// survived every retry attempt.
    #[error("Connection to VRM failed after {attempts} attempt(s): {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx status after retries, or a `{"success": false}` envelope.
    /// Carries the raw body for caller inspection.
    #[error("VRM request failed (HTTP {status}): {}", body_preview(.body))]
    Request { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The response body does not match the resource schema.
    /// `field` is a path such as `records[2].idSite`.
    #[error("Unexpected response shape at `{field}`: {reason}")]
    Parse { field: String, reason: String },
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn parse(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Connection { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Request { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the credential was rejected and re-authentication
    /// (or a new token) might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. }) || self.status() == Some(401)
    }

    /// The offending field path for [`Error::Parse`].
    pub fn parse_field(&self) -> Option<&str> {
        match self {
            Self::Parse { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// First 200 characters of a response body, for error messages.
fn body_preview(body: &str) -> &str {
    body.char_indices()
        .nth(200)
        .map_or(body, |(idx, _)| &body[..idx])
}
