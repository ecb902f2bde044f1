// VRM authentication
//
// Three credential flavors share one `X-Authorization` header:
// `Bearer <jwt>` for login/demo tokens, `Token <key>` for personal access
// tokens, and a password session that logs in lazily and caches the
// resulting bearer token per client instance.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};
use url::Url;

use crate::error::Error;

/// Header carrying the credential on every VRM request.
pub const AUTH_HEADER: &str = "X-Authorization";

/// Scheme prefix for a token credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenType {
    /// Short-lived JWT from a login or demo exchange.
    #[default]
    Bearer,
    /// Long-lived personal access token.
    Token,
}

impl TokenType {
    fn scheme(self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::Token => "Token",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for TokenType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "token" => Ok(Self::Token),
            other => Err(Error::configuration(format!(
                "token_type must be 'Bearer' or 'Token', got '{other}'"
            ))),
        }
    }
}

/// Which credential variant a client resolved to.
///
/// Marker enum (no data) for branching and diagnostics without
/// touching secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    BearerToken,
    AccessToken,
    PasswordSession,
}

/// A cached login result.
#[derive(Clone)]
pub(crate) struct Session {
    token: SecretString,
    /// User id returned by the login endpoint, when present.
    pub(crate) id_user: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub(crate) fn header(&self) -> Result<HeaderValue, Error> {
        header_value(TokenType::Bearer, &self.token)
    }
}

/// Username/password credential plus the session it produces.
pub(crate) struct PasswordSession {
    username: String,
    password: SecretString,
    client_id: Option<String>,
    /// Held across the login exchange: concurrent resolvers queue here
    /// and reuse the token instead of logging in again.
    session: Mutex<Option<Session>>,
}

/// The credential owned by one client instance.
pub(crate) enum Credential {
    BearerToken(SecretString),
    AccessToken(SecretString),
    PasswordSession(PasswordSession),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BearerToken(_) => f.write_str("BearerToken(..)"),
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
            Self::PasswordSession(s) => f
                .debug_struct("PasswordSession")
                .field("username", &s.username)
                .field("client_id", &s.client_id)
                .finish_non_exhaustive(),
        }
    }
}

impl Credential {
    /// Validate raw construction options into exactly one credential.
    ///
    /// A token excludes username/password/client_id; a password session
    /// needs both username and password; `token_type` only applies to
    /// tokens.
    pub(crate) fn from_options(
        token: Option<SecretString>,
        token_type: Option<TokenType>,
        username: Option<String>,
        password: Option<SecretString>,
        client_id: Option<String>,
    ) -> Result<Self, Error> {
        let has_password_parts = username.is_some() || password.is_some() || client_id.is_some();

        if let Some(token) = token {
            if has_password_parts {
                return Err(Error::configuration(
                    "use either a token or username/password, not both",
                ));
            }
            if token.expose_secret().trim().is_empty() {
                return Err(Error::configuration("token must not be empty"));
            }
            return Ok(match token_type.unwrap_or_default() {
                TokenType::Bearer => Self::BearerToken(token),
                TokenType::Token => Self::AccessToken(token),
            });
        }

        if token_type.is_some() {
            return Err(Error::configuration(
                "token_type was given without a token",
            ));
        }

        match (username, password) {
            (Some(username), Some(password)) => {
                if username.trim().is_empty() {
                    return Err(Error::configuration("username must not be empty"));
                }
                if password.expose_secret().is_empty() {
                    return Err(Error::configuration("password must not be empty"));
                }
                Ok(Self::PasswordSession(PasswordSession {
                    username,
                    password,
                    client_id,
                    session: Mutex::new(None),
                }))
            }
            (Some(_), None) => Err(Error::configuration("username given without password")),
            (None, Some(_)) => Err(Error::configuration("password given without username")),
            (None, None) => Err(Error::configuration(
                "no credentials: provide a token or username and password",
            )),
        }
    }

    pub(crate) fn strategy(&self) -> AuthStrategy {
        match self {
            Self::BearerToken(_) => AuthStrategy::BearerToken,
            Self::AccessToken(_) => AuthStrategy::AccessToken,
            Self::PasswordSession(_) => AuthStrategy::PasswordSession,
        }
    }
}

/// Turns the client's credential into an `X-Authorization` header,
/// logging in first when the credential is a password session.
#[derive(Debug)]
pub(crate) struct AuthResolver {
    credential: Credential,
    /// Bound on the login exchange, same as for any other request.
    timeout: Duration,
}

impl AuthResolver {
    pub(crate) fn new(credential: Credential, timeout: Duration) -> Self {
        Self {
            credential,
            timeout,
        }
    }

    pub(crate) fn strategy(&self) -> AuthStrategy {
        self.credential.strategy()
    }

    /// Produce the header for the next request.
    ///
    /// Token credentials resolve without I/O. A password session reuses
    /// its cached token while it is valid; otherwise exactly one caller
    /// performs the login exchange while the others wait for its result.
    pub(crate) async fn resolve(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
    ) -> Result<HeaderValue, Error> {
        match &self.credential {
            Credential::BearerToken(token) => header_value(TokenType::Bearer, token),
            Credential::AccessToken(token) => header_value(TokenType::Token, token),
            Credential::PasswordSession(creds) => {
                Self::session(creds, http, base_url, self.timeout)
                    .await?
                    .header()
            }
        }
    }

    async fn session(
        creds: &PasswordSession,
        http: &reqwest::Client,
        base_url: &Url,
        timeout: Duration,
    ) -> Result<Session, Error> {
        let mut cached = creds.session.lock().await;
        if let Some(session) = cached.as_ref() {
            if !session.is_expired(Utc::now()) {
                trace!("reusing cached VRM session");
                return Ok(session.clone());
            }
            debug!("cached VRM session expired");
        }

        let session = login(http, base_url, creds, timeout).await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Drop the cached session if it still holds the rejected header.
    ///
    /// A session already replaced by a concurrent re-login is kept, so
    /// callers racing on the same 401 trigger one login between them.
    pub(crate) async fn invalidate(&self, rejected: &HeaderValue) {
        let Credential::PasswordSession(creds) = &self.credential else {
            return;
        };
        let mut cached = creds.session.lock().await;
        let stale = cached
            .as_ref()
            .is_some_and(|session| session.header().is_ok_and(|h| &h == rejected));
        if stale {
            debug!("discarding rejected VRM session token");
            *cached = None;
        }
    }

    /// User id from the current session, if the login response carried one.
    pub(crate) async fn session_user_id(&self) -> Option<i64> {
        match &self.credential {
            Credential::PasswordSession(creds) => {
                creds.session.lock().await.as_ref().and_then(|s| s.id_user)
            }
            _ => None,
        }
    }

    /// Remove and return the cached session (for logout on close).
    pub(crate) async fn take_session(&self) -> Option<Session> {
        match &self.credential {
            Credential::PasswordSession(creds) => creds.session.lock().await.take(),
            _ => None,
        }
    }
}

fn header_value(token_type: TokenType, token: &SecretString) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&format!("{token_type} {}", token.expose_secret()))
        .map_err(|e| Error::Authentication {
            message: format!("token is not a valid header value: {e}"),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

// ── Login exchange ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "idUser")]
    id_user: Option<i64>,
    /// Unix seconds; absent on most deployments.
    #[serde(default)]
    expires: Option<i64>,
}

/// `POST auth/login` with `{"username", "password", "client_id"?}`.
///
/// Never retried: any failure surfaces as [`Error::Authentication`].
async fn login(
    http: &reqwest::Client,
    base_url: &Url,
    creds: &PasswordSession,
    timeout: Duration,
) -> Result<Session, Error> {
    let url = base_url.join("auth/login")?;
    debug!(username = %creds.username, "logging in at {}", url);

    let mut body = json!({
        "username": creds.username,
        "password": creds.password.expose_secret(),
    });
    if let Some(ref client_id) = creds.client_id {
        body["client_id"] = json!(client_id);
    }

    let resp = http
        .post(url)
        .json(&body)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Error::Authentication {
            message: format!("login request failed: {e}"),
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("login failed (HTTP {status}): {body}"),
        });
    }

    let parsed: LoginResponse = resp.json().await.map_err(|e| Error::Authentication {
        message: format!("unreadable login response: {e}"),
    })?;

    let token = parsed
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Authentication {
            message: "login response did not contain a token".into(),
        })?;

    info!(id_user = ?parsed.id_user, "VRM login successful");
    Ok(Session {
        token: SecretString::from(token),
        id_user: parsed.id_user,
        expires_at: parsed.expires.and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}
