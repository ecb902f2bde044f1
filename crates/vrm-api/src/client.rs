// VRM HTTP client
//
// Wraps `reqwest::Client` with credential resolution, bounded retries, and
// `{"success": ...}` envelope checking. Resource endpoints live in
// `resources/` as inherent methods to keep this module focused on
// transport mechanics.

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AUTH_HEADER, AuthResolver, AuthStrategy, Credential, TokenType};
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

/// Production VRM API root.
pub const DEFAULT_BASE_URL: &str = "https://vrmapi.victronenergy.com/v2/";

/// Construction options for a [`VrmClient`].
///
/// Exactly one credential must be given: `token` (with an optional
/// `token_type`), or `username` + `password` (with an optional
/// `client_id`). Anything else fails in [`VrmClient::new`] with
/// [`Error::Configuration`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<SecretString>,
    pub token_type: Option<TokenType>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub client_id: Option<String>,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Externally managed connection pool. When `None`, one is built
    /// from `request_timeout`.
    pub http: Option<reqwest::Client>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: None,
            token_type: None,
            username: None,
            password: None,
            client_id: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            http: None,
        }
    }
}

impl ClientConfig {
    /// Token credential with the given scheme.
    pub fn with_token(token: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            token: Some(SecretString::from(token.into())),
            token_type: Some(token_type),
            ..Self::default()
        }
    }

    /// Password-session credential.
    pub fn with_password(
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: Option<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
            client_id,
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }
}

/// Successful response body, before mapping.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    /// Decode the body and reject `{"success": false}` envelopes, which
    /// VRM sends with HTTP 200 for some validation failures.
    pub fn json(&self) -> Result<Value, Error> {
        let value: Value = serde_json::from_str(&self.body)
            .map_err(|e| Error::parse("$", format!("response is not JSON: {e}")))?;
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(Error::Request {
                status: self.status.as_u16(),
                body: self.body.clone(),
            });
        }
        Ok(value)
    }
}

/// Async client for the VRM API.
///
/// Safe to share across concurrent tasks (`&VrmClient` or `Arc<VrmClient>`):
/// the only mutable state is the password session, which serializes its
/// own login. Dropping the client releases its connection pool;
/// [`close()`](Self::close) additionally ends a password session.
#[derive(Debug)]
pub struct VrmClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthResolver,
    retry: RetryPolicy,
    timeout: Duration,
}

impl VrmClient {
    /// Validate the configuration and build a client. Performs no I/O.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let credential = Credential::from_options(
            config.token,
            config.token_type,
            config.username,
            config.password,
            config.client_id,
        )?;

        if config.request_timeout.is_zero() {
            return Err(Error::configuration("request_timeout must be positive"));
        }

        let base_url = normalize_base_url(&config.base_url)?;
        let http = match config.http {
            Some(http) => http,
            None => TransportConfig::with_timeout(config.request_timeout).build_client()?,
        };

        debug!(base_url = %base_url, strategy = ?credential.strategy(), "VRM client created");

        Ok(Self {
            http,
            base_url,
            auth: AuthResolver::new(credential, config.request_timeout),
            retry: config.retry,
            timeout: config.request_timeout,
        })
    }

    /// The credential variant this client authenticates with.
    pub fn auth_strategy(&self) -> AuthStrategy {
        self.auth.strategy()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// User id carried by the password session, logging in if needed.
    /// `None` for token credentials.
    pub(crate) async fn session_user_id(&self) -> Result<Option<i64>, Error> {
        if self.auth.strategy() != AuthStrategy::PasswordSession {
            return Ok(None);
        }
        self.auth.resolve(&self.http, &self.base_url).await?;
        Ok(self.auth.session_user_id().await)
    }

    /// Join a relative path (e.g. `"users/me"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Request executor ─────────────────────────────────────────────

    /// Issue an authenticated request with retries.
    ///
    /// Only use for idempotent operations: failed attempts are re-sent
    /// verbatim. A 401 on a password session discards the cached token,
    /// logs in once more, and repeats the request a single time.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        let mut reauthenticated = false;

        loop {
            let header = self.auth.resolve(&self.http, &self.base_url).await?;
            let result = self.send_with_retry(&method, &url, query, body, &header).await;

            let rejected = matches!(result, Err(Error::Request { status: 401, .. }));
            if rejected
                && !reauthenticated
                && self.auth.strategy() == AuthStrategy::PasswordSession
            {
                debug!("session rejected, re-authenticating once");
                self.auth.invalidate(&header).await;
                reauthenticated = true;
                continue;
            }
            return result;
        }
    }

    /// GET a path and decode the JSON envelope.
    pub(crate) async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, Error> {
        self.execute(Method::GET, path, query, None).await?.json()
    }

    async fn send_with_retry(
        &self,
        method: &Method,
        url: &Url,
        query: &[(&str, String)],
        body: Option<&Value>,
        auth: &HeaderValue,
    ) -> Result<RawResponse, Error> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(%method, %url, attempt, "sending VRM request");

            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .header(AUTH_HEADER, auth.clone())
                .timeout(self.timeout);
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let failure = match builder.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let body = resp.text().await.map_err(|source| Error::Connection {
                            attempts: attempt,
                            source,
                        })?;
                        return Ok(RawResponse { status, body });
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = Error::Request {
                        status: status.as_u16(),
                        body,
                    };
                    if !RetryPolicy::is_retryable_status(status) {
                        return Err(err);
                    }
                    err
                }
                Err(source) => {
                    let retryable = RetryPolicy::is_retryable_transport(&source);
                    let err = Error::Connection {
                        attempts: attempt,
                        source,
                    };
                    if !retryable {
                        return Err(err);
                    }
                    err
                }
            };

            if attempt > self.retry.max_retries {
                return Err(failure);
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                attempt,
                max_attempts = self.retry.max_attempts(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %failure,
                "VRM request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// End the client's lifetime.
    ///
    /// For a password session holding a token, calls `auth/logout` once
    /// (no retries). The connection pool is released whether or not the
    /// logout succeeds.
    pub async fn close(self) -> Result<(), Error> {
        let result = match self.auth.take_session().await {
            Some(session) => self.logout(&session.header()?).await,
            None => Ok(()),
        };
        debug!("VRM client closed");
        drop(self);
        result
    }

    async fn logout(&self, header: &HeaderValue) -> Result<(), Error> {
        let url = self.url("auth/logout")?;
        debug!("logging out at {}", url);

        let resp = self
            .http
            .get(url)
            .header(AUTH_HEADER, header.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| Error::Connection {
                attempts: 1,
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Request {
                status: status.as_u16(),
                body,
            });
        }
        debug!("logout complete");
        Ok(())
    }
}

/// Ensure the base URL parses and ends with `/` so relative joins append.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
