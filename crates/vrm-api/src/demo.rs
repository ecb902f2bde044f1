// Demo account access
//
// VRM exposes a read-only demo account that hands out a bearer token
// without credentials. Useful for trying the client against live data.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::auth::TokenType;
use crate::client::{ClientConfig, VrmClient, normalize_base_url};
use crate::error::Error;
use crate::transport::TransportConfig;

#[derive(Deserialize)]
struct DemoLogin {
    #[serde(default)]
    token: Option<String>,
}

/// Fetch a demo bearer token.
///
/// `GET auth/loginAsDemo`, bounded by `timeout`. Failures surface as
/// [`Error::Authentication`].
pub async fn fetch_demo_token(
    http: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
) -> Result<String, Error> {
    let url = normalize_base_url(base_url)?.join("auth/loginAsDemo")?;
    debug!("requesting demo token at {}", url);

    let resp = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Error::Authentication {
            message: format!("demo login request failed: {e}"),
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("demo login failed (HTTP {status}): {body}"),
        });
    }

    let parsed: DemoLogin = resp.json().await.map_err(|e| Error::Authentication {
        message: format!("unreadable demo login response: {e}"),
    })?;

    parsed
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Authentication {
            message: "demo login response did not contain a token".into(),
        })
}

impl VrmClient {
    /// Build a bearer-token client for the demo account.
    ///
    /// Credentials in `config` must be left empty; the demo token fills
    /// them. Base URL, timeout, retry policy, and HTTP client are kept.
    pub async fn demo(config: ClientConfig) -> Result<Self, Error> {
        if config.token.is_some() || config.username.is_some() || config.password.is_some() {
            return Err(Error::configuration(
                "demo clients obtain their own token; leave credentials empty",
            ));
        }
        if config.request_timeout.is_zero() {
            return Err(Error::configuration("request_timeout must be positive"));
        }

        let http = match config.http.clone() {
            Some(http) => http,
            None => TransportConfig::with_timeout(config.request_timeout).build_client()?,
        };
        let token = fetch_demo_token(&http, &config.base_url, config.request_timeout).await?;

        Self::new(ClientConfig {
            http: Some(http),
            ..ClientConfig::with_token(token, TokenType::Bearer)
                .base_url(config.base_url)
                .request_timeout(config.request_timeout)
                .retry_policy(config.retry)
        })
    }

    /// Demo client against the production API with default settings.
    pub async fn demo_default() -> Result<Self, Error> {
        Self::demo(ClientConfig::default()).await
    }
}
