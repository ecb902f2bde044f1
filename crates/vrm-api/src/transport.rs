// Transport configuration for building the reqwest::Client.
//
// The client either owns a connection pool built here or borrows a
// caller-supplied `reqwest::Client`; both paths end up in `VrmClient`.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

/// User agent sent on every request.
pub const USER_AGENT: &str = concat!("vrm-api/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout applied by the connection pool.
    pub timeout: Duration,
    /// Timeout for establishing a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Headers attached to every request built from this client.
    pub default_headers: HeaderMap,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_headers: HeaderMap::new(),
        }
    }
}

impl TransportConfig {
    /// Config with the given request timeout and default connect timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(10)),
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .default_headers(self.default_headers.clone())
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))
    }
}
