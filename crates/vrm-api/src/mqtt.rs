// MQTT hub adapter
//
// Forwards VRM broker settings to a `rumqttc` client. The hub owns the
// session, keep-alive, and topic handling; this module only validates and
// clamps configuration and holds the resulting handle.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, Transport};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default TLS port of the VRM MQTT brokers.
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// Upper bound for the hub's update frequency.
pub const MAX_UPDATE_FREQUENCY_SECS: u16 = 300;

/// Capacity of the request channel between `AsyncClient` and `EventLoop`.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// How much of the installation the hub may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Read and write every supported topic.
    #[default]
    Full,
    /// Subscribe only; never publish writes.
    ReadOnly,
    /// Full access plus topics that are not yet stable.
    Experimental,
}

/// Clamp a requested update frequency into `0..=300` seconds.
pub fn clamp_update_frequency(seconds: i64) -> u16 {
    u16::try_from(seconds.clamp(0, i64::from(MAX_UPDATE_FREQUENCY_SECS)))
        .unwrap_or(MAX_UPDATE_FREQUENCY_SECS)
}

/// Caller-facing broker configuration.
#[derive(Debug, Clone)]
pub struct MqttHubConfig {
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// VRM portal id of the installation (the `N/{id}/...` topic prefix).
    pub installation_id: String,
    pub port: u16,
    pub use_ssl: bool,
    /// Requested refresh interval in seconds; `None` leaves the hub default.
    pub update_frequency: Option<i64>,
    pub operation_mode: OperationMode,
}

impl MqttHubConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        installation_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            installation_id: installation_id.into(),
            port: DEFAULT_MQTT_PORT,
            use_ssl: true,
            update_frequency: None,
            operation_mode: OperationMode::default(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn update_frequency(mut self, seconds: Option<i64>) -> Self {
        self.update_frequency = seconds;
        self
    }

    pub fn operation_mode(mut self, mode: OperationMode) -> Self {
        self.operation_mode = mode;
        self
    }
}

/// Settings as forwarded to the hub, after clamping. Contains no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubSettings {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub username: String,
    pub installation_id: String,
    pub update_frequency_seconds: Option<u16>,
    pub operation_mode: OperationMode,
}

impl From<&MqttHubConfig> for HubSettings {
    fn from(config: &MqttHubConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            use_ssl: config.use_ssl,
            username: config.username.clone(),
            installation_id: config.installation_id.clone(),
            update_frequency_seconds: config.update_frequency.map(clamp_update_frequency),
            operation_mode: config.operation_mode,
        }
    }
}

/// Connection options for the hub.
fn mqtt_options(settings: &HubSettings, password: &SecretString) -> MqttOptions {
    let client_id = format!(
        "vrm-{}-{}",
        settings.installation_id,
        chrono::Utc::now().timestamp_millis()
    );
    let mut options = MqttOptions::new(client_id, settings.host.clone(), settings.port);
    options.set_credentials(settings.username.clone(), password.expose_secret());
    options.set_keep_alive(Duration::from_secs(60));
    if settings.use_ssl {
        options.set_transport(Transport::tls_with_default_config());
    }
    options
}

/// A VRM broker connection: the hub handle plus the settings it was
/// created with.
pub struct VrmMqttClient {
    hub: AsyncClient,
    settings: HubSettings,
}

impl VrmMqttClient {
    /// Create the hub client. Nothing is sent until the returned
    /// [`EventLoop`] is polled.
    pub fn new(config: &MqttHubConfig) -> (Self, EventLoop) {
        let settings = HubSettings::from(config);
        debug!(
            host = %settings.host,
            port = settings.port,
            installation_id = %settings.installation_id,
            update_frequency = ?settings.update_frequency_seconds,
            mode = ?settings.operation_mode,
            "creating VRM MQTT hub client"
        );
        let (hub, event_loop) =
            AsyncClient::new(mqtt_options(&settings, &config.password), REQUEST_CHANNEL_CAPACITY);
        (Self { hub, settings }, event_loop)
    }

    /// The underlying hub client.
    pub fn hub(&self) -> &AsyncClient {
        &self.hub
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    pub fn installation_id(&self) -> &str {
        &self.settings.installation_id
    }

    pub fn update_frequency(&self) -> Option<u16> {
        self.settings.update_frequency_seconds
    }

    pub fn operation_mode(&self) -> OperationMode {
        self.settings.operation_mode
    }
}
