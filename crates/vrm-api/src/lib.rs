// vrm-api: Async Rust client for the Victron Energy VRM monitoring API

pub mod auth;
pub mod client;
pub mod demo;
pub mod error;
pub mod mapping;
pub mod models;
pub mod mqtt;
mod resources;
pub mod retry;
pub mod transport;

pub use auth::{AuthStrategy, TokenType};
pub use client::{ClientConfig, DEFAULT_BASE_URL, RawResponse, VrmClient};
pub use demo::fetch_demo_token;
pub use error::Error;
pub use models::{
    Alarm, AlarmReport, Device, DeviceList, DiagnosticsList, DiagnosticsRecord, Measurement,
    MeasurementList, Records, Site, SiteList, SystemOverview, SystemOverviewDevice, User,
};
pub use mqtt::{HubSettings, MqttHubConfig, OperationMode, VrmMqttClient, clamp_update_frequency};
pub use retry::RetryPolicy;
pub use transport::TransportConfig;
