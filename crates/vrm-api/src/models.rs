// VRM resource models
//
// Typed records returned by the resource methods. Optional fields default
// to `None`; undocumented fields land in `extra` so nothing the server
// sends is lost. Result containers are read-only: `total` is fixed to the
// length of the sequence at construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Result containers ────────────────────────────────────────────────

/// A typed list of records from one response, plus its count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Records<T> {
    records: Vec<T>,
    total: usize,
}

impl<T> Records<T> {
    pub fn new(records: Vec<T>) -> Self {
        let total = records.len();
        Self { records, total }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Number of records in this response.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

impl<T> IntoIterator for Records<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Records<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

pub type SiteList = Records<Site>;
pub type DeviceList = Records<Device>;
pub type MeasurementList = Records<Measurement>;
pub type SystemOverview = Records<SystemOverviewDevice>;
pub type DiagnosticsList = Records<DiagnosticsRecord>;

/// The four parallel sequences returned by the alarms endpoint.
///
/// `devices`, `users` and `attributes` are reference tables for the
/// alarms and vary in shape between firmware versions, so they are kept
/// as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmReport {
    alarms: Vec<Alarm>,
    devices: Vec<serde_json::Value>,
    users: Vec<serde_json::Value>,
    attributes: Vec<serde_json::Value>,
    total: usize,
}

impl AlarmReport {
    pub fn new(
        alarms: Vec<Alarm>,
        devices: Vec<serde_json::Value>,
        users: Vec<serde_json::Value>,
        attributes: Vec<serde_json::Value>,
    ) -> Self {
        let total = alarms.len();
        Self {
            alarms,
            devices,
            users,
            attributes,
            total,
        }
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn devices(&self) -> &[serde_json::Value] {
        &self.devices
    }

    pub fn users(&self) -> &[serde_json::Value] {
        &self.users
    }

    pub fn attributes(&self) -> &[serde_json::Value] {
        &self.attributes
    }

    /// Number of alarms (the primary sequence).
    pub fn total(&self) -> usize {
        self.total
    }
}

// ── User ─────────────────────────────────────────────────────────────

/// The authenticated user, from `users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Site ─────────────────────────────────────────────────────────────

/// A monitored installation, from `users/{id}/installations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(rename = "idSite")]
    pub id: i64,
    pub name: String,
    /// Portal identifier (usually the GX device's VRM id).
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default, rename = "idUser")]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub access_level: Option<i64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Device ───────────────────────────────────────────────────────────

/// A device reporting data within a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(alias = "idDevice")]
    pub id: i64,
    /// Site the device was listed under. Filled from the request, not the body.
    #[serde(default, skip_deserializing)]
    pub site_id: i64,
    pub name: String,
    #[serde(default)]
    pub device_type: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Measurement ──────────────────────────────────────────────────────

/// One typed, timestamped reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

// ── System overview ──────────────────────────────────────────────────

/// A device as listed by `installations/{id}/system-overview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemOverviewDevice {
    pub name: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub last_connection: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instance: Option<i64>,
    #[serde(default)]
    pub class: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Alarm ────────────────────────────────────────────────────────────

/// An alarm rule on one data attribute of one device instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    #[serde(rename = "idDataAttribute")]
    pub data_attribute_id: i64,
    pub instance: i64,
    #[serde(default)]
    pub low_alarm: Option<f64>,
    #[serde(default)]
    pub high_alarm: Option<f64>,
    #[serde(default)]
    pub low_alarm_hysteresis: Option<f64>,
    #[serde(default)]
    pub high_alarm_hysteresis: Option<f64>,
    #[serde(default)]
    pub notify_after_seconds: Option<i64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Diagnostics ──────────────────────────────────────────────────────

/// A formatted, human-readable status value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsRecord {
    #[serde(rename = "idDataAttribute")]
    pub data_attribute_id: i64,
    pub description: String,
    #[serde(default)]
    pub formatted_value: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "Device")]
    pub device: Option<String>,
    #[serde(default)]
    pub instance: Option<i64>,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dbus_path: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Timestamps ───────────────────────────────────────────────────────

/// VRM sends Unix seconds (integer or fractional) in most places and
/// RFC 3339 strings in a few. Serialized back out as RFC 3339.
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(i64),
        Fractional(f64),
        Text(String),
    }

    fn convert<E: serde::de::Error>(raw: Raw) -> Result<DateTime<Utc>, E> {
        match raw {
            Raw::Seconds(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| E::custom(format!("timestamp {secs} out of range"))),
            Raw::Fractional(secs) => {
                #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
                let millis = (secs * 1000.0).round() as i64;
                DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| E::custom(format!("timestamp {secs} out of range")))
            }
            Raw::Text(text) => {
                if let Ok(secs) = text.parse::<i64>() {
                    return convert(Raw::Seconds(secs));
                }
                DateTime::parse_from_rfc3339(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| E::custom(format!("invalid timestamp '{text}': {e}")))
            }
        }
    }

    pub(crate) fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        convert(Raw::deserialize(deserializer)?)
    }

    pub(crate) mod option {
        use super::{DateTime, Deserialize, Deserializer, Raw, Serialize, Serializer, Utc, convert};

        pub(crate) fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.serialize(serializer)
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<Raw>::deserialize(deserializer)?
                .map(convert)
                .transpose()
        }
    }

}
