// Response mappers
//
// One pure function per resource kind, turning a decoded JSON body into a
// typed result. Each record type declares its required keys; a record
// missing one (or carrying `null`) fails with `Error::Parse` naming the
// path, e.g. `records[3].idSite`. Optional keys fall back to serde defaults.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::models::{
    Alarm, AlarmReport, Device, DeviceList, DiagnosticsList, DiagnosticsRecord, Measurement,
    MeasurementList, Records, Site, SiteList, SystemOverview, SystemOverviewDevice, User,
};

/// A record type with an explicit table of required keys.
pub(crate) trait Schema: DeserializeOwned {
    /// Wire keys that must be present and non-null. `a|b` accepts
    /// either spelling.
    const REQUIRED: &'static [&'static str];
}

impl Schema for User {
    const REQUIRED: &'static [&'static str] = &["id"];
}

impl Schema for Site {
    const REQUIRED: &'static [&'static str] = &["idSite", "name"];
}

impl Schema for Device {
    const REQUIRED: &'static [&'static str] = &["id|idDevice", "name"];
}

impl Schema for Measurement {
    const REQUIRED: &'static [&'static str] = &["type", "value", "timestamp"];
}

impl Schema for SystemOverviewDevice {
    const REQUIRED: &'static [&'static str] = &["name"];
}

impl Schema for Alarm {
    const REQUIRED: &'static [&'static str] = &["idDataAttribute", "instance"];
}

impl Schema for DiagnosticsRecord {
    const REQUIRED: &'static [&'static str] = &["idDataAttribute", "description"];
}

// ── Building blocks ──────────────────────────────────────────────────

/// Look up a mandatory key on an object.
fn field<'a>(value: &'a Value, key: &str, path: &str) -> Result<&'a Value, Error> {
    let full = join_path(path, key);
    let object = value
        .as_object()
        .ok_or_else(|| Error::parse(path_or_root(path), "expected an object"))?;
    match object.get(key) {
        None | Some(Value::Null) => Err(Error::parse(full, "required field missing")),
        Some(found) => Ok(found),
    }
}

/// Decode one record after checking its required-key table.
fn record<T: Schema>(value: &Value, path: &str) -> Result<T, Error> {
    for required in T::REQUIRED {
        let mut keys = required.split('|');
        let primary = keys.next().unwrap_or(required);
        let found = keys.any(|alt| value.get(alt).is_some_and(|v| !v.is_null()));
        if !found {
            field(value, primary, path)?;
        }
    }
    T::deserialize(value).map_err(|e| Error::parse(path_or_root(path), e.to_string()))
}

/// Decode every element of an array of records.
fn sequence<T: Schema>(value: &Value, path: &str) -> Result<Vec<T>, Error> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::parse(path, "expected an array"))?;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| record(item, &format!("{path}[{idx}]")))
        .collect()
}

/// An array whose elements are kept as raw JSON.
fn raw_sequence(value: &Value, path: &str) -> Result<Vec<Value>, Error> {
    value
        .as_array()
        .cloned()
        .ok_or_else(|| Error::parse(path, "expected an array"))
}

fn records_of<T: Schema>(payload: &Value) -> Result<Records<T>, Error> {
    let items = field(payload, "records", "")?;
    Ok(Records::new(sequence(items, "records")?))
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn path_or_root(path: &str) -> &str {
    if path.is_empty() { "$" } else { path }
}

// ── Mappers ──────────────────────────────────────────────────────────

/// `{"user": {...}}` from `users/me`.
pub fn map_user(payload: &Value) -> Result<User, Error> {
    record(field(payload, "user", "")?, "user")
}

/// `{"records": [site, ...]}`
pub fn map_sites(payload: &Value) -> Result<SiteList, Error> {
    records_of(payload)
}

/// `{"records": [device, ...]}`; each device is tagged with `site_id`.
pub fn map_devices(payload: &Value, site_id: i64) -> Result<DeviceList, Error> {
    let devices = records_of::<Device>(payload)?
        .into_records()
        .into_iter()
        .map(|device| Device { site_id, ..device })
        .collect();
    Ok(Records::new(devices))
}

/// `{"records": [measurement, ...]}`. No client-side filtering.
pub fn map_measurements(payload: &Value) -> Result<MeasurementList, Error> {
    records_of(payload)
}

/// `{"records": {"devices": [device, ...]}}`
pub fn map_system_overview(payload: &Value) -> Result<SystemOverview, Error> {
    let records = field(payload, "records", "")?;
    let devices = field(records, "devices", "records")?;
    Ok(Records::new(sequence(devices, "records.devices")?))
}

/// `{"alarms": [...], "devices": [...], "users": [...], "attributes": [...]}`
pub fn map_alarms(payload: &Value) -> Result<AlarmReport, Error> {
    let alarms = sequence(field(payload, "alarms", "")?, "alarms")?;
    let devices = raw_sequence(field(payload, "devices", "")?, "devices")?;
    let users = raw_sequence(field(payload, "users", "")?, "users")?;
    let attributes = raw_sequence(field(payload, "attributes", "")?, "attributes")?;
    Ok(AlarmReport::new(alarms, devices, users, attributes))
}

/// `{"records": [record, ...]}`. A server-side `num_records` is ignored;
/// `total` is always the number of records actually returned.
pub fn map_diagnostics(payload: &Value) -> Result<DiagnosticsList, Error> {
    records_of(payload)
}

/// The newest measurement of `kind`, or `None` when there is none.
pub fn latest_of_kind(measurements: MeasurementList, kind: &str) -> Option<Measurement> {
    measurements
        .into_iter()
        .filter(|m| m.kind == kind)
        .max_by_key(|m| m.timestamp)
}
