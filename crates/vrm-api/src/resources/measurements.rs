// Measurement endpoints
//
// Time range and type filtering happen server-side via query parameters;
// the mapper returns whatever the server sent. `get_latest_measurement`
// is a client-side reduction over a type-filtered fetch.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::mapping;
use crate::models::{Measurement, MeasurementList};

fn measurement_query(
    kind: Option<&str>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(kind) = kind {
        query.push(("type", kind.to_owned()));
    }
    if let Some(start) = start {
        query.push(("start", start.timestamp().to_string()));
    }
    if let Some(end) = end {
        query.push(("end", end.timestamp().to_string()));
    }
    query
}

impl VrmClient {
    /// Readings for one device, optionally bounded in time.
    ///
    /// `GET installations/{site_id}/devices/{device_id}/measurements?start=&end=`
    /// (Unix seconds)
    pub async fn get_measurements(
        &self,
        site_id: i64,
        device_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<MeasurementList, Error> {
        self.fetch_measurements(site_id, device_id, None, start, end)
            .await
    }

    /// Readings of a single type for one device.
    ///
    /// Same endpoint as [`get_measurements`](Self::get_measurements) with
    /// `type={kind}` added.
    pub async fn get_measurements_of_type(
        &self,
        site_id: i64,
        device_id: i64,
        kind: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<MeasurementList, Error> {
        self.fetch_measurements(site_id, device_id, Some(kind), start, end)
            .await
    }

    /// The newest reading of `kind`, or `None` if the device has none.
    pub async fn get_latest_measurement(
        &self,
        site_id: i64,
        device_id: i64,
        kind: &str,
    ) -> Result<Option<Measurement>, Error> {
        let measurements = self
            .get_measurements_of_type(site_id, device_id, kind, None, None)
            .await?;
        Ok(mapping::latest_of_kind(measurements, kind))
    }

    async fn fetch_measurements(
        &self,
        site_id: i64,
        device_id: i64,
        kind: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<MeasurementList, Error> {
        debug!(site_id, device_id, ?kind, ?start, ?end, "fetching measurements");
        let query = measurement_query(kind, start, end);
        let payload = self
            .get_json(
                &format!("installations/{site_id}/devices/{device_id}/measurements"),
                &query,
            )
            .await?;
        mapping::map_measurements(&payload)
    }
}
