// Installation-level endpoints
//
// System overview, alarms, and diagnostics are all scoped to one site.

use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::mapping;
use crate::models::{AlarmReport, DiagnosticsList, SystemOverview};

/// Upper bound on diagnostics records requested in one call.
const DIAGNOSTICS_COUNT: u32 = 1000;

impl VrmClient {
    /// All devices of a site with their product metadata.
    ///
    /// `GET installations/{site_id}/system-overview`
    pub async fn get_system_overview(&self, site_id: i64) -> Result<SystemOverview, Error> {
        debug!(site_id, "fetching system overview");
        let payload = self
            .get_json(&format!("installations/{site_id}/system-overview"), &[])
            .await?;
        mapping::map_system_overview(&payload)
    }

    /// Alarm rules plus the device, user, and attribute tables they refer to.
    ///
    /// `GET installations/{site_id}/alarms`
    pub async fn get_alarms(&self, site_id: i64) -> Result<AlarmReport, Error> {
        debug!(site_id, "fetching alarms");
        let payload = self
            .get_json(&format!("installations/{site_id}/alarms"), &[])
            .await?;
        mapping::map_alarms(&payload)
    }

    /// Latest formatted value of every data attribute on the site.
    ///
    /// `GET installations/{site_id}/diagnostics?count=1000`
    pub async fn get_diagnostics(&self, site_id: i64) -> Result<DiagnosticsList, Error> {
        debug!(site_id, "fetching diagnostics");
        let payload = self
            .get_json(
                &format!("installations/{site_id}/diagnostics"),
                &[("count", DIAGNOSTICS_COUNT.to_string())],
            )
            .await?;
        mapping::map_diagnostics(&payload)
    }
}
