// Device endpoints

use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::mapping;
use crate::models::DeviceList;

impl VrmClient {
    /// Devices reporting within a site. Each carries `site_id` back.
    ///
    /// `GET installations/{site_id}/devices`
    pub async fn get_devices(&self, site_id: i64) -> Result<DeviceList, Error> {
        debug!(site_id, "listing devices");
        let payload = self
            .get_json(&format!("installations/{site_id}/devices"), &[])
            .await?;
        mapping::map_devices(&payload, site_id)
    }
}
