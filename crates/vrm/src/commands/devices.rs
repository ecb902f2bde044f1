//! Device command handler.

use tabled::Tabled;
use vrm_api::{Device, VrmClient};

use crate::cli::{GlobalOpts, SiteArg};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Site")]
    site_id: i64,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            device_type: output::opt(d.device_type.as_ref()),
            site_id: d.site_id,
        }
    }
}

pub async fn handle(client: &VrmClient, args: SiteArg, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = client.get_devices(args.site_id).await?;
    let out = output::render_list(
        &global.output,
        devices.records(),
        |d| DeviceRow::from(d),
        |d| d.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
