//! System overview, alarm, and diagnostics handlers.

use tabled::Tabled;
use vrm_api::{Alarm, DiagnosticsRecord, SystemOverviewDevice, VrmClient};

use crate::cli::{GlobalOpts, SiteArg};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct OverviewRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Instance")]
    instance: String,
    #[tabled(rename = "Last Seen")]
    last_connection: String,
}

impl From<&SystemOverviewDevice> for OverviewRow {
    fn from(d: &SystemOverviewDevice) -> Self {
        Self {
            name: d.name.clone(),
            product: output::opt(d.product_name.as_ref()),
            firmware: output::opt(d.firmware_version.as_ref()),
            instance: output::opt(d.instance.as_ref()),
            last_connection: d
                .last_connection
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct AlarmRow {
    #[tabled(rename = "Attribute")]
    attribute: i64,
    #[tabled(rename = "Instance")]
    instance: i64,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Notify After (s)")]
    notify_after: String,
}

impl From<&Alarm> for AlarmRow {
    fn from(a: &Alarm) -> Self {
        Self {
            attribute: a.data_attribute_id,
            instance: a.instance,
            low: output::opt(a.low_alarm.as_ref()),
            high: output::opt(a.high_alarm.as_ref()),
            notify_after: output::opt(a.notify_after_seconds.as_ref()),
        }
    }
}

#[derive(Tabled)]
struct DiagnosticsRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Device")]
    device: String,
}

impl From<&DiagnosticsRecord> for DiagnosticsRow {
    fn from(r: &DiagnosticsRecord) -> Self {
        Self {
            code: output::opt(r.code.as_ref()),
            description: r.description.clone(),
            value: output::opt(r.formatted_value.as_ref()),
            device: output::opt(r.device.as_ref()),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_overview(
    client: &VrmClient,
    args: SiteArg,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let overview = client.get_system_overview(args.site_id).await?;
    let out = output::render_list(
        &global.output,
        overview.records(),
        |d| OverviewRow::from(d),
        |d| d.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Lists alarm rules; the device, user, and attribute tables are not printed.
pub async fn handle_alarms(
    client: &VrmClient,
    args: SiteArg,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let report = client.get_alarms(args.site_id).await?;
    let out = output::render_list(
        &global.output,
        report.alarms(),
        |a| AlarmRow::from(a),
        |a| a.data_attribute_id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_diagnostics(
    client: &VrmClient,
    args: SiteArg,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let diagnostics = client.get_diagnostics(args.site_id).await?;
    let out = output::render_list(
        &global.output,
        diagnostics.records(),
        |r| DiagnosticsRow::from(r),
        |r| {
            format!(
                "{}\t{}",
                r.code.as_deref().unwrap_or("-"),
                r.formatted_value.as_deref().unwrap_or("")
            )
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
