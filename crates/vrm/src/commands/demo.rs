//! Demo walk-through.
//!
//! Logs in to the public demo account and calls every resource once. A
//! failing step is logged and recorded; the walk-through continues with
//! whatever the earlier steps produced.

use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};
use vrm_api::VrmClient;

use crate::cli::{DemoArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize, Tabled)]
struct DemoStep {
    #[tabled(rename = "Resource")]
    resource: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Result")]
    detail: String,
}

fn record<T>(
    steps: &mut Vec<DemoStep>,
    resource: &'static str,
    result: Result<T, vrm_api::Error>,
    describe: impl Fn(&T) -> String,
) -> Option<T> {
    match result {
        Ok(value) => {
            let detail = describe(&value);
            info!(resource, %detail, "demo step succeeded");
            steps.push(DemoStep {
                resource,
                status: "ok",
                detail,
            });
            Some(value)
        }
        Err(err) => {
            warn!(resource, error = %err, "demo step failed, continuing");
            steps.push(DemoStep {
                resource,
                status: "error",
                detail: err.to_string(),
            });
            None
        }
    }
}

async fn walk(client: &VrmClient, args: &DemoArgs) -> Vec<DemoStep> {
    let mut steps = Vec::new();

    let sites = record(&mut steps, "sites", client.get_sites().await, |s| {
        format!("{} site(s)", s.total())
    });
    let site_id = args
        .site
        .or_else(|| sites.as_ref().and_then(|s| s.records().first()).map(|s| s.id));
    let Some(site_id) = site_id else {
        warn!("no demo site available, skipping site resources");
        return steps;
    };

    let devices = record(
        &mut steps,
        "devices",
        client.get_devices(site_id).await,
        |d| format!("{} device(s) on site {site_id}", d.total()),
    );
    record(
        &mut steps,
        "system overview",
        client.get_system_overview(site_id).await,
        |o| format!("{} device(s)", o.total()),
    );
    record(&mut steps, "alarms", client.get_alarms(site_id).await, |a| {
        format!("{} alarm(s)", a.total())
    });
    record(
        &mut steps,
        "diagnostics",
        client.get_diagnostics(site_id).await,
        |d| format!("{} record(s)", d.total()),
    );

    let Some(device_id) = devices
        .as_ref()
        .and_then(|d| d.records().first())
        .map(|d| d.id)
    else {
        warn!(site_id, "no demo device available, skipping measurements");
        return steps;
    };

    record(
        &mut steps,
        "measurements",
        client.get_measurements(site_id, device_id, None, None).await,
        |m| format!("{} reading(s) from device {device_id}", m.total()),
    );
    record(
        &mut steps,
        "latest measurement",
        client
            .get_latest_measurement(site_id, device_id, &args.kind)
            .await,
        |m| match m {
            Some(m) => format!(
                "{} = {}{} at {}",
                m.kind,
                m.value,
                m.unit.as_deref().unwrap_or(""),
                m.timestamp.to_rfc3339()
            ),
            None => format!("no '{}' readings", args.kind),
        },
    );

    steps
}

pub async fn handle(args: DemoArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = VrmClient::demo(config::build_demo_config(global)).await?;
    let steps = walk(&client, &args).await;
    if let Err(err) = client.close().await {
        warn!(error = %err, "closing demo client failed");
    }

    let out = output::render_list(
        &global.output,
        &steps,
        |s| DemoStep {
            resource: s.resource,
            status: s.status,
            detail: s.detail.clone(),
        },
        |s| format!("{}\t{}", s.resource, s.status),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
