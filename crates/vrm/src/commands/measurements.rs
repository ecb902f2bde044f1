//! Measurement command handlers.

use chrono::{DateTime, Utc};
use tabled::Tabled;
use vrm_api::{Measurement, VrmClient};

use crate::cli::{GlobalOpts, LatestArgs, MeasurementsArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct MeasurementRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Value")]
    value: f64,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
}

impl From<&Measurement> for MeasurementRow {
    fn from(m: &Measurement) -> Self {
        Self {
            kind: m.kind.clone(),
            value: m.value,
            unit: output::opt(m.unit.as_ref()),
            timestamp: m.timestamp.to_rfc3339(),
        }
    }
}

fn parse_time(value: &str, field: &str) -> Result<DateTime<Utc>, CliError> {
    let invalid = || CliError::Validation {
        field: field.into(),
        reason: format!("invalid timestamp '{value}' (use Unix seconds or RFC3339)"),
    };
    if let Ok(ts) = value.parse::<i64>() {
        return DateTime::from_timestamp(ts, 0).ok_or_else(invalid);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid())
}

fn parse_time_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), CliError> {
    let start_ts = start.map(|s| parse_time(s, "start")).transpose()?;
    let end_ts = end.map(|s| parse_time(s, "end")).transpose()?;
    if let (Some(s), Some(e)) = (start_ts, end_ts) {
        if s > e {
            return Err(CliError::Validation {
                field: "start".into(),
                reason: "start must be <= end".into(),
            });
        }
    }
    Ok((start_ts, end_ts))
}

pub async fn handle(
    client: &VrmClient,
    args: MeasurementsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (start, end) = parse_time_range(args.start.as_deref(), args.end.as_deref())?;
    let measurements = match args.kind {
        Some(ref kind) => {
            client
                .get_measurements_of_type(args.site_id, args.device_id, kind, start, end)
                .await?
        }
        None => {
            client
                .get_measurements(args.site_id, args.device_id, start, end)
                .await?
        }
    };

    let out = output::render_list(
        &global.output,
        measurements.records(),
        |m| MeasurementRow::from(m),
        |m| format!("{}\t{}", m.timestamp.timestamp(), m.value),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_latest(
    client: &VrmClient,
    args: LatestArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let Some(latest) = client
        .get_latest_measurement(args.site_id, args.device_id, &args.kind)
        .await?
    else {
        if !global.quiet {
            eprintln!("No '{}' readings for device {}", args.kind, args.device_id);
        }
        return Ok(());
    };

    let out = output::render_single(
        &global.output,
        &latest,
        |m| {
            output::detail_lines(&[
                ("type", m.kind.clone()),
                ("value", m.value.to_string()),
                ("unit", output::opt(m.unit.as_ref())),
                ("timestamp", m.timestamp.to_rfc3339()),
            ])
        },
        |m| m.value.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
