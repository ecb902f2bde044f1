//! MQTT hub settings handler.

use std::time::Duration;

use rumqttc::{Event, EventLoop, Outgoing, Packet};
use secrecy::SecretString;
use tracing::{debug, info, warn};
use vrm_api::{HubSettings, MqttHubConfig, OperationMode, VrmMqttClient};

use crate::cli::{GlobalOpts, MqttConfigArgs, OperationModeArg};
use crate::error::CliError;
use crate::output;

/// Time allowed for the broker's CONNACK when `--timeout` is not given.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

impl From<OperationModeArg> for OperationMode {
    fn from(mode: OperationModeArg) -> Self {
        match mode {
            OperationModeArg::Full => Self::Full,
            OperationModeArg::ReadOnly => Self::ReadOnly,
            OperationModeArg::Experimental => Self::Experimental,
        }
    }
}

fn hub_config(args: &MqttConfigArgs) -> MqttHubConfig {
    let password = SecretString::from(args.mqtt_password.clone().unwrap_or_default());
    MqttHubConfig::new(
        args.host.clone(),
        args.mqtt_username.clone(),
        password,
        args.installation_id.clone(),
    )
    .port(args.port)
    .use_ssl(!args.no_ssl)
    .update_frequency(args.update_frequency)
    .operation_mode(args.mode.clone().into())
}

fn render_settings(settings: &HubSettings) -> String {
    output::detail_lines(&[
        ("host", settings.host.clone()),
        ("port", settings.port.to_string()),
        ("use_ssl", settings.use_ssl.to_string()),
        ("username", settings.username.clone()),
        ("installation_id", settings.installation_id.clone()),
        (
            "update_frequency",
            settings
                .update_frequency_seconds
                .map_or_else(|| "(hub default)".into(), |s| format!("{s}s")),
        ),
        ("operation_mode", format!("{:?}", settings.operation_mode)),
    ])
}

/// Poll the event loop until the broker acknowledges the connection.
async fn wait_for_connack(event_loop: &mut EventLoop, host: &str, timeout: Duration) -> Result<(), CliError> {
    let waited = tokio::time::timeout(timeout, async {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    debug!(code = ?ack.code, "CONNACK received");
                    return Ok(());
                }
                Ok(event) => debug!(?event, "MQTT event"),
                Err(e) => {
                    return Err(CliError::MqttConnection {
                        host: host.into(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    })
    .await;

    waited.unwrap_or_else(|_| {
        Err(CliError::MqttConnection {
            host: host.into(),
            reason: format!("no CONNACK within {}s", timeout.as_secs()),
        })
    })
}

/// Queue a DISCONNECT and drive the event loop until it is written.
async fn disconnect(client: &VrmMqttClient, event_loop: &mut EventLoop, timeout: Duration) {
    if let Err(e) = client.hub().disconnect().await {
        warn!(error = %e, "could not queue MQTT disconnect");
        return;
    }
    let flushed = tokio::time::timeout(timeout, async {
        loop {
            match event_loop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                Ok(event) => debug!(?event, "MQTT event"),
                Err(e) => return Err(e),
            }
        }
    })
    .await;

    match flushed {
        Ok(Ok(())) => debug!("MQTT disconnect sent"),
        Ok(Err(e)) => warn!(error = %e, "MQTT disconnect failed"),
        Err(_) => warn!("MQTT disconnect not sent within {}s", timeout.as_secs()),
    }
}

pub async fn handle(args: MqttConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.check && args.mqtt_password.is_none() {
        return Err(CliError::Validation {
            field: "mqtt-password".into(),
            reason: "required with --check".into(),
        });
    }
    let config = hub_config(&args);
    let settings = HubSettings::from(&config);

    let out = output::render_single(&global.output, &settings, render_settings, |s| {
        format!("{}:{}", s.host, s.port)
    });
    output::print_output(&out, global.quiet);

    if args.check {
        let (client, mut event_loop) = VrmMqttClient::new(&config);
        let timeout = Duration::from_secs(global.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS));
        wait_for_connack(&mut event_loop, &settings.host, timeout).await?;
        info!(host = %settings.host, "MQTT broker accepted the connection");
        if !global.quiet {
            eprintln!("✓ Connected to {}:{}", settings.host, settings.port);
        }
        disconnect(&client, &mut event_loop, timeout).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::cli::{Cli, Command};

    fn parse(args: &[&str]) -> MqttConfigArgs {
        let mut argv = vec!["vrm", "mqtt-config"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).map(|cli| cli.command) {
            Ok(Command::MqttConfig(args)) => args,
            other => panic!("expected mqtt-config, got: {other:?}"),
        }
    }

    #[test]
    fn defaults_to_tls_on_8883() {
        let args = parse(&["--host", "h", "--mqtt-username", "u", "--installation-id", "abc"]);
        let settings = HubSettings::from(&hub_config(&args));
        assert_eq!(settings.port, 8883);
        assert!(settings.use_ssl);
        assert_eq!(settings.operation_mode, OperationMode::Full);
        assert_eq!(settings.update_frequency_seconds, None);
    }

    #[test]
    fn negative_frequency_is_clamped() {
        let args = parse(&[
            "--host",
            "h",
            "--mqtt-username",
            "u",
            "--installation-id",
            "abc",
            "--update-frequency",
            "-5",
            "--mode",
            "read-only",
            "--no-ssl",
        ]);
        let settings = HubSettings::from(&hub_config(&args));
        assert_eq!(settings.update_frequency_seconds, Some(0));
        assert_eq!(settings.operation_mode, OperationMode::ReadOnly);
        assert!(!settings.use_ssl);
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn check_sends_disconnect_after_connack() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        let broker = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = sock.read(&mut buf).await.unwrap();
            assert!(n > 0 && buf[0] == 0x10, "expected CONNECT");
            sock.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();

            let mut after_connack = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                after_connack.extend_from_slice(&buf[..n]);
                if after_connack.first() == Some(&0xE0) {
                    break;
                }
            }
            after_connack
        });

        let cli = Cli::try_parse_from([
            "vrm",
            "-q",
            "--timeout",
            "5",
            "mqtt-config",
            "--host",
            "127.0.0.1",
            "--port",
            port.as_str(),
            "--no-ssl",
            "--mqtt-username",
            "u",
            "--mqtt-password",
            "p",
            "--installation-id",
            "abc",
            "--check",
        ])
        .unwrap();
        let Command::MqttConfig(args) = cli.command else {
            panic!("expected mqtt-config");
        };

        handle(args, &cli.global).await.unwrap();
        let after_connack = tokio::time::timeout(Duration::from_secs(5), broker)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_connack.first(), Some(&0xE0));
    }
}
