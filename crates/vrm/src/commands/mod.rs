//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod config_cmd;
pub mod demo;
pub mod devices;
pub mod installation;
pub mod measurements;
pub mod mqtt;
pub mod sites;

use vrm_api::VrmClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &VrmClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Sites => sites::handle(client, global).await,
        Command::Devices(args) => devices::handle(client, args, global).await,
        Command::Measurements(args) => measurements::handle(client, args, global).await,
        Command::Latest(args) => measurements::handle_latest(client, args, global).await,
        Command::Overview(args) => installation::handle_overview(client, args, global).await,
        Command::Alarms(args) => installation::handle_alarms(client, args, global).await,
        Command::Diagnostics(args) => installation::handle_diagnostics(client, args, global).await,
        // main routes these before a client is built
        Command::Demo(_) | Command::MqttConfig(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Validation {
                field: "command".into(),
                reason: "does not run against an account session".into(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use vrm_api::{ClientConfig, TokenType};

    use super::*;
    use crate::cli::Cli;

    #[tokio::test]
    async fn sessionless_commands_are_refused() {
        let cli = Cli::try_parse_from(["vrm", "completions", "bash"]).unwrap();
        let client = VrmClient::new(ClientConfig::with_token("t", TokenType::Bearer)).unwrap();
        let result = dispatch(cli.command, &client, &cli.global).await;
        assert!(matches!(result, Err(CliError::Validation { ref field, .. }) if field == "command"));
    }
}
