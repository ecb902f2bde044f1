//! Clap derive structures for the `vrm` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vrm -- query Victron Energy installations from the command line
#[derive(Debug, Parser)]
#[command(
    name = "vrm",
    version,
    about = "Query Victron Energy VRM installations from the command line",
    long_about = "A CLI for the Victron Remote Management (VRM) API.\n\n\
        Lists sites and devices, reads measurements, system overview,\n\
        alarms, and diagnostics, and prepares MQTT hub settings.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "VRM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// VRM API root (overrides profile)
    #[arg(long, env = "VRM_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Access token
    #[arg(long, env = "VRM_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Token scheme: Bearer (default) or Token (personal access tokens)
    #[arg(long, env = "VRM_TOKEN_TYPE", global = true)]
    pub token_type: Option<String>,

    /// VRM account e-mail for password login
    #[arg(long, short = 'u', env = "VRM_USERNAME", global = true)]
    pub username: Option<String>,

    /// VRM account password
    #[arg(long, env = "VRM_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Client identifier sent with the login request
    #[arg(long, env = "VRM_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VRM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VRM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Retries for transient failures (0 disables)
    #[arg(long, env = "VRM_MAX_RETRIES", global = true)]
    pub max_retries: Option<u32>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List installations visible to the account
    #[command(alias = "s")]
    Sites,

    /// List devices of an installation
    #[command(alias = "dev", alias = "d")]
    Devices(SiteArg),

    /// Read measurements of a device
    #[command(alias = "m")]
    Measurements(MeasurementsArgs),

    /// Show the newest reading of one measurement type
    Latest(LatestArgs),

    /// Show the system overview (devices with product metadata)
    Overview(SiteArg),

    /// Show configured alarm rules
    Alarms(SiteArg),

    /// Show the latest formatted value of every data attribute
    #[command(alias = "diag")]
    Diagnostics(SiteArg),

    /// Walk through every resource using the public demo account
    Demo(DemoArgs),

    /// Show (and optionally test) MQTT hub settings for an installation
    MqttConfig(MqttConfigArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared argument groups ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SiteArg {
    /// Installation id (idSite)
    pub site_id: i64,
}

#[derive(Debug, Args)]
pub struct MeasurementsArgs {
    /// Installation id (idSite)
    pub site_id: i64,

    /// Device id
    pub device_id: i64,

    /// Only this measurement type (e.g. "soc", "voltage")
    #[arg(long = "type", short = 't')]
    pub kind: Option<String>,

    /// Range start (Unix seconds or RFC3339)
    #[arg(long)]
    pub start: Option<String>,

    /// Range end (Unix seconds or RFC3339)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Installation id (idSite)
    pub site_id: i64,

    /// Device id
    pub device_id: i64,

    /// Measurement type (e.g. "soc")
    #[arg(long = "type", short = 't')]
    pub kind: String,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Installation to inspect (defaults to the first demo site)
    #[arg(long)]
    pub site: Option<i64>,

    /// Measurement type read for the latest-value step
    #[arg(long = "type", short = 't', default_value = "soc")]
    pub kind: String,
}

#[derive(Debug, Args)]
pub struct MqttConfigArgs {
    /// Broker host
    #[arg(long)]
    pub host: String,

    /// Broker username (usually the VRM account e-mail)
    #[arg(long = "mqtt-username")]
    pub mqtt_username: String,

    /// Broker password (only needed with --check)
    #[arg(long, env = "VRM_MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,

    /// VRM portal id of the installation
    #[arg(long)]
    pub installation_id: String,

    /// Broker port
    #[arg(long, default_value = "8883")]
    pub port: u16,

    /// Connect without TLS
    #[arg(long)]
    pub no_ssl: bool,

    /// Requested update frequency in seconds (clamped to 0..=300)
    #[arg(long, allow_negative_numbers = true)]
    pub update_frequency: Option<i64>,

    /// Operation mode
    #[arg(long, default_value = "full")]
    pub mode: OperationModeArg,

    /// Connect to the broker and wait for the CONNACK
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OperationModeArg {
    Full,
    ReadOnly,
    Experimental,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,
    /// Show the effective configuration (secrets redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
