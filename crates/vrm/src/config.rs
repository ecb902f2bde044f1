//! CLI-side configuration: layers global flags over the active profile
//! to produce a `vrm_api::ClientConfig`.

use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use vrm_api::{ClientConfig, RetryPolicy, TokenType};
use vrm_config::{Config, Defaults};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vrm_config::{config_path, load_config_or_default, save_config};

/// Profile selected by `--profile`, else the config's default, else "default".
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn parse_token_type(raw: Option<&str>) -> Result<Option<TokenType>, CliError> {
    raw.map(str::parse::<TokenType>)
        .transpose()
        .map_err(|e| CliError::Validation {
            field: "token-type".into(),
            reason: e.to_string(),
        })
}

/// Credentials given directly on the command line (or via `VRM_*` env),
/// if any. These win over anything stored in a profile.
///
/// Every credential flag that was given is carried over as-is, so a
/// token mixed with username/password, or a username without a password,
/// is rejected by `VrmClient::new` instead of being silently dropped.
fn credentials_from_flags(global: &GlobalOpts) -> Result<Option<ClientConfig>, CliError> {
    let any_given = global.token.is_some()
        || global.username.is_some()
        || global.password.is_some()
        || global.client_id.is_some();
    if !any_given {
        return Ok(None);
    }
    Ok(Some(ClientConfig {
        token: global.token.clone().map(SecretString::from),
        token_type: parse_token_type(global.token_type.as_deref())?,
        username: global.username.clone(),
        password: global.password.clone().map(SecretString::from),
        client_id: global.client_id.clone(),
        ..ClientConfig::default()
    }))
}

/// Timeout and retry count from the `[defaults]` table.
fn with_defaults(config: ClientConfig, defaults: &Defaults) -> ClientConfig {
    ClientConfig {
        request_timeout: Duration::from_secs(defaults.timeout),
        retry: RetryPolicy {
            max_retries: defaults.max_retries,
            ..RetryPolicy::default()
        },
        ..config
    }
}

/// Apply `--base-url`, `--timeout`, and `--max-retries` on top of `config`.
fn apply_overrides(mut config: ClientConfig, global: &GlobalOpts) -> ClientConfig {
    if let Some(ref base_url) = global.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(timeout) = global.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(max_retries) = global.max_retries {
        config.retry.max_retries = max_retries;
    }
    config
}

/// Build a `ClientConfig` from flags, the active profile, and defaults.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(config) = credentials_from_flags(global)? {
        debug!("using credentials from command line");
        return Ok(apply_overrides(with_defaults(config, &cfg.defaults), global));
    }

    match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            debug!(profile = %profile_name, "using profile credentials");
            let config = vrm_config::profile_to_client_config(profile, &profile_name, &cfg.defaults)?;
            Ok(apply_overrides(config, global))
        }
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            })
        }
        None => Err(CliError::NoCredentials {
            profile: profile_name,
        }),
    }
}

/// Connection settings without credentials, for the demo account.
pub fn build_demo_config(global: &GlobalOpts) -> ClientConfig {
    let cfg = load_config_or_default();
    apply_overrides(with_defaults(ClientConfig::default(), &cfg.defaults), global)
}
