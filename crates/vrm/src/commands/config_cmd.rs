//! Config subcommand handlers.

use dialoguer::{Input, Select};
use vrm_config::{Config, Profile, SecretKind};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Ask where a secret should live; returns it back when it belongs in
/// the config file.
fn store_secret(
    profile_name: &str,
    kind: SecretKind,
    label: &str,
    secret: String,
) -> Result<Option<String>, CliError> {
    let store_choices = &["Store in system keyring (recommended)", "Save to config file (plaintext)"];
    let store_selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if store_selection == 0 {
        vrm_config::store_secret(profile_name, kind, &secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

fn prompt_token_profile(profile_name: &str) -> Result<Profile, CliError> {
    let token = rpassword::prompt_password("Access token: ").map_err(prompt_err)?;
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }

    let type_choices = &["Token (personal access token)", "Bearer (login or demo JWT)"];
    let type_selection = Select::new()
        .with_prompt("Token type")
        .items(type_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let token_type = if type_selection == 0 { "Token" } else { "Bearer" };

    Ok(Profile {
        auth_mode: "token".into(),
        token: store_secret(profile_name, SecretKind::Token, "token", token)?,
        token_type: Some(token_type.into()),
        ..Profile::default()
    })
}

fn prompt_password_profile(profile_name: &str) -> Result<Profile, CliError> {
    let username: String = Input::new()
        .with_prompt("VRM e-mail")
        .interact_text()
        .map_err(prompt_err)?;
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if username.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    let client_id: String = Input::new()
        .with_prompt("Client id (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    Ok(Profile {
        auth_mode: "password".into(),
        username: Some(username),
        password: store_secret(profile_name, SecretKind::Password, "password", password)?,
        client_id: (!client_id.is_empty()).then_some(client_id),
        ..Profile::default()
    })
}

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(REDACTED.into());
        }
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("VRM CLI configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let auth_choices = &["Access token (recommended)", "Username/Password"];
            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let profile = if auth_selection == 0 {
                prompt_token_profile(&profile_name)?
            } else {
                prompt_password_profile(&profile_name)?
            };

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            let written = config::save_config(&cfg)?;
            eprintln!("\n✓ Configuration written to {}", written.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: vrm sites --profile {profile_name}");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable config: {e}>")),
                |_| config::config_path().display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
