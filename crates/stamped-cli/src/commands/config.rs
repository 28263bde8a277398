//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use stamped_core::{Config, DocumentKind};

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`
const VALID_KEYS: &str = "data_dir, export_dir, autosave_delay_secs, terminator, document_kind, \
                          storage_quota_bytes, analytics_enabled, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "export_dir": config.export_dir,
                    "autosave_delay_secs": config.autosave_delay_secs,
                    "terminator": config.terminator,
                    "document_kind": config.document_kind,
                    "storage_quota_bytes": config.storage_quota_bytes,
                    "analytics_enabled": config.analytics_enabled,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!(
                "  export_dir:          {}",
                config
                    .export_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(current directory)".to_string())
            );
            println!("  autosave_delay_secs: {}", config.autosave_delay_secs);
            println!("  terminator:          {}", config.terminator);
            println!("  document_kind:       {}", config.document_kind);
            println!(
                "  storage_quota_bytes: {}",
                config
                    .storage_quota_bytes
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "(unlimited)".to_string())
            );
            println!("  analytics_enabled:   {}", config.analytics_enabled);
            println!(
                "  log_file:            {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one `key = value` change
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let unset = value.is_empty() || value == "none";

    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "export_dir" => {
            config.export_dir = if unset { None } else { Some(value.into()) };
        }
        "autosave_delay_secs" => {
            config.autosave_delay_secs = value
                .parse()
                .context("Invalid value for autosave_delay_secs. Use a whole number of seconds.")?;
        }
        "terminator" => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => config.terminator = c,
                _ => bail!("Invalid value for terminator. Use exactly one character."),
            }
        }
        "document_kind" => {
            config.document_kind = value
                .parse::<DocumentKind>()
                .map_err(|e| anyhow::anyhow!("Invalid value for document_kind: {}", e))?;
        }
        "storage_quota_bytes" => {
            config.storage_quota_bytes = if unset {
                None
            } else {
                Some(
                    value
                        .parse()
                        .context("Invalid value for storage_quota_bytes. Use a byte count.")?,
                )
            };
        }
        "analytics_enabled" => {
            config.analytics_enabled = value
                .parse()
                .context("Invalid value for analytics_enabled. Use 'true' or 'false'.")?;
        }
        "log_file" => {
            config.log_file = if unset { None } else { Some(value.into()) };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }

    Ok(())
}
