//! Runs one CLI command against an essentials data directory.
//!
//! Commands return their output as lines instead of printing, so `main`
//! owns stdout and tests can inspect the result.

use crate::cli::{CliArgs, CliCommand, HomeCommand, HubCommand, WarpCommand};
use anyhow::{anyhow, bail, Context};
use plugin_essentials::{EssentialsConfig, EssentialsPlugin, LocationRecord};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loads the configuration file and applies command-line overrides.
///
/// A missing configuration file is created with defaults.
pub fn load_config(args: &CliArgs) -> anyhow::Result<EssentialsConfig> {
    let mut config = EssentialsConfig::load_from_file(&args.config_path)
        .with_context(|| format!("failed to load {}", args.config_path.display()))?;

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.to_string_lossy().to_string();
    }

    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration in {}: {}", args.config_path.display(), e))?;
    Ok(config)
}

/// Data directory for `config`; relative paths are taken from the config file's directory.
pub fn resolve_data_dir(args: &CliArgs, config: &EssentialsConfig) -> PathBuf {
    if let Some(dir) = &args.data_dir {
        return dir.clone();
    }
    let base = args
        .config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.data_dir(base)
}

pub fn run(args: &CliArgs, config: EssentialsConfig) -> anyhow::Result<Vec<String>> {
    let data_dir = resolve_data_dir(args, &config);
    let plugin = EssentialsPlugin::enable(config, &data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;

    let output = execute(&plugin, &args.command);
    plugin.disable();
    output
}

fn execute(plugin: &EssentialsPlugin, command: &CliCommand) -> anyhow::Result<Vec<String>> {
    match command {
        CliCommand::Check => Ok(check(plugin)),
        CliCommand::Warp(command) => {
            let warps = plugin
                .warps()
                .ok_or_else(|| anyhow!("warps are disabled in the configuration"))?;
            match command {
                WarpCommand::List => Ok(list_lines("warp", &warps.list())),
                WarpCommand::Add { name, location } => {
                    let record = warps.add(name, location)?;
                    Ok(vec![format!("Added warp {}", describe(&record))])
                }
                WarpCommand::Remove { name } => {
                    if !warps.remove(name)? {
                        bail!("no warp named '{}'", name);
                    }
                    Ok(vec![format!("Removed warp '{}'", name)])
                }
            }
        }
        CliCommand::Home { player, command } => {
            let homes = plugin
                .homes()
                .ok_or_else(|| anyhow!("homes are disabled in the configuration"))?;
            match command {
                HomeCommand::List => Ok(list_lines("home", &homes.list(*player))),
                HomeCommand::Add { name, location } => {
                    let record = homes.add(*player, name, location)?;
                    Ok(vec![format!("Added home {} for {}", describe(&record), player)])
                }
                HomeCommand::Remove { name } => {
                    if !homes.remove(*player, name)? {
                        bail!("{} has no home named '{}'", player, name);
                    }
                    Ok(vec![format!("Removed home '{}' of {}", name, player)])
                }
            }
        }
        CliCommand::Hub(command) => {
            let hub = plugin
                .hub()
                .ok_or_else(|| anyhow!("the hub is disabled in the configuration"))?;
            match command {
                HubCommand::Show => Ok(vec![match hub.get() {
                    Some(record) => describe(&record),
                    None => "Hub is not set".to_string(),
                }]),
                HubCommand::Set { location } => {
                    let record = hub.set(location)?;
                    Ok(vec![format!("Hub set to {}", describe(&record))])
                }
                HubCommand::Clear => Ok(vec![if hub.clear()? {
                    "Hub cleared".to_string()
                } else {
                    "Hub was not set".to_string()
                }]),
            }
        }
    }
}

fn check(plugin: &EssentialsPlugin) -> Vec<String> {
    let mut lines = vec![format!("Configuration OK, data in {}", plugin.data_dir().display())];
    let status = |enabled: bool, detail: String| if enabled { detail } else { "disabled".to_string() };

    lines.push(format!(
        "warps: {}",
        status(plugin.warps().is_some(), plugin.warps().map_or(0, |w| w.len()).to_string())
    ));
    lines.push(format!(
        "homes: {}",
        status(
            plugin.homes().is_some(),
            format!("{} player(s)", plugin.homes().map_or(0, |h| h.players().len()))
        )
    ));
    lines.push(format!(
        "hub: {}",
        status(
            plugin.hub().is_some(),
            if plugin.hub().is_some_and(|hub| hub.is_set()) { "set" } else { "not set" }.to_string()
        )
    ));

    let features = &plugin.config().features;
    lines.push(format!(
        "tpa: {}, back: {}, notice: {}",
        on_off(features.tpa),
        on_off(features.back),
        on_off(features.notice)
    ));
    info!("Checked {}", plugin.data_dir().display());
    lines
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn list_lines(kind: &str, records: &[LocationRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec![format!("No {kind}s")];
    }
    records.iter().map(describe).collect()
}

fn describe(record: &LocationRecord) -> String {
    format!(
        "'{}' in {}/{} at ({:.2}, {:.2}, {:.2}) pitch {:.1} yaw {:.1}",
        record.name, record.world_name, record.dimension_id, record.x, record.y, record.z, record.pitch, record.yaw
    )
}
