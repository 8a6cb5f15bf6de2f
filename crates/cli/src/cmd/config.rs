//! Configuration management command
//!
//! Provides CLI interface to view and edit the statwatch configuration.

use crate::system_config::{self, SystemConfig};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

/// Keys accepted by `get` and `set`
pub const KEYS: &[&str] = &["watch.poll_interval_ms", "output.json", "output.color"];

/// List all configuration values
pub fn run_list(config_path: Option<&Path>) -> Result<()> {
    let config = system_config::load(config_path)?;
    let location = match config_path {
        Some(path) => path.to_path_buf(),
        None => system_config::config_file_path()
            .context("Could not determine config file path")?,
    };

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), location.display().dimmed());

    println!("{}", "[watch]".yellow());
    println!(
        "  {} = {} {}",
        "poll_interval_ms".cyan(),
        config.watch.poll_interval_ms,
        format!("({:?})", config.watch.poll_interval()).dimmed()
    );

    println!("\n{}", "[output]".yellow());
    println!("  {} = {}", "json".cyan(), config.output.json);
    println!("  {} = {}", "color".cyan(), config.output.color);

    println!("\n{}", "Valid Ranges:".bold());
    println!(
        "  poll_interval_ms: {}-{}",
        statwatch::config::MIN_POLL_INTERVAL_MS,
        statwatch::config::MAX_POLL_INTERVAL_MS
    );

    Ok(())
}

/// Get a single configuration value
pub fn run_get(config_path: Option<&Path>, key: &str) -> Result<()> {
    let config = system_config::load(config_path)?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub fn run_set(config_path: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load_for_update(config_path)?;
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&config, config_path)?;
    println!("{} {} = {}", "✓".green(), key.cyan(), value);

    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(config_path: Option<&Path>, create: bool) -> Result<()> {
    let location = match config_path {
        Some(path) => path.to_path_buf(),
        None => system_config::config_file_path()
            .context("Could not determine config file path")?,
    };

    if create && system_config::init_if_missing(Some(&location))? {
        println!("{} Created config file at: {}", "✓".green(), location.display());
    } else if location.exists() {
        println!("{}", location.display());
    } else {
        println!("{}", location.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown config key: {}. Valid keys: {}",
        key,
        KEYS.join(", ")
    )
}

pub fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let value = match key {
        "watch.poll_interval_ms" => config.watch.poll_interval_ms.to_string(),
        "output.json" => config.output.json.to_string(),
        "output.color" => config.output.color.to_string(),
        _ => return Err(unknown_key(key)),
    };
    Ok(value)
}

pub fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "watch.poll_interval_ms" => {
            config.watch.poll_interval_ms = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "output.json" => {
            config.output.json = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "output.color" => {
            config.output.color = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}
