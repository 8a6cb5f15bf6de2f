//! User-level configuration file
//!
//! Lives at `<config dir>/statwatch/config.toml` unless `--config` points
//! elsewhere. A missing default file means "all defaults".

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use statwatch::WatchConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Full CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub watch: WatchConfig,
    pub output: OutputConfig,
}

/// How change events are printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One JSON object per line instead of human-readable text
    pub json: bool,
    /// Colorize human-readable output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            color: true,
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        self.watch.validate()?;
        Ok(())
    }
}

/// Default location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("statwatch").join("config.toml"))
}

fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => config_file_path().context("Could not determine config file path"),
    }
}

/// Load configuration
///
/// An explicit `path` must exist; the default location may be absent.
pub fn load(path: Option<&Path>) -> Result<SystemConfig> {
    let config_path = resolve(path)?;

    if !config_path.exists() {
        if path.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }
        return Ok(SystemConfig::default());
    }

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
}

/// Load configuration for editing; a missing file starts from defaults
pub fn load_for_update(path: Option<&Path>) -> Result<SystemConfig> {
    let config_path = resolve(path)?;
    if config_path.exists() {
        load(Some(&config_path))
    } else {
        Ok(SystemConfig::default())
    }
}

/// Write configuration, creating parent directories as needed
pub fn save(config: &SystemConfig, path: Option<&Path>) -> Result<PathBuf> {
    let config_path = resolve(path)?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&config_path, contents)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    Ok(config_path)
}

/// Write the default configuration if no file exists yet
///
/// Returns true when a file was created.
pub fn init_if_missing(path: Option<&Path>) -> Result<bool> {
    let config_path = resolve(path)?;
    if config_path.exists() {
        return Ok(false);
    }
    save(&SystemConfig::default(), Some(&config_path))?;
    Ok(true)
}

pub fn example_config() -> &'static str {
    r#"# statwatch configuration

[watch]
# Delay between two stat passes over the watched paths (10-3600000)
poll_interval_ms = 1000

[output]
# Print one JSON object per change instead of text
json = false
# Colorize text output
color = true
"#
}
