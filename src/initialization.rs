use std::env;
use std::fs::{read_dir, read_to_string};
use std::path::PathBuf;
use std::time::Duration;
use log::{info, warn};
use serde::Deserialize;
use crate::errors::UnrecoverableError;

const CONFIG_PATH_VAR: &str = "PV_DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Deserialize, Clone)]
pub struct WebServer {
    pub bind_address: String,
    pub bind_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct ExportFiles {
    pub data_dir: String,
    pub historical_pattern: String,
    pub monthly_pattern: String,
}

#[derive(Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u64,
}

impl CacheSettings {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_minutes * 60)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { max_age_minutes: default_max_age_minutes() }
    }
}

fn default_max_age_minutes() -> u64 { 10 }

#[derive(Deserialize, Clone)]
pub struct Config {
    pub web_server: WebServer,
    pub files: ExportFiles,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Reads the configuration file
///
/// The path is taken from the PV_DASHBOARD_CONFIG environment variable and
/// falls back to ./config.json
pub fn config() -> Result<Config, UnrecoverableError> {
    let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let json = read_to_string(&path)
        .map_err(|e| UnrecoverableError(format!("reading config {}: {}", path, e)))?;
    let config: Config = serde_json::from_str(&json)
        .map_err(|e| UnrecoverableError(format!("parsing config {}: {}", path, e)))?;

    Ok(config)
}

/// Locates a vendor export in the data directory by filename substring
///
/// The vendor embeds an export timestamp in the filename, so discovery
/// matches on a stable part of the name rather than an exact path.
///
/// # Arguments
///
/// * 'dir' - directory holding the exported files
/// * 'pattern' - substring identifying the export kind
pub fn find_export_file(dir: &str, pattern: &str) -> Option<PathBuf> {
    let entries = match read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("unable to read data directory {}: {}", dir, e);
            return None;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().contains(pattern) {
            info!("export found for pattern '{}': {}", pattern, name.to_string_lossy());
            return Some(entry.path());
        }
    }

    warn!("no export matching '{}' in {}", pattern, dir);
    None
}
