use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration stored in ~/.spawnscan/config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Overrides the default `~/.spawnscan/spawnscan.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    #[serde(default)]
    pub altitude: AltitudeConfig,
}

impl Config {
    /// Database file this config points at.
    pub fn resolved_db_path(&self) -> Result<PathBuf, String> {
        match self.db_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(expand_home(path)),
            _ => crate::db::SpawnDb::default_path().map_err(|e| e.to_string()),
        }
    }
}

/// Altitude lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gmaps_key: Option<String>,
    /// Used when neither the cache nor the API has an answer.
    #[serde(default = "default_altitude")]
    pub default_altitude: f64,
    /// Whole metres of jitter added either way; 0 adds only a sub-metre fraction.
    #[serde(default = "default_variance")]
    pub variance: i64,
    /// Skip the persisted cache and reuse one process-wide lookup instead.
    #[serde(default)]
    pub no_db_cache: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_altitude() -> f64 {
    507.9
}

fn default_variance() -> i64 {
    1
}

fn default_api_url() -> String {
    "https://maps.googleapis.com/maps/api/elevation/json".to_string()
}

impl Default for AltitudeConfig {
    fn default() -> Self {
        Self {
            gmaps_key: None,
            default_altitude: default_altitude(),
            variance: default_variance(),
            no_db_cache: false,
            api_url: default_api_url(),
        }
    }
}

/// Resolve the default config path: `~/.spawnscan/config.json`.
pub fn default_config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".spawnscan").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        return Err(format!(
            "Config file not found at {}. Create it with: {{ \"altitude\": {{ \"gmapsKey\": \"...\" }} }}",
            path.display()
        ));
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    if config.altitude.variance < 0 {
        return Err(format!(
            "altitude.variance must not be negative, got {}",
            config.altitude.variance
        ));
    }

    Ok(config)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
