use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ADDR: &str = "http://localhost:8086";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const CONFIG_FILE_NAME: &str = ".influxcat.toml";

/// Connection settings handed to the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConfig {
    pub addr: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            username: None,
            password: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl InfluxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Contents of the optional TOML config file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub addr: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub series: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl FileConfig {
    /// `$HOME/.influxcat.toml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    /// Missing file means no settings
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// An explicitly requested file has to exist; the default one does not
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                Self::load(path)
            }
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }
}

/// Values given on the command line or through `INFLUXCAT_*` variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub addr: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub series: Option<String>,
}

/// Fully layered settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub influx: InfluxConfig,
    pub database: String,
    pub series: String,
}

impl Settings {
    /// Flag or environment first, then the file, then built-in defaults
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
        let defaults = InfluxConfig::default();
        Self {
            influx: InfluxConfig {
                addr: overrides.addr.or(file.addr).unwrap_or(defaults.addr),
                username: overrides.username.or(file.username),
                password: overrides.password.or(file.password),
                timeout_seconds: file.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            },
            database: overrides.database.or(file.database).unwrap_or_default(),
            series: overrides.series.or(file.series).unwrap_or_default(),
        }
    }
}
