use crate::models::target::PollTarget;
use crate::normalizer::wind::WindUnit;
use anyhow::{bail, Context, Result};
use config::{Config, File};
use log::{debug, LevelFilter};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;

    Ok(value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    #[default]
    Get,
    /// Form-encoded `phoneid` body, as older portal versions expected.
    Post,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PortalConfig {
    pub scheme: String,
    pub hostname: String,
    pub path: String,
    pub method: RequestMethod,
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            hostname: "measurements.mobile-alerts.eu".to_string(),
            path: "/Home/SensorsOverview".to_string(),
            method: RequestMethod::Get,
            user_agent: format!("mobilealerts/{}", env!("CARGO_PKG_VERSION")),
            timeout: 15,
        }
    }
}

impl PortalConfig {
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.hostname, self.path)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    #[serde(deserialize_with = "deserialize_id_list")]
    pub phone_ids: Vec<String>,
    /// Seconds between two poll cycles.
    pub interval: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            phone_ids: Vec::new(),
            interval: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorsConfig {
    pub wind_unit: WindUnit,
    pub show_battery: bool,
    pub show_timestamp: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            wind_unit: WindUnit::default(),
            show_battery: true,
            show_timestamp: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: "states.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(rename = "PORTAL", default)]
    pub portal: PortalConfig,
    #[serde(rename = "POLLING", default)]
    pub polling: PollingConfig,
    #[serde(rename = "SENSORS", default)]
    pub sensors: SensorsConfig,
    #[serde(rename = "STORE", default)]
    pub store: StoreConfig,
    #[serde(rename = "LOGGING", default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_file("config.ini")
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::with_name(config_path.to_str().unwrap_or("")).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config.try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval)
    }

    /// One target per configured phone id, in configuration order.
    pub fn targets(&self) -> Result<Vec<PollTarget>> {
        if self.polling.phone_ids.is_empty() {
            bail!("No phone ids configured, set [POLLING] phone_ids");
        }
        if self.polling.interval == 0 {
            bail!("[POLLING] interval must be at least one second");
        }

        Ok(self
            .polling
            .phone_ids
            .iter()
            .map(|id| PollTarget::new(id, self.interval()))
            .collect())
    }
}
