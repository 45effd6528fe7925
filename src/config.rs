use std::{env, fmt, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// App version the vendor backend expects in the `Versioncode` header.
pub const VERSION_CODE: &str = "40304";

/// User agent of the official mobile app.
pub const USER_AGENT: &str = "Dart/3.9 (dart:io)";

/// Device descriptor sent in the `Mobiledevices` header.
pub const MOBILE_DEVICES: &str = r#"{"brand":"google","device":"emulator64_x86_64_arm64","deviceType":"sdk_gphone64_x86_64","os":"","os_version":"31","manufacturer":"Google"}"#;

pub const GLOBAL_API_HOST: &str = "api2.speediance.com";
pub const EU_API_HOST: &str = "euapi.speediance.com";

/// Maximum number of exercise groups requested per batch detail call.
pub const LIBRARY_BATCH_SIZE: usize = 50;

/// Factor applied to user weights before they are sent as custom weights.
pub const POUNDS_PER_KILOGRAM: f64 = 2.2;

/// Placeholder weight sent for every set of a preset (RM) exercise.
pub const PRESET_PLACEHOLDER_WEIGHT: &str = "3.5";

/// Device type of the gym station in template payloads and listings.
pub const DEVICE_TYPE: u8 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Backend region. Accounts live in exactly one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Region {
    #[default]
    Global,
    #[serde(rename = "EU")]
    Eu,
}

impl Region {
    pub fn host(self) -> &'static str {
        match self {
            Region::Global => GLOBAL_API_HOST,
            Region::Eu => EU_API_HOST,
        }
    }

    /// Parse a form value; anything other than `EU` means the global backend.
    pub fn from_form(value: &str) -> Self {
        if value.trim() == "EU" {
            Region::Eu
        } else {
            Region::Global
        }
    }
}

/// Lenient like [`Region::from_form`]: unknown or non-string values mean `Global`.
impl<'de> Deserialize<'de> for Region {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map_or(Region::Global, Region::from_form))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Global => f.write_str("Global"),
            Region::Eu => f.write_str("EU"),
        }
    }
}

/// Process configuration for the web front-end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Where login credentials are persisted.
    pub config_file: PathBuf,
    /// Root of the on-disk media cache.
    pub cache_dir: PathBuf,
    /// Replaces the regional vendor URL, e.g. for a local mock.
    pub api_base_override: Option<Url>,
    pub proxy_timeout: Duration,
    pub preload_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            config_file: PathBuf::from("config.json"),
            cache_dir: PathBuf::from("static").join("media_cache"),
            api_base_override: None,
            proxy_timeout: Duration::from_secs(10),
            preload_timeout: Duration::from_secs(20),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_override = match var("SPEEDIANCE_API_BASE") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                key: "SPEEDIANCE_API_BASE".to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            host: try_load("SPEEDIANCE_HOST", &defaults.host)?,
            port: try_load("SPEEDIANCE_PORT", "5001")?,
            config_file: try_load("SPEEDIANCE_CONFIG_FILE", "config.json")?,
            cache_dir: var("SPEEDIANCE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            api_base_override,
            proxy_timeout: Duration::from_secs(try_load("SPEEDIANCE_PROXY_TIMEOUT_SECS", "10")?),
            preload_timeout: Duration::from_secs(try_load(
                "SPEEDIANCE_PRELOAD_TIMEOUT_SECS",
                "20",
            )?),
        })
    }

    /// Base URL of the vendor API for `region`, without a trailing slash.
    pub fn base_url(&self, region: Region) -> String {
        match &self.api_base_override {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!("https://{}", region.host()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}
