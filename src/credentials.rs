// Persisted login state: user id, session token, region and unit preference.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::de;
use crate::config::{ConfigError, Region};

/// Unit preference as stored by the vendor: 0 = metric, 1 = imperial.
pub type UnitSystem = u8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default, deserialize_with = "unit_or_metric")]
    pub unit: UnitSystem,
}

/// Older files store the unit as the raw form string (`"1"`).
fn unit_or_metric<'de, D>(deserializer: D) -> Result<UnitSystem, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de::opt_i64(deserializer).map(|v| v.and_then(|u| UnitSystem::try_from(u).ok()).unwrap_or(0))
}

impl Credentials {
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    /// Drop the session but keep region and unit preference.
    pub fn cleared(&self) -> Self {
        Self {
            user_id: String::new(),
            token: String::new(),
            region: self.region,
            unit: self.unit,
        }
    }
}

/// JSON file holding [`Credentials`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load credentials; a missing file yields empty defaults.
    pub fn load(&self) -> Result<Credentials, ConfigError> {
        if !self.path.exists() {
            debug!("no credential file at {}", self.path.display());
            return Ok(Credentials::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let raw = serde_json::to_string_pretty(credentials).map_err(|source| {
            ConfigError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, raw).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
