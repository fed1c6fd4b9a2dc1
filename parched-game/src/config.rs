//! Server, client and synced configuration sets plus their on-disk files.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::{CLIENT_CONFIG_FILE, SERVER_CONFIG_FILE};
use crate::curves::HungerBuffCurve;
use crate::purity::PurityLevel;

/// Errors raised while reading or writing configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to enumerate config directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// The file (or directory) the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Load { path, .. }
            | Self::Write { path, .. }
            | Self::Scan { path, .. } => path,
        }
    }
}

/// Gameplay tunables every client must agree on with the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SyncedConfig {
    pub enable_thirst: bool,
    pub thirst_kills: bool,
    pub thirst_speed_modifier: f32,
    pub hunger_buff_curve: HungerBuffCurve,
    pub lower_half_hunger_buff_curve: HungerBuffCurve,
    pub hunger_buff_max: f32,
    pub container_drink_speed: f32,
    pub pure_purity_level: f32,
    pub filtered_purity_level: f32,
    pub boiled_purity_level: f32,
    pub okay_purity_level: f32,
    pub stagnant_purity_level: f32,
    pub rot_purity_level: f32,
    pub vomit_hydration_multiplier: f32,
    pub vomit_euhydration_multiplier: f32,
}

impl Default for SyncedConfig {
    fn default() -> Self {
        Self {
            enable_thirst: true,
            thirst_kills: true,
            thirst_speed_modifier: 1.0,
            hunger_buff_curve: HungerBuffCurve::Linear,
            lower_half_hunger_buff_curve: HungerBuffCurve::None,
            hunger_buff_max: 0.3,
            container_drink_speed: 1.0,
            pure_purity_level: 1.0,
            filtered_purity_level: 0.9,
            boiled_purity_level: 0.9,
            okay_purity_level: 0.7,
            stagnant_purity_level: 0.35,
            rot_purity_level: 0.1,
            vomit_hydration_multiplier: 0.5,
            vomit_euhydration_multiplier: 0.5,
        }
    }
}

impl SyncedConfig {
    /// Project the broadcast subset out of the authoritative server config.
    #[must_use]
    pub fn from_server(server: &ConfigServer) -> Self {
        server.synced.clone()
    }

    /// Numeric purity in `[0, 1]` configured for a purity level.
    #[must_use]
    pub const fn purity_threshold(&self, level: PurityLevel) -> f32 {
        match level {
            PurityLevel::Pure => self.pure_purity_level,
            PurityLevel::Filtered => self.filtered_purity_level,
            PurityLevel::Potable => self.boiled_purity_level,
            PurityLevel::Okay => self.okay_purity_level,
            PurityLevel::Stagnant => self.stagnant_purity_level,
            PurityLevel::Yuck => self.rot_purity_level,
        }
    }

    /// Stable digest of the snapshot, used to compare replicas in logs.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&canonical);
        hasher.finish()
    }
}

/// Authoritative server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConfigServer {
    #[serde(flatten)]
    pub synced: SyncedConfig,
    pub thirst_damage: f32,
    pub scalding_damage: f32,
    pub salt_water_thirst_penalty: f32,
}

impl Default for ConfigServer {
    fn default() -> Self {
        Self {
            synced: SyncedConfig::default(),
            thirst_damage: 0.125,
            scalding_damage: 3.0,
            salt_water_thirst_penalty: 3.0,
        }
    }
}

impl ConfigServer {
    /// Overwrite the synced subset with a snapshot pushed by an administrator.
    pub fn update_from_synced(&mut self, snapshot: SyncedConfig) {
        self.synced = snapshot;
    }
}

/// Client-only preferences, never sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConfigClient {
    pub show_hydration_info: bool,
    pub hydration_info_decimals: u8,
}

impl Default for ConfigClient {
    fn default() -> Self {
        Self {
            show_hydration_info: true,
            hydration_info_decimals: 0,
        }
    }
}

/// A config type stored as a single JSON file.
pub trait ConfigFile: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
}

impl ConfigFile for ConfigServer {
    const FILE_NAME: &'static str = SERVER_CONFIG_FILE;
}

impl ConfigFile for ConfigClient {
    const FILE_NAME: &'static str = CLIENT_CONFIG_FILE;
}

/// Read a config file from `dir`, writing the defaults when it is missing.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed, or (when
/// missing) written.
pub fn read_config<T: ConfigFile>(dir: &Path) -> Result<T, ConfigError> {
    let path = dir.join(T::FILE_NAME);
    if !path.exists() {
        let defaults = T::default();
        write_json(&path, &defaults)?;
        log::info!("wrote default config {}", path.display());
        return Ok(defaults);
    }
    read_json(&path)
}

/// Parse a JSON file into `T`, attaching the path to any failure.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Load`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print `value` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Write`] on any I/O failure.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let to_write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_write_err)?;
    }
    let body = serde_json::to_string_pretty(value)
        .map_err(|err| to_write_err(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    fs::write(path, body).map_err(to_write_err)
}
