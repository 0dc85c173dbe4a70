//! Configuration loading.
//!
//! Priority: local (<data_dir>/config.local.toml) > user
//! (~/.mmakwany/config.toml) > built-in defaults. Every field is
//! optional in the files; unset fields fall back to the tier below.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::session::{SessionDefaults, DEFAULT_EMAIL, DEFAULT_NAME, DEFAULT_STARTING_POINTS};

/// Resolved configuration, after all tiers are merged.
#[derive(Debug, Clone)]
pub struct Config {
    pub starting_points: u32,
    pub default_email: String,
    pub default_name: String,
    pub currency: String,
    pub catering_guest_count: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            starting_points: DEFAULT_STARTING_POINTS,
            default_email: DEFAULT_EMAIL.to_string(),
            default_name: DEFAULT_NAME.to_string(),
            currency: "KES".to_string(),
            catering_guest_count: 200,
        }
    }
}

/// One configuration file as written on disk.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    starting_points: Option<u32>,
    #[serde(default)]
    default_email: Option<String>,
    #[serde(default)]
    default_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    catering: CateringFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CateringFile {
    #[serde(default)]
    guest_count: Option<u32>,
}

impl ConfigFile {
    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        Ok(file)
    }
}

impl Config {
    /// Load configuration from default paths, user-level first, then
    /// the local override beside the data dir.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mmakwany").join("config.toml");
            if user_config.exists() {
                config.merge(ConfigFile::load_from(&user_config)?);
            }
        }

        let local_config = data_dir.join("config.local.toml");
        if local_config.exists() {
            config.merge(ConfigFile::load_from(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path over the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(ConfigFile::load_from(path)?);
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(points) = file.starting_points {
            self.starting_points = points;
        }
        if let Some(email) = file.default_email {
            self.default_email = email;
        }
        if let Some(name) = file.default_name {
            self.default_name = name;
        }
        if let Some(currency) = file.currency {
            self.currency = currency;
        }
        if let Some(guest_count) = file.catering.guest_count {
            self.catering_guest_count = guest_count;
        }
    }

    /// Identity and balance handed to the session store.
    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            email: self.default_email.clone(),
            display_name: self.default_name.clone(),
            starting_points: self.starting_points,
        }
    }
}
