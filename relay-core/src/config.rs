//! Global relay configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::course::UserId;
use crate::error::{RelayError, RelayResult};

static DEFAULT_DATA_DIR: &str = "~/relay";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn is_default_data_dir(p: &PathBuf) -> bool {
    *p == default_data_dir()
}

/// Configuration at ~/.config/relay/config.toml, overridable with
/// `RELAY_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_data_dir", skip_serializing_if = "is_default_data_dir")]
    pub data_dir: PathBuf,

    /// Identity used for edits, vouches and the saved list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// IANA zone name; the system zone is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            data_dir: default_data_dir(),
            user: None,
            timezone: None,
        }
    }
}

impl RelayConfig {
    pub fn config_path() -> RelayResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RelayError::Config("Could not determine config directory".into()))?
            .join("relay");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path, creating a commented default file first
    /// if there is none.
    pub fn load() -> RelayResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load `path` with `RELAY_*` environment overrides applied.
    pub fn load_from(path: &Path) -> RelayResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("RELAY"))
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RelayError::Config(e.to_string()))
    }

    /// Load only what is written in `path`, ignoring the environment.
    /// Use this before [`RelayConfig::save`] so overrides are not persisted.
    pub fn load_file(path: &Path) -> RelayResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| RelayError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RelayError::Config(e.to_string()))
    }

    /// Save the current config to ~/.config/relay/config.toml
    pub fn save(&self) -> RelayResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> RelayResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RelayError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| RelayError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> RelayResult<()> {
        let contents = format!(
            "\
# relay configuration

# Where courses and saved lists are stored:
# data_dir = \"{}\"

# Who you are when editing, vouching or saving courses:
# user = \"alice\"

# Time zone for entering and showing event times (defaults to the system zone):
# timezone = \"America/Toronto\"
",
            DEFAULT_DATA_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RelayError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(UserId::from)
    }

    /// The configured zone, if any. An unknown name is an error.
    pub fn timezone(&self) -> RelayResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| RelayError::Config(format!("Unknown time zone '{}'", name)))
            })
            .transpose()
    }
}
