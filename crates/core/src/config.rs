//! Application configuration.
//!
//! Values come from built-in defaults, then `~/.config/memo/config.toml`,
//! then `MEMO_*` environment variables.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineConfig;

/// Directory under the platform config/data roots used by memo.
pub const APP_DIR: &str = "memo";
/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment overrides, e.g. `MEMO_REVEAL_DELAY_MS`.
pub const ENV_PREFIX: &str = "MEMO";

const DEFAULT_REVEAL_DELAY_MS: u64 = 800;
const DEFAULT_TICK_MS: u64 = 10;

const DEFAULT_CONFIG: &str = r#"# memo configuration

# How long two picked cards stay face up before flipping back (milliseconds).
reveal_delay_ms = 800

# Refresh period of the round timer (milliseconds).
tick_ms = 10

# Where accounts, best scores and local results are stored.
# data_dir = "/path/to/memo"

# Fixed shuffle seed for reproducible deals.
# seed = 42
"#;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A zero reveal delay would hide the second card instantly.
    #[error("reveal_delay_ms must be greater than zero")]
    ZeroRevealDelay,
    /// A zero tick period cannot drive the timer.
    #[error("tick_ms must be greater than zero")]
    ZeroTick,
}

/// Runtime settings for the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reveal delay in milliseconds.
    pub reveal_delay_ms: u64,
    /// Timer refresh period in milliseconds.
    pub tick_ms: u64,
    /// Root directory for persisted data.
    pub data_dir: PathBuf,
    /// Optional fixed shuffle seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            tick_ms: DEFAULT_TICK_MS,
            data_dir: default_data_dir(),
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path(), None)
    }

    /// Load from `path`, with `env` replacing the process environment when given.
    pub fn load_from(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("reveal_delay_ms", defaults.reveal_delay_ms)?
            .set_default("tick_ms", defaults.tick_ms)?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reveal_delay_ms == 0 {
            return Err(ConfigError::ZeroRevealDelay);
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        Ok(())
    }

    /// Engine tunables derived from this configuration.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            reveal_delay: Duration::from_millis(self.reveal_delay_ms),
            tick: Duration::from_millis(self.tick_ms),
            seed: self.seed,
        }
    }
}

/// Location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default root for persisted data.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the commented default configuration when no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_file() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join(CONFIG_FILE), Some(HashMap::new()))?;
        assert_eq!(config.reveal_delay_ms, DEFAULT_REVEAL_DELAY_MS);
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.seed, None);
        assert_eq!(config.engine(), EngineConfig::default());
        Ok(())
    }

    #[test]
    fn default_file_parses_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(APP_DIR).join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.exists());
        let config = AppConfig::load_from(&path, Some(HashMap::new()))?;
        assert_eq!(config.reveal_delay_ms, DEFAULT_REVEAL_DELAY_MS);
        Ok(())
    }

    #[test]
    fn file_and_environment_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "reveal_delay_ms = 500\nseed = 9\n")?;
        let env = HashMap::from([
            ("MEMO_TICK_MS".to_string(), "25".to_string()),
            ("MEMO_DATA_DIR".to_string(), "/tmp/memo-data".to_string()),
        ]);

        let config = AppConfig::load_from(&path, Some(env))?;
        assert_eq!(config.reveal_delay_ms, 500);
        assert_eq!(config.tick_ms, 25);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/memo-data"));
        assert_eq!(config.engine().reveal_delay, Duration::from_millis(500));
        Ok(())
    }

    #[test]
    fn zero_delay_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "reveal_delay_ms = 0\n")?;
        let err = AppConfig::load_from(&path, Some(HashMap::new())).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroRevealDelay)
        );
        Ok(())
    }
}
