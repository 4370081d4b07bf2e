use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use hirex_core::{ControllerSettings, DEFAULT_PREVIEW_DELAY, DEFAULT_TIMEOUT};
use hirex_engine::{TransportSettings, DEFAULT_NOTICE_DURATION, DEFAULT_QUOTA_BYTES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cli::Cli;

const APP_DIR: &str = "hirex";
const CONFIG_FILENAME: &str = "config.ron";
const STORAGE_FILENAME: &str = "storage.ron";
const LOG_FILENAME: &str = "hirex.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub storage_path: PathBuf,
    pub storage_quota_bytes: u64,
    pub export_dir: PathBuf,
    #[serde(with = "humantime_serde")]
    pub notification_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub preview_delay: Duration,
    pub diagnostics: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let transport = TransportSettings::default();
        Self {
            base_url: transport.base_url,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: transport.connect_timeout,
            storage_path: data_dir().join(STORAGE_FILENAME),
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            export_dir: PathBuf::from("."),
            notification_duration: DEFAULT_NOTICE_DURATION,
            preview_delay: DEFAULT_PREVIEW_DELAY,
            diagnostics: true,
        }
    }
}

impl AppConfig {
    /// A missing file is not an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Reads the config named on the command line (or the default one),
    /// falling back to defaults with a warning, then applies CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        let mut config = match Self::from_file(&path) {
            Ok(config) => {
                engine_info!("Using config {:?}", path);
                config
            }
            Err(err) => {
                engine_warn!("{}; using defaults", err);
                Self::default()
            }
        };
        config.apply_overrides(cli);
        config
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(storage) = &cli.storage {
            self.storage_path = storage.clone();
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            base_url: self.base_url.clone(),
            connect_timeout: self.connect_timeout,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            timeout: self.timeout,
            preview_delay: self.preview_delay,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILENAME)
}

pub fn default_log_path() -> PathBuf {
    data_dir().join(LOG_FILENAME)
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::from_file(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.preview_delay, Duration::from_millis(1200));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ron");
        fs::write(
            &path,
            r#"(base_url: "http://backend:9000", timeout: "5m", diagnostics: false)"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();

        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(!config.diagnostics);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.storage_quota_bytes, DEFAULT_QUOTA_BYTES);
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ron");
        fs::write(&path, "(timeout: ").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn cli_flags_override_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ron");
        fs::write(&path, r#"(base_url: "http://from-file:1")"#).unwrap();
        let storage = temp.path().join("store.ron");

        let cli = Cli::try_parse_from([
            "hirex",
            "--config",
            path.to_str().unwrap(),
            "--base-url",
            "http://from-cli:2",
            "--storage",
            storage.to_str().unwrap(),
            "preview",
        ])
        .unwrap();
        let config = AppConfig::load(&cli);

        assert_eq!(config.base_url, "http://from-cli:2");
        assert_eq!(config.storage_path, storage);
    }
}
