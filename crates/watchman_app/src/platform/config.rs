use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use watchman_engine::{AtomicFileWriter, ClientSettings, PersistError, PollSettings, ServiceMode};
use watchman_logging::{watch_info, LogDestination};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILENAME: &str = "watchman.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write config: {0}")]
    Write(#[from] PersistError),
    #[error("config {0:?} already exists")]
    AlreadyExists(PathBuf),
}

/// Client configuration persisted as RON.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub service_mode: ServiceMode,
    pub poll_interval_ms: u64,
    /// Unset polls until the service answers terminally.
    pub max_poll_duration_secs: Option<u64>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            api_prefix: client.api_prefix,
            service_mode: client.mode,
            poll_interval_ms: client.poll.interval.as_millis() as u64,
            max_poll_duration_secs: None,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            output_dir: PathBuf::from("output"),
            log_destination: LogDestination::Terminal,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(self, pretty)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILENAME.to_string());

        let written = AtomicFileWriter::new(dir).write(&filename, content.as_bytes())?;
        watch_info!("Wrote config to {:?}", written);
        Ok(())
    }

    /// Writes the defaults to `path`, refusing to replace an existing file unless `force`.
    pub fn write_defaults(path: &Path, force: bool) -> Result<Self, ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api_prefix: self.api_prefix.clone(),
            mode: self.service_mode,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_duration: self.max_poll_duration_secs.map(Duration::from_secs),
            },
            ..ClientSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.poll_interval_ms, 5000);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("watchman.ron");
        let config = AppConfig {
            base_url: "http://192.168.1.6:5000".to_string(),
            service_mode: ServiceMode::Sync,
            max_poll_duration_secs: Some(120),
            log_destination: LogDestination::Both,
            ..AppConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchman.ron");
        fs::write(&path, "(poll_interval_ms: 250)").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.api_prefix, "/api");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchman.ron");
        fs::write(&path, "(poll_interval_ms: \"soon\")").unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn write_defaults_does_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchman.ron");
        AppConfig::write_defaults(&path, false).unwrap();

        assert!(matches!(
            AppConfig::write_defaults(&path, false),
            Err(ConfigError::AlreadyExists(_))
        ));
        assert!(AppConfig::write_defaults(&path, true).is_ok());
    }

    #[test]
    fn client_settings_carry_poll_cap() {
        let config = AppConfig {
            poll_interval_ms: 1500,
            max_poll_duration_secs: Some(30),
            ..AppConfig::default()
        };
        let settings = config.client_settings();
        assert_eq!(settings.poll.interval, Duration::from_millis(1500));
        assert_eq!(settings.poll.max_duration, Some(Duration::from_secs(30)));
        assert_eq!(settings.mode, ServiceMode::Async);
    }
}
