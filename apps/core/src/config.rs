use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::search::SearchMode;
use crate::sorter::PinPosition;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page_size: usize,
    pub max_size: usize,
    pub pin_to: PinPosition,
    pub search_mode: SearchMode,
    pub search_debounce_ms: u64,
    pub refresh_interval_secs: u64,
    pub paste_by_default: bool,
    pub remove_formatting_by_default: bool,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            page_size: 50,
            max_size: 200,
            pin_to: PinPosition::Top,
            search_mode: SearchMode::Exact,
            search_debounce_ms: 200,
            refresh_interval_secs: 30,
            paste_by_default: false,
            remove_formatting_by_default: false,
            db_path: base.join("history.sqlite3"),
            log_dir: base.join("logs"),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "clipstack")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("clipstack"))
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    crate::settings::validate_page_size(cfg.page_size)?;
    crate::settings::validate_max_size(cfg.max_size)?;

    if cfg.search_debounce_ms > 5_000 {
        return Err("search_debounce_ms must be at most 5000".into());
    }

    if cfg.refresh_interval_secs == 0 {
        return Err("refresh_interval_secs must be at least 1".into());
    }

    if cfg.db_path.as_os_str().is_empty() {
        return Err("db_path is required".into());
    }

    Ok(())
}

/// Loads `path` (or the default location). A missing file yields defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    let mut config = match std::fs::read_to_string(&config_path) {
        Ok(raw) => parse(&config_path, &raw)?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_path,
                source,
            })
        }
    };
    config.config_path = config_path;
    validate(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    let encoded = toml::to_string_pretty(cfg)?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: cfg.config_path.clone(),
            source,
        })?;
    }
    std::fs::write(&cfg.config_path, encoded).map_err(|source| ConfigError::Write {
        path: cfg.config_path.clone(),
        source,
    })
}

fn parse(path: &Path, raw: &str) -> Result<Config, ConfigError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("json5"));

    if is_json {
        json5::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    } else {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
