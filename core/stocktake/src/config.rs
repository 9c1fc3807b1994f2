//! Runtime configuration.
//!
//! Three layers, later wins: compiled defaults, an optional `stocktake.toml`
//! in the working directory, then command-line flags. A malformed config
//! file is reported and ignored rather than aborting a counting session.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "./inventory.db";
pub const DEFAULT_LOG_PATH: &str = "./stocktake.log";
pub const DEFAULT_LISTENER_ADDR: &str = "127.0.0.1:9400";
pub const CONFIG_PATH: &str = "./stocktake.toml";

pub const PROMPT: &str = "stocktake $ ";

/// Resolved configuration for one session.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    /// `None` means count forwarding is disabled for the session.
    pub listener: Option<String>,
}

/// Command-line overrides, applied on top of the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub listener: Option<String>,
    pub offline: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    #[serde(default)]
    listener: ListenerFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListenerFile {
    enabled: Option<bool>,
    addr: Option<String>,
}

impl Config {
    /// Resolves the session configuration from `./stocktake.toml` and the
    /// command-line flags. Returns a deferred warning when the config file
    /// was present but unusable (logging is not up yet at this point).
    pub fn resolve(overrides: Overrides) -> (Self, Option<String>) {
        Self::resolve_from(Path::new(CONFIG_PATH), overrides)
    }

    fn resolve_from(config_path: &Path, overrides: Overrides) -> (Self, Option<String>) {
        let (file, warning) = load_config_file(config_path);

        let listener_enabled = file.listener.enabled.unwrap_or(true);
        let mut config = Config {
            db_path: file
                .db_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_path: file
                .log_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            listener: listener_enabled.then(|| {
                file.listener
                    .addr
                    .unwrap_or_else(|| DEFAULT_LISTENER_ADDR.to_string())
            }),
        };

        if let Some(db_path) = overrides.db_path {
            config.db_path = db_path;
        }
        if let Some(log_path) = overrides.log_path {
            config.log_path = log_path;
        }
        if let Some(listener) = overrides.listener {
            config.listener = Some(listener);
        }
        if overrides.offline {
            config.listener = None;
        }

        (config, warning)
    }
}

fn load_config_file(path: &Path) -> (ConfigFile, Option<String>) {
    let contents = match fs_err::read_to_string(path) {
        Ok(contents) => contents,
        // Missing config is the common case, not a problem.
        Err(_) => return (ConfigFile::default(), None),
    };

    match toml::from_str(&contents) {
        Ok(file) => (file, None),
        Err(err) => (ConfigFile::default(), Some(err.to_string())),
    }
}
