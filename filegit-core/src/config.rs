//! Locations of filegit's persisted state and user tunables.
//!
//! Everything lives under a single root directory:
//! ```text
//! ~/.filegit/
//!   config.toml      # Settings (optional)
//!   index.db         # Commit index (SQLite)
//!   watchlist.json   # Files watched by the daemon
//!   daemon.pid
//!   daemon.log
//!   objects/
//!     <sha256 hex>   # One blob per distinct content
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the state root.
pub const HOME_ENV: &str = "FILEGIT_HOME";

const ROOT_DIR_NAME: &str = ".filegit";

/// Well-known paths, passed explicitly to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub objects_dir: PathBuf,
    pub index_path: PathBuf,
    pub watchlist_path: PathBuf,
    pub settings_path: PathBuf,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            objects_dir: root.join("objects"),
            index_path: root.join("index.db"),
            watchlist_path: root.join("watchlist.json"),
            settings_path: root.join("config.toml"),
            pid_path: root.join("daemon.pid"),
            log_path: root.join("daemon.log"),
            root,
        }
    }

    /// Resolves the root from `FILEGIT_HOME`, falling back to `~/.filegit`.
    pub fn discover() -> Self {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::from_root(PathBuf::from(root));
        }

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::from_root(home.join(ROOT_DIR_NAME))
    }

    pub fn is_initialized(&self) -> bool {
        self.objects_dir.is_dir() && self.index_path.is_file()
    }

    /// Loads `config.toml`, returning defaults when it does not exist.
    pub fn load_settings(&self) -> Result<Settings> {
        match std::fs::read_to_string(&self.settings_path) {
            Ok(text) => Settings::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub watcher: WatcherSettings,
    pub log: LogSettings,
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub(crate) fn default_file_contents() -> &'static str {
        r#"# filegit configuration

[watcher]
# Window used to coalesce bursts of filesystem events.
debounce_ms = 500
# Delay before reading a changed file, so writers can finish.
settle_ms = 100

[log]
# Level used for daemon.log (trace, debug, info, warn, error).
level = "info"
"#
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub debounce_ms: u64,
    pub settle_ms: u64,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            settle_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
