/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the data directory when the config
/// file leaves it empty.
pub const DATA_DIR_ENV: &str = "STATEHOLD_DATA_DIR";

/// Key the dark-mode flag is stored under by default.
const DEFAULT_DARK_MODE_KEY: &str = "useDarkMode";

/// Default per-entry size limit, roughly a browser storage quota.
const DEFAULT_MAX_ENTRY_BYTES: usize = 5 * 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the state database. Empty = resolved at runtime.
    pub data_dir: String,
    /// Store key for the dark-mode flag.
    pub dark_mode_key: String,
    /// Dark-mode value used when nothing is stored. `None` = ask the OS.
    pub dark_mode_default: Option<bool>,
    /// Largest serialized entry the medium accepts. 0 = no limit.
    pub max_entry_bytes: usize,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            dark_mode_key: DEFAULT_DARK_MODE_KEY.to_string(),
            dark_mode_default: None,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `statehold.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("statehold.json")))
            .unwrap_or_else(|| PathBuf::from("statehold.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        let (config, problem) = Self::load_checked(path);
        if let Some(problem) = problem {
            tracing::warn!("{problem}");
        }
        config
    }

    /// Same as [`AppConfig::load_or_create`], but hands the failure back
    /// instead of logging it, for callers that set up logging from the
    /// loaded config.
    pub fn load_checked(path: &Path) -> (Self, Option<String>) {
        if path.exists() {
            let problem = match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return (config, None);
                    }
                    Err(e) => format!("Failed to parse config at {}: {e}", path.display()),
                },
                Err(e) => format!("Failed to read config at {}: {e}", path.display()),
            };
            // Return defaults on error (don't overwrite broken file)
            (Self::default(), Some(problem))
        } else {
            let config = Self::default();
            let problem = config.save(path).err().map(|e| {
                format!("Failed to create default config at {}: {e}", path.display())
            });
            (config, problem)
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Resolves the data directory.
    ///
    /// Resolution order:
    /// 1. `data_dir` from the config file (if non-empty)
    /// 2. `STATEHOLD_DATA_DIR` environment variable
    /// 3. `.data/` directory next to the executable
    pub fn resolve_data_dir(&self) -> PathBuf {
        if !self.data_dir.is_empty() {
            return PathBuf::from(&self.data_dir);
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        exe.parent().unwrap_or(Path::new(".")).join(".data")
    }

    /// The medium's per-entry limit, if any.
    pub fn entry_limit(&self) -> Option<usize> {
        (self.max_entry_bytes > 0).then_some(self.max_entry_bytes)
    }

    /// Resets blank or invalid fields to their defaults.
    pub fn sanitize(&mut self) {
        let trimmed = self.dark_mode_key.trim();
        if trimmed.is_empty() {
            self.dark_mode_key = DEFAULT_DARK_MODE_KEY.to_string();
        } else if trimmed.len() != self.dark_mode_key.len() {
            self.dark_mode_key = trimmed.to_string();
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
        self.data_dir = self.data_dir.trim().to_string();
    }
}
