use crate::error::{BizosError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// WatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    800
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Store file name, relative to `.bizos/`.
    #[serde(default = "default_store_file")]
    pub store_file: String,
    /// Shown when a founder left their location blank.
    #[serde(default = "default_location")]
    pub default_location: String,
    #[serde(default)]
    pub watch: WatchConfig,
}

fn default_version() -> u32 {
    1
}

fn default_store_file() -> String {
    paths::DEFAULT_STORE_FILE.to_string()
}

fn default_location() -> String {
    "USA".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            store_file: default_store_file(),
            default_location: default_location(),
            watch: WatchConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(BizosError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`] but an uninitialized project gets defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(BizosError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        paths::store_path(root, &self.store_file)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let store_file = self.store_file.trim();
        if store_file.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "store_file is empty".to_string(),
            });
        } else if Path::new(store_file).is_absolute() || store_file.contains("..") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("store_file '{store_file}' must be a path inside .bizos/"),
            });
        }

        if self.watch.poll_interval_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "watch.poll_interval_ms is 0; polling every 1ms".to_string(),
            });
        } else if self.watch.poll_interval_ms > 60_000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "watch.poll_interval_ms is {}; other processes' changes will show up slowly",
                    self.watch.poll_interval_ms
                ),
            });
        }

        if self.default_location.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "default_location is empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.watch.poll_interval_ms = 250;
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.watch.poll_interval_ms, 250);
        assert_eq!(loaded.store_file, "store.json");
    }

    #[test]
    fn missing_config_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(BizosError::NotInitialized)
        ));
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.default_location, "USA");
    }

    #[test]
    fn sparse_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("store_file: progress.json\n").unwrap();
        assert_eq!(cfg.store_file, "progress.json");
        assert_eq!(cfg.watch.poll_interval_ms, 800);
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn default_config_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_escaping_store_path() {
        let cfg = Config {
            store_file: "../elsewhere.json".to_string(),
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
    }

    #[test]
    fn validate_flags_zero_poll_interval() {
        let mut cfg = Config::default();
        cfg.watch.poll_interval_ms = 0;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("poll_interval_ms")));
        assert_eq!(cfg.watch.poll_interval(), Duration::from_millis(1));
    }
}
