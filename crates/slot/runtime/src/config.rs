//! System configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SystemError, SystemResult};

/// System configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Display name of the system
    pub name: String,

    /// Operations kept for rollback
    pub history_capacity: usize,

    /// Place requests on submission instead of queueing them
    pub auto_allocate: bool,

    /// Tracing directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "Slot Allocation System".into(),
            history_capacity: 100,
            auto_allocate: true,
            log_filter: "info".into(),
        }
    }
}

impl SystemConfig {
    /// Load configuration from a TOML file.
    ///
    /// Without a path the per-user config directory is used. A missing
    /// file yields the defaults.
    pub fn load(path: Option<&Path>) -> SystemResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> SystemResult<Self> {
        let config: SystemConfig =
            toml::from_str(contents).map_err(|e| SystemError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SystemResult<()> {
        if self.history_capacity == 0 {
            return Err(SystemError::Config("history_capacity must be > 0".into()));
        }
        if self.name.trim().is_empty() {
            return Err(SystemError::Config("name must not be empty".into()));
        }
        Ok(())
    }

    fn default_config_path() -> SystemResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SystemError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("slot-alloc").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SystemConfig::default();
        assert_eq!(config.history_capacity, 100);
        assert!(config.auto_allocate);
        assert_eq!(config.log_filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_config() {
        let config = SystemConfig::load(Some(Path::new("/nonexistent/path/config.toml"))).unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"Garage\"\nhistory_capacity = 5").unwrap();

        let config = SystemConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.name, "Garage");
        assert_eq!(config.history_capacity, 5);
        assert!(config.auto_allocate);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SystemConfig::from_toml_str("history_capacity = 0").unwrap_err();
        assert!(matches!(err, SystemError::Config(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SystemConfig::from_toml_str("history_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, SystemError::Config(_)));
    }
}
