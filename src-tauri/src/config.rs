//! Backend Configuration
//!
//! `pantry.json` in the app data directory selects the document store.
//! A missing file means the local SQLite store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "pantry.json";
pub const DEFAULT_DB_FILE: &str = "pantry.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_FIRESTORE_PROJECT: &str = "PANTRY_FIRESTORE_PROJECT";
pub const ENV_FIRESTORE_API_KEY: &str = "PANTRY_FIRESTORE_API_KEY";

/// Which document store backs the pantry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// SQLite file; relative paths resolve against the data directory
    Local {
        #[serde(default)]
        db_file: Option<PathBuf>,
    },
    /// Process-local, lost on exit
    Memory,
    Firestore {
        project_id: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        database: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local { db_file: None }
    }
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Local { .. } => "local",
            BackendConfig::Memory => "memory",
            BackendConfig::Firestore { .. } => "firestore",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryConfig {
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config IO error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl PantryConfig {
    /// Read the config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Like `load`, but writes the defaults out when no file exists yet
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Apply `PANTRY_FIRESTORE_*` environment overrides
    pub fn apply_env(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_FIRESTORE_PROJECT).ok(),
            std::env::var(ENV_FIRESTORE_API_KEY).ok(),
        )
    }

    /// A non-empty project id switches to Firestore; an api key alone only
    /// replaces the key of an already-Firestore config.
    pub fn with_overrides(mut self, project_id: Option<String>, api_key: Option<String>) -> Self {
        let project_id = project_id.filter(|p| !p.is_empty());
        let api_key = api_key.filter(|k| !k.is_empty());

        if let BackendConfig::Firestore { project_id: current, api_key: key, .. } = &mut self.backend {
            if let Some(project) = project_id {
                *current = project;
            }
            if api_key.is_some() {
                *key = api_key;
            }
        } else if let Some(project) = project_id {
            self.backend = BackendConfig::Firestore {
                project_id: project,
                api_key,
                database: None,
                timeout_secs: None,
            };
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = PantryConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, PantryConfig::default());
        assert_eq!(config.backend.kind(), "local");
    }

    #[test]
    fn test_parse_firestore_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"backend": {"kind": "firestore", "project_id": "pantryapp", "api_key": "k"}}"#,
        )
        .unwrap();

        let config = PantryConfig::load(&path).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Firestore {
                project_id: "pantryapp".to_string(),
                api_key: Some("k".to_string()),
                database: None,
                timeout_secs: None,
            }
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = PantryConfig {
            backend: BackendConfig::Local {
                db_file: Some(PathBuf::from("custom.db")),
            },
        };
        config.save(&path).unwrap();
        assert_eq!(PantryConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = PantryConfig::load_or_init(&path).unwrap();
        assert_eq!(config, PantryConfig::default());
        assert!(path.exists());
        assert_eq!(PantryConfig::load(&path).unwrap(), config);

        let custom = PantryConfig { backend: BackendConfig::Memory };
        custom.save(&path).unwrap();
        assert_eq!(PantryConfig::load_or_init(&path).unwrap(), custom);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"backend": {"kind": "cloud"}}"#).unwrap();

        let err = PantryConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_project_override_switches_backend() {
        let config = PantryConfig::default()
            .with_overrides(Some("pantryapp".to_string()), Some("key".to_string()));
        assert_eq!(config.backend.kind(), "firestore");
        if let BackendConfig::Firestore { project_id, api_key, .. } = config.backend {
            assert_eq!(project_id, "pantryapp");
            assert_eq!(api_key.as_deref(), Some("key"));
        }
    }

    #[test]
    fn test_key_override_alone_keeps_local() {
        let config = PantryConfig::default().with_overrides(None, Some("key".to_string()));
        assert_eq!(config.backend, BackendConfig::default());

        let config = PantryConfig::default().with_overrides(Some(String::new()), None);
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn test_key_override_on_firestore_config() {
        let config = PantryConfig {
            backend: BackendConfig::Firestore {
                project_id: "p".to_string(),
                api_key: None,
                database: Some("pantry-db".to_string()),
                timeout_secs: Some(5),
            },
        }
        .with_overrides(None, Some("new-key".to_string()));

        assert_eq!(
            config.backend,
            BackendConfig::Firestore {
                project_id: "p".to_string(),
                api_key: Some("new-key".to_string()),
                database: Some("pantry-db".to_string()),
                timeout_secs: Some(5),
            }
        );
    }
}
