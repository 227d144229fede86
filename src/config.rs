//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    /// Upper bound on request bodies (schema imports can be large)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Layer storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one `<id>.json` file per layer
    pub layers_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            layers_dir: PathBuf::from("./layers"),
        }
    }
}

/// Schema source configuration
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Serialized schema export served by `GET /api/schema`
    pub schema_export_path: Option<PathBuf>,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server = ServerConfig {
            host: var("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.server.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.server.port),
            max_body_bytes: var("MAX_BODY_BYTES")
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.server.max_body_bytes),
        };

        let storage = match var("LAYERS_DIR") {
            Some(dir) if dir.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "LAYERS_DIR must not be empty".to_string(),
                ));
            }
            Some(dir) => StorageConfig {
                layers_dir: PathBuf::from(dir.trim()),
            },
            None => defaults.storage,
        };

        let import = ImportConfig {
            schema_export_path: var("SCHEMA_EXPORT_PATH")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        };

        let cors = CorsConfig {
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors.allowed_origins),
        };

        Ok(Self {
            server,
            storage,
            import,
            cors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.storage.layers_dir, PathBuf::from("./layers"));
        assert!(settings.import.schema_export_path.is_none());
        assert_eq!(settings.server.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let settings = Settings::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("LAYERS_DIR", "/var/lib/layers"),
            ("SCHEMA_EXPORT_PATH", "./export.json"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]))
        .unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.storage.layers_dir, PathBuf::from("/var/lib/layers"));
        assert_eq!(
            settings.import.schema_export_path,
            Some(PathBuf::from("./export.json"))
        );
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_empty_layers_dir_is_rejected() {
        let result = Settings::from_lookup(lookup(&[("LAYERS_DIR", "  ")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
