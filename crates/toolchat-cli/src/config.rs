use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toolchat_client::BackendConfig;
use toolchat_core::DEFAULT_UTC_OFFSET_MINUTES;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Offset used for date and time labels
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

fn default_utc_offset_minutes() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Fixed user id; wins over the stored one
    #[serde(default)]
    pub user_id: Option<String>,
    /// Where the generated user id is kept (defaults to the platform data dir)
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set, "dev" otherwise)
    /// 3. Environment variables, e.g. TOOLCHAT_BACKEND__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TOOLCHAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_client::BackendKind;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [backend]
            kind = "memory"
            base_url = "http://127.0.0.1:8000"
            timeout_ms = 3000

            [display]
            utc_offset_minutes = 0

            [logging]
            level = "debug"
            format = "json"

            [identity]
            user_id = "user-42"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.backend.timeout_ms, 3000);
        assert_eq!(config.display.utc_offset_minutes, 0);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.identity.user_id.as_deref(), Some("user-42"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.display.utc_offset_minutes, 420);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.identity.state_dir, None);
    }
}
