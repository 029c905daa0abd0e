// Configuration layer for backend client creation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::http::HttpBackend;
use crate::memory::MemoryBackend;
use crate::traits::Backend;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Which backend implementation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON over HTTP to the recommendation server
    #[default]
    Http,
    /// In-process store with echo replies
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Server root, e.g. "http://localhost:5000" (the `/api/...` paths are appended)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout for HTTP calls
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Artificial reply latency for the memory backend
    #[serde(default)]
    pub memory_latency_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Http,
            base_url: default_base_url(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            memory_latency_ms: 0,
        }
    }
}

impl BackendConfig {
    pub fn http(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn memory() -> Self {
        Self {
            kind: BackendKind::Memory,
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_memory_latency_ms(mut self, latency_ms: u64) -> Self {
        self.memory_latency_ms = latency_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Factory for creating backends from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
        match config.kind {
            BackendKind::Http => {
                let backend = HttpBackend::new(config)?;
                Ok(Arc::new(backend))
            }
            BackendKind::Memory => {
                let backend = MemoryBackend::new()
                    .with_latency(Duration::from_millis(config.memory_latency_ms));
                Ok(Arc::new(backend))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.kind, BackendKind::Http);
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: BackendConfig = serde_json::from_str(r#"{"kind": "memory"}"#).unwrap();
        assert_eq!(config.kind, BackendKind::Memory);
        assert_eq!(config.timeout_ms, 120_000);
    }

    #[test]
    fn test_factory_rejects_blank_url() {
        let config = BackendConfig::http("   ");
        let err = ClientFactory::create_backend(&config).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_factory_builds_memory_backend() {
        let config = BackendConfig::memory().with_memory_latency_ms(5);
        assert!(ClientFactory::create_backend(&config).is_ok());
    }
}
