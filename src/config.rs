//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before serving.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    #[serde(default)]
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream tarot API configuration
    pub upstream: UpstreamConfig,
    /// Translation configuration
    pub translation: TranslationConfig,
    /// Cache configuration
    pub cache: CacheSettings,
    /// Periodic cache sweep configuration
    pub sweep: SweepConfig,
    /// Frontend serving configuration
    pub frontend: FrontendConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Upstream tarot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the tarot card API
    pub base_url: String,
    /// Timeout for card fetches
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Timeout for the status probe
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tarotapi.dev/api/v1".to_string(),
            timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Enable translation (when disabled, text passes through untouched)
    pub enabled: bool,
    /// Translation endpoint (a gtx-compatible HTTP endpoint)
    pub endpoint: String,
    /// Source language code
    pub source: String,
    /// Target language code
    pub target: String,
    /// Maximum characters sent per request; longer text is truncated
    pub max_chars: usize,
    /// Timeout for translation requests
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            source: "en".to_string(),
            target: "pt".to_string(),
            max_chars: 500,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Settings for both process caches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache for raw upstream card data
    pub cards: CacheConfig,
    /// Cache for translated strings
    pub translations: CacheConfig,
}

impl Default for CacheSettings {
    /// Card data is small and short-lived; translated strings are
    /// plentiful and stable.
    fn default() -> Self {
        Self {
            cards: CacheConfig::default(),
            translations: CacheConfig {
                max_entries: 200,
                ttl: Duration::from_secs(3600),
            },
        }
    }
}

/// Configuration for one cache instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries before eviction
    pub max_entries: usize,
    /// Time-to-live for entries
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10,
            ttl: Duration::from_secs(300),
        }
    }
}

/// Periodic cache sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Enable the background sweep task
    pub enabled: bool,
    /// Interval between sweeps
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(300),
        }
    }
}

/// Frontend serving configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Directory holding the single-page frontend assets
    pub static_dir: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            static_dir: "static".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (TAROT_GATEWAY_ prefix)
        figment = figment.merge(Env::prefixed("TAROT_GATEWAY_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Load env files into process environment
        config.load_env_files();

        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => {
                        tracing::info!("Loaded env file: {expanded}");
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load env file {expanded}: {e}");
                    }
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.upstream.base_url, "https://tarotapi.dev/api/v1");
        assert_eq!(config.cache.cards.max_entries, 10);
        assert_eq!(config.cache.cards.ttl, Duration::from_secs(300));
        assert_eq!(config.sweep.interval, Duration::from_secs(300));
        assert!(config.translation.enabled);
    }

    #[test]
    fn translation_cache_defaults_are_larger_and_longer() {
        let config = Config::default();
        assert_eq!(config.cache.translations.max_entries, 200);
        assert_eq!(config.cache.translations.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "server:\n  port: 8080\ncache:\n  cards:\n    max_entries: 42\n    ttl: 2m\nsweep:\n  enabled: false"
        )
        .unwrap();

        let config: Config = Figment::new()
            .merge(Yaml::file(file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.cards.max_entries, 42);
        assert_eq!(config.cache.cards.ttl, Duration::from_secs(120));
        assert!(!config.sweep.enabled);
        // Unset sections keep their defaults.
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.translation.target, "pt");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/gateway.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
