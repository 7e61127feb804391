//! Configuration file parser for ~/.config/poemfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but is outside its allowed range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the poetry API. HTTPS is required except for localhost.
    pub api_base_url: String,

    /// Number of poems requested by the initial load.
    pub initial_batch_size: usize,

    /// Number of poems requested by each load-more.
    pub page_size: usize,

    /// How close to the tail (in items) the visible position must be
    /// before a load-more is triggered.
    pub prefetch_lookahead: usize,

    /// Delay before the proactive load-more that follows an initial load.
    pub prewarm_delay_ms: u64,

    /// Minimum time the refreshing indicator stays visible.
    pub min_refresh_display_ms: u64,

    /// Upper bound on by-id requests issued for one batch.
    pub max_id_probes: usize,

    /// By-id probes draw candidate ids from `1..=id_range_max`.
    pub id_range_max: i64,

    /// Maximum in-flight requests per strategy.
    pub probe_concurrency: usize,

    /// Extra attempts made by a single random-poem fetch.
    pub fetch_one_retries: u32,

    /// Persist fetched batches to the local cache file.
    pub cache_enabled: bool,

    /// Per-endpoint request timeouts.
    pub timeouts: TimeoutConfig,
}

/// Per-endpoint timeouts in seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub by_id_secs: u64,
    pub search_secs: u64,
    pub by_poet_secs: u64,
    pub random_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            by_id_secs: 5,
            search_secs: 10,
            by_poet_secs: 15,
            random_secs: 3,
        }
    }
}

impl TimeoutConfig {
    pub fn by_id(&self) -> Duration {
        Duration::from_secs(self.by_id_secs)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn by_poet(&self) -> Duration {
        Duration::from_secs(self.by_poet_secs)
    }

    pub fn random(&self) -> Duration {
        Duration::from_secs(self.random_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.ganjoor.net".to_string(),
            initial_batch_size: 30,
            page_size: 10,
            prefetch_lookahead: 3,
            prewarm_delay_ms: 2000,
            min_refresh_display_ms: 600,
            max_id_probes: 40,
            id_range_max: 10_000,
            probe_concurrency: 10,
            fetch_one_retries: 2,
            cache_enabled: false,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "api_base_url",
                "initial_batch_size",
                "page_size",
                "prefetch_lookahead",
                "prewarm_delay_ms",
                "min_refresh_display_ms",
                "max_id_probes",
                "id_range_max",
                "probe_concurrency",
                "fetch_one_retries",
                "cache_enabled",
                "timeouts",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            api = %config.api_base_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reject values the feed cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "initial_batch_size must be at least 1".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.probe_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "probe_concurrency must be at least 1".into(),
            ));
        }
        if self.id_range_max < 1 {
            return Err(ConfigError::Invalid("id_range_max must be at least 1".into()));
        }
        let timeouts = [
            ("timeouts.by_id_secs", self.timeouts.by_id_secs),
            ("timeouts.search_secs", self.timeouts.search_secs),
            ("timeouts.by_poet_secs", self.timeouts.by_poet_secs),
            ("timeouts.random_secs", self.timeouts.random_secs),
        ];
        if let Some((key, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Invalid(format!("{key} must be at least 1")));
        }
        Ok(())
    }

    pub fn prewarm_delay(&self) -> Duration {
        Duration::from_millis(self.prewarm_delay_ms)
    }

    pub fn min_refresh_display(&self) -> Duration {
        Duration::from_millis(self.min_refresh_display_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://api.ganjoor.net");
        assert_eq!(config.initial_batch_size, 30);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.fetch_one_retries, 2);
        assert!(!config.cache_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/poemfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.initial_batch_size, 30);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "page_size = 25\n\n[timeouts]\nsearch_secs = 7\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.initial_batch_size, 30); // default
        assert_eq!(config.timeouts.search_secs, 7);
        assert_eq!(config.timeouts.by_poet_secs, 15); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_zero");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "page_size = 0\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_zero_timeout");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[timeouts]\nby_poet_secs = 0\n").unwrap();

        match Config::load(&path) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("by_poet_secs"), "{msg}"),
            other => panic!("expected Invalid, got {other:?}"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "page_size = = 3").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_are_accepted() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "pagesize = 3\ncache_enabled = true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.cache_enabled);
        assert_eq!(config.page_size, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("poemfeed_config_test_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let padding = "#".repeat(Config::MAX_FILE_SIZE as usize + 1);
        std::fs::write(&path, padding).unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
