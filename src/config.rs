//! Discovery options, optionally loaded from a TOML file.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// User-Agent sent when the caller does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("feedfinder2/", env!("CARGO_PKG_VERSION"));

/// Per-fetch timeout used when none (or zero) is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024; // 10MB

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
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Options for a feed discovery run.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run every stage of the cascade instead of stopping at the first
    /// stage that confirms a feed.
    pub exhaustive: bool,

    /// User-Agent header. `None` means [`DEFAULT_USER_AGENT`].
    pub user_agent: Option<String>,

    /// Per-fetch timeout in seconds. 0 = default (60s).
    pub timeout_secs: u64,

    /// Responses larger than this are dropped as fetch failures.
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exhaustive: false,
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; anything else goes through
    /// [`Config::from_toml_str`]. Files over 1 MB are rejected unread.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        tracing::info!(path = %path.display(), exhaustive = config.exhaustive, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text. Blank input yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["exhaustive", "user_agent", "timeout_secs", "max_body_bytes"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        Ok(toml::from_str(content)?)
    }

    /// The per-fetch timeout; zero means the default.
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// The configured User-Agent, or `feedfinder2/<version>`.
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
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
        assert!(!config.exhaustive);
        assert!(config.user_agent.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_default_user_agent_carries_version() {
        let config = Config::default();
        assert!(config.user_agent().starts_with("feedfinder2/"));
        assert_eq!(
            config.user_agent(),
            format!("feedfinder2/{}", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedfinder2_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("feedfinder2_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml_str("exhaustive = true\n").unwrap();
        assert!(config.exhaustive);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("feedfinder2_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
exhaustive = true
user_agent = "my-crawler/2.0"
timeout_secs = 15
max_body_bytes = 1024
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.exhaustive);
        assert_eq!(config.user_agent(), "my-crawler/2.0");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.max_body_bytes, 1024);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_toml_str("this is not [valid toml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
exhaustive = false
totally_fake_key = "should not fail"
"#;
        let config = Config::from_toml_str(content).unwrap();
        assert!(!config.exhaustive);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        // timeout_secs should be an integer, not a string
        assert!(Config::from_toml_str("timeout_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("feedfinder2_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
