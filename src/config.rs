use crate::error::{CaptionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration, loaded from an optional TOML file and overridden
/// by environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// API key for the cloud speech and translation services.
    pub api_key: Option<String>,
    /// Language the recognition service transcribes into.
    pub base_language: String,
    /// Fixed duration of each audio segment in seconds.
    pub segment_duration_secs: u64,
    /// Sample rate of extracted audio in Hz.
    pub sample_rate_hz: u32,
    /// Number of channels in extracted audio.
    pub channels: u16,
    /// Number of concurrent recognition requests per video.
    pub concurrency: usize,
    /// Maximum number of videos kept in the caption store before the
    /// oldest set is evicted.
    pub max_videos: usize,
    /// Timeout applied to each external call (recognition, translation,
    /// segmentation) in seconds.
    pub request_timeout_secs: u64,
    /// Root directory for per-request scratch storage. Defaults to the
    /// system temp directory when unset.
    pub scratch_dir: Option<PathBuf>,
    /// Directory of static assets served at `/`.
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            api_key: None,
            base_language: "en-US".to_string(),
            segment_duration_secs: 10,
            sample_rate_hz: 16_000,
            channels: 1,
            concurrency: 4,
            max_videos: 64,
            request_timeout_secs: 60,
            scratch_dir: None,
            static_dir: PathBuf::from("public"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(port) = std::env::var("CAPTIOND_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(lang) = std::env::var("CAPTIOND_BASE_LANGUAGE") {
            config.base_language = lang;
        }
        if let Ok(secs) = std::env::var("CAPTIOND_SEGMENT_SECS") {
            if let Ok(s) = secs.parse() {
                config.segment_duration_secs = s;
            }
        }
        if let Ok(concurrency) = std::env::var("CAPTIOND_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }
        if let Ok(dir) = std::env::var("CAPTIOND_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("CAPTIOND_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(CaptionError::Config(
                "GOOGLE_API_KEY not set. Export it with: export GOOGLE_API_KEY=...".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(CaptionError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.segment_duration_secs == 0 {
            return Err(CaptionError::Config(
                "Segment duration must be greater than 0".to_string(),
            ));
        }

        if self.max_videos == 0 {
            return Err(CaptionError::Config(
                "Caption store capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("captiond").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.segment_duration_secs, 10);
        assert_eq!(config.sample_rate_hz, 16_000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.base_language, "en-US");
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_validate_missing_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_with_api_key() {
        let config = Config {
            api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config {
            api_key: Some("test-key".to_string()),
            concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_segment_duration() {
        let config = Config {
            api_key: Some("test-key".to_string()),
            segment_duration_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
