//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/marginalia.sqlite"
//!
//! [fetch]
//! timeout_secs = 10
//!
//! [extraction]
//! min_content_chars = 140
//!
//! [reading]
//! words_per_minute = 225
//! ```
//!
//! Only `[db]` is required; every other section has defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::readability::DEFAULT_MIN_CONTENT_CHARS;
use crate::reading_time::DEFAULT_WORDS_PER_MINUTE;

/// Browser-like agent; some origins reject default or empty agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
        }
    }
}

fn default_min_content_chars() -> usize {
    DEFAULT_MIN_CONTENT_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReadingConfig {
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
        }
    }
}

fn default_words_per_minute() -> u32 {
    DEFAULT_WORDS_PER_MINUTE
}

impl Config {
    /// Defaults with a database under `./data`, for commands that run
    /// without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/marginalia.sqlite"),
            },
            fetch: FetchConfig::default(),
            extraction: ExtractionConfig::default(),
            reading: ReadingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }
    if config.fetch.user_agent.trim().is_empty() {
        anyhow::bail!("fetch.user_agent must not be empty");
    }
    if config.reading.words_per_minute == 0 {
        anyhow::bail!("reading.words_per_minute must be > 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_db_is_required() {
        let cfg = parse_config("[db]\npath = \"/tmp/x.sqlite\"\n").unwrap();
        assert_eq!(cfg.fetch.timeout_secs, 10);
        assert_eq!(cfg.extraction.min_content_chars, DEFAULT_MIN_CONTENT_CHARS);
        assert_eq!(cfg.reading.words_per_minute, 225);
        assert!(cfg.fetch.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn missing_db_is_rejected() {
        assert!(parse_config("[fetch]\ntimeout_secs = 5\n").is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = parse_config("[db]\npath = \"x\"\n[fetch]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn zero_reading_rate_is_rejected() {
        let err =
            parse_config("[db]\npath = \"x\"\n[reading]\nwords_per_minute = 0\n").unwrap_err();
        assert!(err.to_string().contains("words_per_minute"));
    }

    #[test]
    fn overrides_are_read() {
        let cfg = parse_config(
            "[db]\npath = \"x\"\n[fetch]\ntimeout_secs = 3\nuser_agent = \"test-agent\"\n[extraction]\nmin_content_chars = 20\n",
        )
        .unwrap();
        assert_eq!(cfg.fetch.timeout_secs, 3);
        assert_eq!(cfg.fetch.user_agent, "test-agent");
        assert_eq!(cfg.extraction.min_content_chars, 20);
    }
}
