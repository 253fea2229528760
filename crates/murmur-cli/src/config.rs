//! Configuration file support

use murmur_ai::{RequestMode, SourceConfig};
use murmur_store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for murmur
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inference endpoint URL
    pub endpoint: String,
    /// Request body encoding (ask, multipart)
    pub request_mode: RequestMode,
    /// Pause after the interim update, in milliseconds
    pub interim_delay_ms: u64,
    /// Pause between tokens, in milliseconds
    pub token_delay_ms: u64,
    /// Token shown while the answer is prepared
    pub interim_message: String,
    /// Question sent when the prompt is empty
    pub default_question: String,
    /// Store backend (disabled, memory)
    pub store: StoreBackend,
}

impl Default for Config {
    fn default() -> Self {
        let source = SourceConfig::default();
        Self {
            endpoint: source.endpoint,
            request_mode: source.request_mode,
            interim_delay_ms: source.interim_delay.as_millis() as u64,
            token_delay_ms: source.token_delay.as_millis() as u64,
            interim_message: source.interim_message,
            default_question: source.default_question,
            store: StoreBackend::default(),
        }
    }
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("murmur")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("MURMUR_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse config text, falling back to defaults on error
    pub fn parse(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        Self::default().save()?;
        Ok(path)
    }

    /// Settings for the update source
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            endpoint: self.endpoint.clone(),
            request_mode: self.request_mode,
            interim_delay: Duration::from_millis(self.interim_delay_ms),
            token_delay: Duration::from_millis(self.token_delay_ms),
            interim_message: self.interim_message.clone(),
            default_question: self.default_question.clone(),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# murmur configuration file
# Place at ~/.config/murmur/config.toml (Linux/Mac) or %APPDATA%\murmur\config.toml (Windows)

# Inference endpoint
endpoint = "http://localhost:8000/ask"

# Request body encoding: "ask" sends {"question": ...} as JSON,
# "multipart" sends the full turn options plus attached files
request_mode = "ask"

# Pacing of the rendered answer
interim_delay_ms = 500
token_delay_ms = 80

# Shown while the answer is being prepared
interim_message = "Searching for movies..."

# Asked when no prompt is given
default_question = "Which movie has humans fighting against AI?"

# Conversation store: "disabled" keeps nothing, "memory" keeps the
# current process's conversations
store = "disabled"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let cfg: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:8000/ask");
        assert_eq!(cfg.request_mode, RequestMode::Ask);
        assert_eq!(cfg.store, StoreBackend::Disabled);
        assert_eq!(cfg.token_delay_ms, 80);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = Config::parse("store = \"memory\"\nrequest_mode = \"multipart\"\n");
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.request_mode, RequestMode::Multipart);
        assert_eq!(cfg.interim_delay_ms, 500);
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let cfg = Config::parse("store = 42");
        assert_eq!(cfg.store, StoreBackend::Disabled);
    }

    #[test]
    fn test_source_config_conversion() {
        let cfg = Config {
            token_delay_ms: 0,
            ..Config::default()
        };
        let source = cfg.source_config();
        assert_eq!(source.token_delay, Duration::ZERO);
        assert_eq!(source.interim_delay, Duration::from_millis(500));
    }
}
