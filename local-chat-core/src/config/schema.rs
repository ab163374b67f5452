//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for local-chat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Completion service configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Conversation storage and titling
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files, relative paths resolve against the config dir
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Local completion service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Ollama-compatible service
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Deadline for a single request in seconds, 0 disables it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// What a rename does when the new title is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TitleCollision {
    /// Replace the existing conversation, discarding its history
    #[default]
    Overwrite,
    /// Append " (2)", " (3)", ... until the title is free
    Disambiguate,
}

/// Conversation storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the conversation document
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Title given to a conversation before it is auto-titled
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,
    /// Rename collision policy
    #[serde(default)]
    pub title_collision: TitleCollision,
}

fn default_store_path() -> String {
    "conversations.json".to_string()
}

fn default_placeholder_title() -> String {
    "New chat".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            placeholder_title: default_placeholder_title(),
            title_collision: TitleCollision::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_service() {
        let config = Config::default();
        assert_eq!(config.provider.api_base, "http://localhost:11434");
        assert_eq!(config.session.store_path, "conversations.json");
        assert_eq!(config.session.placeholder_title, "New chat");
        assert_eq!(config.session.title_collision, TitleCollision::Overwrite);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"session":{"title_collision":"disambiguate"}}"#).unwrap();
        assert_eq!(config.session.title_collision, TitleCollision::Disambiguate);
        assert_eq!(config.session.placeholder_title, "New chat");
        assert_eq!(config.provider.request_timeout_secs, 120);
    }
}
