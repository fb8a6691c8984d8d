mod commit;
mod kafka;
mod logging;


pub use commit::*;
pub use kafka::*;
pub use logging::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration for the fulfillment server, loaded from a TOML
/// file.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentConfig {
    /// AIT identifier of this service, sent on every commit call.
    #[serde(default = "default_source_id")]
    pub source_id: String,
    /// Outbound commit call.
    #[serde(default)]
    pub commit: CommitConfig,
    /// Kafka topics and clients.
    #[serde(default)]
    pub kafka: KafkaConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FulfillmentConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Self::from_toml("");
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_id.trim().is_empty() {
            return Err(ConfigError::Invalid("source_id must not be empty".into()));
        }
        if self.commit.url.trim().is_empty() {
            return Err(ConfigError::Invalid("commit.url must not be empty".into()));
        }
        if self.commit.attempts == 0 {
            return Err(ConfigError::Invalid(
                "commit.attempts must be at least 1".into(),
            ));
        }
        if self.commit.backoff_delay_max_ms < self.commit.backoff_delay_ms {
            return Err(ConfigError::Invalid(
                "commit.backoff_delay_max_ms must not be below commit.backoff_delay_ms".into(),
            ));
        }
        if self.kafka.request_topic.is_empty() || self.kafka.reply_topic.is_empty() {
            return Err(ConfigError::Invalid(
                "kafka.request_topic and kafka.reply_topic must be set".into(),
            ));
        }
        if self.kafka.workers == 0 {
            return Err(ConfigError::Invalid(
                "kafka.workers must be at least 1".into(),
            ));
        }
        if !self.kafka.consumer.contains_key("group.id") {
            return Err(ConfigError::Invalid(
                "kafka.consumer must set \"group.id\"".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            commit: CommitConfig::default(),
            kafka: KafkaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_source_id() -> String {
    "27834".to_owned()
}
