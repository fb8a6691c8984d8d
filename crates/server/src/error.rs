use thiserror::Error;

/// Errors loading or checking the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur when starting the fulfillment server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A Kafka client could not be created or subscribed.
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// The HTTP client for the commit service could not be built.
    #[error("transport error: {0}")]
    Transport(#[from] fulfillment_transaction::TransportError),

    #[error("gateway error: {0}")]
    Gateway(#[from] fulfillment_gateway::GatewayError),
}
