use serde::Deserialize;

/// Log output configuration.
///
/// `FULFILLMENT_LOG` or `RUST_LOG`, when set, take precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `"info"` or `"fulfillment_gateway=debug"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Colorize output.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            ansi: default_ansi(),
        }
    }
}

fn default_level() -> String {
    "info".to_owned()
}

fn default_ansi() -> bool {
    true
}
