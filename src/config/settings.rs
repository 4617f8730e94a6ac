use serde::Deserialize;

/// Top-level configuration settings for the relay.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the message broker.
///
/// Durations are in milliseconds so they can be set from plain numbers in
/// files and environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub name: String,
    pub queue_capacity: usize,
    pub delivery_timeout_ms: u64,
    pub subscriber_timeout_ms: u64,
    /// Buffer for subscribers created by the binary.
    pub subscriber_buffer: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub name: Option<String>,
    pub queue_capacity: Option<usize>,
    pub delivery_timeout_ms: Option<u64>,
    pub subscriber_timeout_ms: Option<u64>,
    pub subscriber_buffer: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                name: "default".to_string(),
                queue_capacity: 1000,
                delivery_timeout_ms: 5000,
                subscriber_timeout_ms: 1000,
                subscriber_buffer: 64,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Overlay whatever was provided on top of `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let broker = self.broker;
        let logging = self.logging;

        Settings {
            broker: BrokerSettings {
                name: broker
                    .as_ref()
                    .and_then(|b| b.name.clone())
                    .unwrap_or(default.broker.name),
                queue_capacity: broker
                    .as_ref()
                    .and_then(|b| b.queue_capacity)
                    .unwrap_or(default.broker.queue_capacity),
                delivery_timeout_ms: broker
                    .as_ref()
                    .and_then(|b| b.delivery_timeout_ms)
                    .unwrap_or(default.broker.delivery_timeout_ms),
                subscriber_timeout_ms: broker
                    .as_ref()
                    .and_then(|b| b.subscriber_timeout_ms)
                    .unwrap_or(default.broker.subscriber_timeout_ms),
                subscriber_buffer: broker
                    .as_ref()
                    .and_then(|b| b.subscriber_buffer)
                    .unwrap_or(default.broker.subscriber_buffer),
            },
            logging: LoggingSettings {
                level: logging
                    .and_then(|l| l.level)
                    .unwrap_or(default.logging.level),
            },
        }
    }
}
