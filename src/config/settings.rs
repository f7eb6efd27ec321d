use config::ConfigError;
use serde::Deserialize;

/// Top-level configuration settings for the gateway.
///
/// Groups the UDP listener, broker instance, coordination store and logging
/// sections.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub broker: BrokerSettings,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

/// Where the gateway listens for datagrams and how it identifies itself in
/// GWINFO replies.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub listen_host: String,
    pub listen_port: u16,
    pub gateway_id: u8,
}

/// Broker instance parameters.
///
/// `keepalive_secs` drives both the liveness loop period and the fallback
/// keep-alive window for clients that connect with a zero duration.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub name: String,
    pub keepalive_secs: u64,
    pub drain_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Sled,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub url: String,
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub path: Option<String>,
    pub level: String,
    pub format: LogFormat,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub gateway: Option<PartialGatewaySettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub store: Option<PartialStoreSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialGatewaySettings {
    pub listen_host: Option<String>,
    pub listen_port: Option<u16>,
    pub gateway_id: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub name: Option<String>,
    pub keepalive_secs: Option<u64>,
    pub drain_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialStoreSettings {
    pub backend: Option<StoreBackend>,
    pub url: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub path: Option<String>,
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl Settings {
    /// Reject values the broker cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.keepalive_secs == 0 {
            return Err(ConfigError::Message(
                "broker.keepalive_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Provides default values for `Settings`.
///
/// The broker name defaults to a short random id so two processes started
/// without configuration never share owned-client keys.
impl Default for Settings {
    fn default() -> Self {
        let name = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            gateway: GatewaySettings {
                listen_host: "0.0.0.0".to_string(),
                listen_port: 1885,
                gateway_id: 1,
            },
            broker: BrokerSettings {
                name,
                keepalive_secs: 30,
                drain_interval_ms: 10,
            },
            store: StoreSettings {
                backend: StoreBackend::Redis,
                url: "redis://127.0.0.1:6379".to_string(),
                path: "snbroker_db".to_string(),
            },
            logging: LoggingSettings {
                path: Some("/tmp/mqttsn_broker.log".to_string()),
                level: "info".to_string(),
                format: LogFormat::Full,
            },
        }
    }
}

impl PartialSettings {
    /// Merge over `defaults`, field by field.
    pub fn merge(self, defaults: Settings) -> Settings {
        let gateway = self.gateway.unwrap_or_default();
        let broker = self.broker.unwrap_or_default();
        let store = self.store.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        Settings {
            gateway: GatewaySettings {
                listen_host: gateway.listen_host.unwrap_or(defaults.gateway.listen_host),
                listen_port: gateway.listen_port.unwrap_or(defaults.gateway.listen_port),
                gateway_id: gateway.gateway_id.unwrap_or(defaults.gateway.gateway_id),
            },
            broker: BrokerSettings {
                name: broker.name.unwrap_or(defaults.broker.name),
                keepalive_secs: broker.keepalive_secs.unwrap_or(defaults.broker.keepalive_secs),
                drain_interval_ms: broker
                    .drain_interval_ms
                    .unwrap_or(defaults.broker.drain_interval_ms),
            },
            store: StoreSettings {
                backend: store.backend.unwrap_or(defaults.store.backend),
                url: store.url.unwrap_or(defaults.store.url),
                path: store.path.unwrap_or(defaults.store.path),
            },
            logging: LoggingSettings {
                path: logging.path.or(defaults.logging.path),
                level: logging.level.unwrap_or(defaults.logging.level),
                format: logging.format.unwrap_or(defaults.logging.format),
            },
        }
    }
}
