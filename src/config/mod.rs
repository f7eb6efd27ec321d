mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    BrokerSettings, GatewaySettings, LogFormat, LoggingSettings, Settings, StoreBackend,
    StoreSettings,
};

/// Loads the configuration and merges it over default values.
///
/// When `path` is given that file must exist; otherwise `config/default` is
/// read if present. Environment variables prefixed with `SNBROKER` override
/// both, using `__` between section and key (`SNBROKER_BROKER__KEEPALIVE_SECS`).
/// A zero `broker.keepalive_secs` is rejected.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("config/default").required(false),
    };

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix("SNBROKER")
            .prefix_separator("_")
            .separator("__"),
    );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = partial.merge(Settings::default());
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests;
