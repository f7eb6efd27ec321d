use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry};

use crate::config::{LogFormat, LoggingSettings};
use crate::utils::BrokerError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing for the process.
///
/// Always logs to stdout; when `settings.path` is set, the same events are
/// appended to that file as well. Uses `try_init`, so calling this twice
/// returns an error instead of panicking.
pub fn init(settings: &LoggingSettings) -> Result<(), BrokerError> {
    let filter = EnvFilter::default().add_directive(resolve_level(&settings.level).into());

    let mut layers: Vec<BoxedLayer> = vec![format_layer(settings.format, std::io::stdout, true)];

    if let Some(path) = settings.path.as_deref().filter(|p| !p.is_empty()) {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        layers.push(format_layer(settings.format, Arc::new(file), false));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| BrokerError::Logging(e.to_string()))
}

/// Map a configured level name to a filter. Unknown names fall back to info.
pub(crate) fn resolve_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
