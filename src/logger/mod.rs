//! Logger initialisation on top of `tracing-subscriber`.
//!
//! Console output on stderr (colored only on a TTY) and an optional
//! append-only file in full, compact or JSON format, both behind one
//! `EnvFilter`. Stdout stays free for command output.

pub mod config;
pub mod error;
pub(crate) mod writer;


pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};
use writer::LogFileWriter;

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logger(config: &LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let file = if config.file.enabled {
        Some(file_layer(config.file.format, LogFileWriter::new(&config.file)?))
    } else {
        None
    };

    let use_ansi = config.console.colored && std::io::stderr().is_terminal();
    let console = config.console.enabled.then(|| {
        fmt::layer()
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
    });

    // File layer goes first so console ANSI settings do not leak into span fields.
    tracing_subscriber::registry()
        .with(filter)
        .with(file)
        .with(console)
        .try_init()
        .map_err(|e| LoggerError::subscriber(e.to_string()))
}

fn file_layer<S>(format: LogFormat, writer: LogFileWriter) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    }
}
