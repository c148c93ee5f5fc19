use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, fmt::time::OffsetTime, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Transport crates that are chatty at `debug`; held at `warn` unless the
/// directive names them.
const QUIET: &[&str] = &["hyper", "hyper_util", "h2", "rustls", "reqwest"];

/// Installs the global subscriber. Events go to stderr so that the decoded
/// trace on stdout stays clean.
pub(super) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let base = tracing_subscriber::registry().with(directives(&cfg.level)?);
    let res = match cfg.format {
        LoggerFormat::Text => base.with(text_layer(cfg)).try_init(),
        LoggerFormat::Json => base.with(json_layer(cfg)).try_init(),
        LoggerFormat::Journald => return journald(base),
    };
    res.map_err(init_error)
}

fn directives(level: &str) -> Result<EnvFilter, LoggerError> {
    let invalid = || LoggerError::InvalidLogLevel(level.to_string());
    let mut filter = EnvFilter::try_new(level).map_err(|_| invalid())?;
    for name in QUIET.iter().filter(|n| !level.contains(*n)) {
        filter = filter.add_directive(format!("{name}=warn").parse().map_err(|_| invalid())?);
    }
    Ok(filter)
}

fn text_layer<S>(cfg: &LoggerConfig) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets)
        .with_timer(local_timer())
}

fn json_layer<S>(cfg: &LoggerConfig) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(cfg.with_targets)
        .with_timer(local_timer())
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn init_error(e: impl std::fmt::Display) -> LoggerError {
    let msg = e.to_string();
    if msg.contains("global default") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(msg)
    }
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald<S>(base: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + for<'a> LookupSpan<'a> + 'static,
{
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("stackdecode".to_string());
    base.with(layer).try_init().map_err(init_error)
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald<S>(_base: S) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
