mod config;
mod error;
mod format;
mod log;

pub use config::{ENV_FORMAT, ENV_LEVEL, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the process-wide subscriber described by `cfg`. Fails if one is
/// already installed.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    log::install(cfg)
}
