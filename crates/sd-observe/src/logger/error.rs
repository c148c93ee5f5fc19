use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("SD_LOG_FORMAT={0:?} is not a log format (text, json or journald)")]
    InvalidFormat(String),

    #[error("SD_LOG_FORMAT=journald needs a linux build with the `journald` feature")]
    JournaldNotSupported,

    #[error("a global log subscriber is already installed")]
    AlreadyInitialized,

    #[error("log subscriber setup failed: {0}")]
    InitializationFailed(String),

    #[error("SD_LOG={0:?} is not a valid filter directive")]
    InvalidLogLevel(String),
}
