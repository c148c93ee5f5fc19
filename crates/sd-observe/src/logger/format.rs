use std::str::FromStr;

use crate::logger::error::LoggerError;

/// Output shape of log events, chosen with `SD_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerFormat {
    /// Human-readable lines, colored on a terminal.
    Text,
    /// One JSON object per event.
    Json,
    /// Native journal fields; linux with the `journald` feature only.
    Journald,
}

impl LoggerFormat {
    const fn compiled_in(self) -> bool {
        match self {
            LoggerFormat::Journald => cfg!(all(target_os = "linux", feature = "journald")),
            _ => true,
        }
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = [
            ("text", LoggerFormat::Text),
            ("json", LoggerFormat::Json),
            ("journald", LoggerFormat::Journald),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
        .map(|(_, format)| format)
        .ok_or_else(|| LoggerError::InvalidFormat(s.to_string()))?;

        if !format.compiled_in() {
            return Err(LoggerError::JournaldNotSupported);
        }
        Ok(format)
    }
}
