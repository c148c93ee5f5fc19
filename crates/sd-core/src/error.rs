use thiserror::Error;

use sd_exec::ExecError;
use sd_http::HttpError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Every way a run can fail. Each variant maps to one process exit code.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("missing field `{field}` in {source_url}")]
    MissingField {
        field: &'static str,
        source_url: String,
    },

    #[error("no `{prefix}` line in reproducer {source_url}")]
    MissingReproducerLine {
        prefix: &'static str,
        source_url: String,
    },

    #[error("`{command}` failed: {source}")]
    ExternalCommand {
        command: String,
        #[source]
        source: ExecError,
    },

    #[error(transparent)]
    Network(#[from] HttpError),

    #[error("malformed json from {source_url}: {source}")]
    Json {
        source_url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn missing(field: &'static str, source_url: impl Into<String>) -> Self {
        PipelineError::MissingField {
            field,
            source_url: source_url.into(),
        }
    }

    /// Process exit code for this failure. Zero is reserved for success.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InvalidUrl(_) => 1,
            PipelineError::MissingField { .. }
            | PipelineError::MissingReproducerLine { .. }
            | PipelineError::Json { .. } => 2,
            PipelineError::Network(_) => 3,
            PipelineError::ExternalCommand { .. } => 4,
            PipelineError::Io { .. } | PipelineError::Config(_) => 5,
        }
    }
}
