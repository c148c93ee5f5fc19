use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid http client configuration: {0}")]
    Config(String),
}

impl HttpError {
    /// Transport failures, throttling and server errors may succeed on a
    /// later attempt; client errors will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            // A body read cut short by a timeout surfaces as a decode error.
            HttpError::Request(e) if e.is_timeout() => true,
            HttpError::Request(e) => !e.is_builder() && !e.is_redirect() && !e.is_decode(),
            HttpError::Status { status, .. } => *status >= 500 || *status == 429,
            HttpError::Config(_) => false,
        }
    }
}
