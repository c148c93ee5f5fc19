mod config;
pub use config::{HttpConfig, RetryPolicy};

mod errors;
pub use errors::HttpError;

mod fetch;
pub use fetch::{Fetch, HttpFetcher};

mod retry;
pub use retry::with_retry;
