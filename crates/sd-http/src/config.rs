use std::time::Duration;

/// Exponential backoff between attempts of an idempotent GET.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included. Zero behaves as one.
    pub attempts: u32,
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            first_ms: 500,
            max_ms: 4_000,
            factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt number `attempt + 1` (zero based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let raw = self.first_ms as f64 * self.factor.max(1.0).powi(attempt as i32);
        Duration::from_millis(raw.min(self.max_ms as f64) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request budget for JSON and text bodies, connect through last
    /// byte. Artifact downloads are not bound by it.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest silence between two reads of a body. Bounds artifact
    /// downloads, which may take long but must keep moving.
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            user_agent: format!("stackdecode/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
