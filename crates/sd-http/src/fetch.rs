use async_trait::async_trait;
use tracing::debug;

use crate::{config::HttpConfig, errors::HttpError, retry::with_retry};

/// Read-only access to report JSON and build artifacts.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url` and return the body as text.
    async fn text(&self, url: &str) -> Result<String, HttpError>;

    /// GET `url` and return the raw body.
    async fn bytes(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// [`Fetch`] over `reqwest`, with timeouts and bounded retries.
///
/// Text requests carry the whole-request `timeout`. Byte downloads are only
/// bounded by `connect_timeout` and the idle `read_timeout`, so a large
/// kernel image on a slow link completes as long as data keeps arriving.
pub struct HttpFetcher {
    client: reqwest::Client,
    cfg: HttpConfig,
}

impl HttpFetcher {
    pub fn new(cfg: HttpConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .read_timeout(cfg.read_timeout)
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| HttpError::Config(e.to_string()))?;
        Ok(Self { client, cfg })
    }

    async fn get(&self, request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, HttpError> {
        debug!(target: "sd.http", url, "GET");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn text(&self, url: &str) -> Result<String, HttpError> {
        with_retry(&self.cfg.retry, url, move || async move {
            let request = self.client.get(url).timeout(self.cfg.timeout);
            Ok(self.get(request, url).await?.text().await?)
        })
        .await
    }

    async fn bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        with_retry(&self.cfg.retry, url, move || async move {
            let request = self.client.get(url);
            Ok(self.get(request, url).await?.bytes().await?.to_vec())
        })
        .await
    }
}
