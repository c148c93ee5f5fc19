use serde::de::DeserializeOwned;

use sd_http::Fetch;
use sd_model::Reproducer;

use crate::error::PipelineError;

pub(crate) async fn fetch_json<T, F>(fetch: &F, url: &str) -> Result<T, PipelineError>
where
    T: DeserializeOwned,
    F: Fetch + ?Sized,
{
    let body = fetch.text(url).await?;
    parse_json(&body, url)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str, source_url: &str) -> Result<T, PipelineError> {
    serde_json::from_str(body).map_err(|source| PipelineError::Json {
        source_url: source_url.to_string(),
        source,
    })
}

pub(crate) async fn fetch_reproducer<F>(fetch: &F, url: &str) -> Result<Reproducer, PipelineError>
where
    F: Fetch + ?Sized,
{
    let text = fetch.text(url).await?;
    Ok(Reproducer::new(url, text))
}

/// A JSON field that must be present and non-empty.
pub(crate) fn required(
    value: Option<String>,
    field: &'static str,
    source_url: &str,
) -> Result<String, PipelineError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PipelineError::missing(field, source_url))
}
