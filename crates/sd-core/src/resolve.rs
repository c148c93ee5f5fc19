//! Turns whatever report URL the operator pasted into a job URL.
//!
//! Three input shapes are recognised:
//! - a job URL on the build/test service, used as is;
//! - a report test URL, whose `test_run` field leads to a test run;
//! - a report test-run URL, whose `job_url` field is the job.

use regex::Regex;
use tracing::{debug, info};

use sd_http::Fetch;
use sd_model::{JobReference, TestDetail, TestRunDetail};

use crate::{
    config::PipelineConfig,
    error::{ConfigError, PipelineError},
    remote::{fetch_json, required},
};

/// Classified input URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportUrl {
    Job(JobReference),
    Test { id: String },
    TestRun { id: String },
}

pub struct Resolver<'a, F: Fetch + ?Sized> {
    fetch: &'a F,
    tests_prefix: String,
    testruns_prefix: String,
    job_pattern: Regex,
}

impl<'a, F: Fetch + ?Sized> Resolver<'a, F> {
    pub fn new(fetch: &'a F, cfg: &PipelineConfig) -> Result<Self, ConfigError> {
        let job_pattern = Regex::new(&format!(
            r"^{}/groups/[A-Za-z0-9_]*/projects/[A-Za-z0-9_]*/tests/[A-Za-z0-9]*$",
            regex::escape(&cfg.tuxapi)
        ))
        .map_err(|e| ConfigError::Invalid(format!("job url pattern: {e}")))?;

        Ok(Self {
            fetch,
            tests_prefix: format!("{}/tests/", cfg.squad_api),
            testruns_prefix: format!("{}/testruns/", cfg.squad_api),
            job_pattern,
        })
    }

    /// Recognise the shape of `url` without touching the network.
    pub fn classify(&self, url: &str) -> Option<ReportUrl> {
        if self.job_pattern.is_match(url) {
            return Some(ReportUrl::Job(JobReference::new(url)));
        }
        if let Some(id) = parse_id(url, &self.tests_prefix) {
            return Some(ReportUrl::Test { id });
        }
        parse_id(url, &self.testruns_prefix).map(|id| ReportUrl::TestRun { id })
    }

    pub async fn resolve(&self, url: &str) -> Result<JobReference, PipelineError> {
        match self.classify(url) {
            Some(ReportUrl::Job(job)) => {
                debug!(target: "sd.resolve", %job, "input is a job url");
                Ok(job)
            }
            Some(ReportUrl::Test { id }) => {
                debug!(target: "sd.resolve", test = %id, "input is a test url");
                let testrun_id = self.test_run_of(url).await?;
                self.job_of_test_run(&testrun_id).await
            }
            Some(ReportUrl::TestRun { id }) => self.job_of_test_run(&id).await,
            None => Err(PipelineError::InvalidUrl(format!(
                "could not find SQUAD testrun ID in {url:?}"
            ))),
        }
    }

    pub fn test_run_url(&self, id: &str) -> String {
        format!("{}{}/", self.testruns_prefix, id)
    }

    async fn test_run_of(&self, test_url: &str) -> Result<String, PipelineError> {
        let detail: TestDetail = fetch_json(self.fetch, test_url).await?;
        let testrun_url = required(detail.test_run, "test_run", test_url)?;
        parse_id(&testrun_url, &self.testruns_prefix).ok_or_else(|| {
            PipelineError::InvalidUrl(format!(
                "could not find SQUAD testrun ID in {testrun_url:?}"
            ))
        })
    }

    async fn job_of_test_run(&self, id: &str) -> Result<JobReference, PipelineError> {
        info!(target: "sd.resolve", testrun = id, "Getting Tuxtest.");
        let url = self.test_run_url(id);
        let detail: TestRunDetail = fetch_json(self.fetch, &url).await?;
        let job_url = required(detail.job_url, "job_url", &url)?;
        Ok(JobReference::new(job_url))
    }
}

/// Id following `prefix`, with every `/` removed. Empty ids do not count.
fn parse_id(url: &str, prefix: &str) -> Option<String> {
    let id: String = url.strip_prefix(prefix)?.chars().filter(|c| *c != '/').collect();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetch;

    const JOB: &str = "https://tuxapi.tuxsuite.com/v1/groups/g/projects/p/tests/t1";

    fn resolver(fetch: &FakeFetch) -> Resolver<'_, FakeFetch> {
        Resolver::new(fetch, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn classifies_the_three_shapes() {
        let fetch = FakeFetch::new();
        let r = resolver(&fetch);

        assert_eq!(r.classify(JOB), Some(ReportUrl::Job(JobReference::new(JOB))));
        assert_eq!(
            r.classify("https://qa-reports.linaro.org/api/tests/123/"),
            Some(ReportUrl::Test { id: "123".into() })
        );
        assert_eq!(
            r.classify("https://qa-reports.linaro.org/api/testruns/42/"),
            Some(ReportUrl::TestRun { id: "42".into() })
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        let fetch = FakeFetch::new();
        let r = resolver(&fetch);

        assert_eq!(r.classify("https://example.com/whatever"), None);
        assert_eq!(r.classify("https://qa-reports.linaro.org/api/tests/"), None);
        // Test ids are alphanumeric only.
        assert_eq!(
            r.classify("https://tuxapi.tuxsuite.com/v1/groups/g/projects/p/tests/t-1"),
            None
        );
        // Dots in the host are literal.
        assert_eq!(
            r.classify("https://tuxapiXtuxsuite.com/v1/groups/g/projects/p/tests/t1"),
            None
        );
    }

    #[tokio::test]
    async fn job_url_is_returned_unchanged_without_network() {
        let fetch = FakeFetch::new();
        let job = resolver(&fetch).resolve(JOB).await.unwrap();

        assert_eq!(job.as_str(), JOB);
        assert!(fetch.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_url_goes_straight_to_test_run_detail() {
        let fetch = FakeFetch::new().with_json(
            "https://qa-reports.linaro.org/api/testruns/42/",
            &serde_json::json!({ "job_url": JOB }),
        );

        let job = resolver(&fetch)
            .resolve("https://qa-reports.linaro.org/api/testruns/42/")
            .await
            .unwrap();

        assert_eq!(job.as_str(), JOB);
        assert_eq!(
            fetch.requests(),
            vec!["https://qa-reports.linaro.org/api/testruns/42/"]
        );
    }

    #[tokio::test]
    async fn test_url_follows_exactly_one_indirection() {
        let fetch = FakeFetch::new()
            .with_json(
                "https://qa-reports.linaro.org/api/tests/777/",
                &serde_json::json!({ "test_run": "https://qa-reports.linaro.org/api/testruns/42/" }),
            )
            .with_json(
                "https://qa-reports.linaro.org/api/testruns/42/",
                &serde_json::json!({ "job_url": JOB }),
            );

        let job = resolver(&fetch)
            .resolve("https://qa-reports.linaro.org/api/tests/777/")
            .await
            .unwrap();

        assert_eq!(job.as_str(), JOB);
        assert_eq!(
            fetch.requests(),
            vec![
                "https://qa-reports.linaro.org/api/tests/777/",
                "https://qa-reports.linaro.org/api/testruns/42/",
            ]
        );
    }

    #[tokio::test]
    async fn unparseable_test_run_reference_is_invalid_url() {
        let fetch = FakeFetch::new().with_json(
            "https://qa-reports.linaro.org/api/tests/777/",
            &serde_json::json!({ "test_run": "https://elsewhere/runs/42" }),
        );

        let err = resolver(&fetch)
            .resolve("https://qa-reports.linaro.org/api/tests/777/")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUrl(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn missing_job_url_is_missing_field() {
        let fetch = FakeFetch::new().with_json(
            "https://qa-reports.linaro.org/api/testruns/42/",
            &serde_json::json!({ "id": 42 }),
        );

        let err = resolver(&fetch)
            .resolve("https://qa-reports.linaro.org/api/testruns/42/")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField { field: "job_url", .. }));
    }

    #[tokio::test]
    async fn unknown_url_fails_without_network() {
        let fetch = FakeFetch::new();
        let err = resolver(&fetch).resolve("not a url").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUrl(_)));
        assert!(fetch.requests().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let fetch = FakeFetch::new();
        let err = resolver(&fetch)
            .resolve("https://qa-reports.linaro.org/api/testruns/42/")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Network(_)));
    }
}
