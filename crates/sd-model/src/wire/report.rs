use serde::{Deserialize, Serialize};

/// `GET {squad}/tests/{id}/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDetail {
    #[serde(default)]
    pub test_run: Option<String>,
}

/// `GET {squad}/testruns/{id}/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunDetail {
    #[serde(default)]
    pub job_url: Option<String>,
}

/// `GET {job_url}`, and the `--json-out` record of a test submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    #[serde(default)]
    pub kernel: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}
