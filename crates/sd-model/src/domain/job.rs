use std::fmt;

use serde::{Deserialize, Serialize};

use crate::url::{dirname, join_url};

/// URL of one test execution ("job") on the build/test service.
///
/// Produced once by URL resolution and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobReference(String);

impl JobReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of the shell reproducer captured for this test run.
    pub fn reproducer_url(&self) -> String {
        join_url(&self.0, "tuxsuite_reproducer")
    }
}

impl fmt::Display for JobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the build outputs and the test logs of a job live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub job: JobReference,
    /// Absolute URL of the kernel image the job booted.
    pub kernel_url: String,
    /// Directory holding the job's logs.
    pub download_url: String,
    /// Directory holding the build outputs (`kernel_url` without its file name).
    pub build_base_url: String,
}

impl JobMetadata {
    /// Derive the metadata from the two fields of the job record.
    ///
    /// Returns `None` when `kernel_url` does not end with a file name.
    pub fn new(
        job: JobReference,
        kernel_url: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Option<Self> {
        let kernel_url = kernel_url.into();
        let build_base_url = dirname(&kernel_url)?.to_string();
        Some(Self {
            job,
            kernel_url,
            download_url: download_url.into(),
            build_base_url,
        })
    }

    /// Point the metadata at a different build directory.
    pub fn with_build_base(mut self, build_base_url: impl Into<String>) -> Self {
        self.build_base_url = build_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point the metadata at a different log directory.
    pub fn with_download_url(mut self, download_url: impl Into<String>) -> Self {
        self.download_url = download_url.into();
        self
    }

    pub fn config_url(&self) -> String {
        join_url(&self.build_base_url, "config")
    }

    pub fn build_reproducer_url(&self) -> String {
        join_url(&self.build_base_url, "tuxsuite_reproducer.sh")
    }

    pub fn build_metadata_url(&self) -> String {
        join_url(&self.build_base_url, "metadata.json")
    }

    pub fn compressed_kernel_url(&self) -> String {
        join_url(&self.build_base_url, "vmlinux.xz")
    }

    pub fn symbol_map_url(&self) -> String {
        join_url(&self.build_base_url, "System.map")
    }

    pub fn log_url(&self) -> String {
        join_url(&self.download_url, "logs.txt")
    }
}
