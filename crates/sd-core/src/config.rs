use std::{path::PathBuf, time::Duration};

use sd_http::HttpConfig;

use crate::error::ConfigError;

/// Upper bounds for each external command. `None` waits indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub build: Option<Duration>,
    pub test: Option<Duration>,
    pub decompress: Option<Duration>,
    pub decode: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            build: Some(Duration::from_secs(2 * 60 * 60)),
            test: Some(Duration::from_secs(2 * 60 * 60)),
            decompress: Some(Duration::from_secs(5 * 60)),
            decode: Some(Duration::from_secs(10 * 60)),
        }
    }
}

/// Everything the pipeline needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base of the report API, without trailing slash.
    pub squad_api: String,
    /// Base of the build/test service API, without trailing slash.
    pub tuxapi: String,
    /// Where the kernel binary, symbol map and scoped temp files are written.
    pub staging_dir: PathBuf,
    /// Kernel source tree mounted read-only into the decoder container.
    pub kernel_source_dir: PathBuf,
    pub tuxsuite_program: String,
    pub container_runtime: String,
    pub xz_program: String,
    /// Decoder script path inside the container.
    pub decoder_script: String,
    pub timeouts: Timeouts,
    pub http: HttpConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            squad_api: "https://qa-reports.linaro.org/api".to_string(),
            tuxapi: "https://tuxapi.tuxsuite.com/v1".to_string(),
            staging_dir: PathBuf::from("/tmp"),
            kernel_source_dir: PathBuf::from("/data/linux"),
            tuxsuite_program: "tuxsuite".to_string(),
            container_runtime: "docker".to_string(),
            xz_program: "xz".to_string(),
            decoder_script: "/linux/scripts/decode_stacktrace.sh".to_string(),
            timeouts: Timeouts::default(),
            http: HttpConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `SD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("SD_SQUAD_API") {
            cfg.squad_api = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SD_TUXAPI") {
            cfg.tuxapi = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SD_STAGING_DIR") {
            cfg.staging_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SD_KERNEL_SOURCE") {
            cfg.kernel_source_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SD_TUXSUITE") {
            cfg.tuxsuite_program = v;
        }
        if let Some(v) = get("SD_CONTAINER_RUNTIME") {
            cfg.container_runtime = v;
        }
        if let Some(v) = get("SD_XZ") {
            cfg.xz_program = v;
        }
        if let Some(v) = get("SD_BUILD_TIMEOUT_SECS") {
            cfg.timeouts.build = parse_timeout("SD_BUILD_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SD_TEST_TIMEOUT_SECS") {
            cfg.timeouts.test = parse_timeout("SD_TEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SD_HTTP_TIMEOUT_SECS") {
            cfg.http.timeout = parse_timeout("SD_HTTP_TIMEOUT_SECS", &v)?.ok_or(
                ConfigError::InvalidValue {
                    key: "SD_HTTP_TIMEOUT_SECS",
                    value: v.clone(),
                },
            )?;
        }
        if let Some(v) = get("SD_HTTP_RETRIES") {
            cfg.http.retry.attempts = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SD_HTTP_RETRIES",
                value: v.clone(),
            })?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [("squad_api", &self.squad_api), ("tuxapi", &self.tuxapi)] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be an http(s) url, got {url:?}"
                )));
            }
        }
        if !self.staging_dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "staging_dir must be absolute, got {}",
                self.staging_dir.display()
            )));
        }
        for (name, program) in [
            ("tuxsuite_program", &self.tuxsuite_program),
            ("container_runtime", &self.container_runtime),
            ("xz_program", &self.xz_program),
            ("decoder_script", &self.decoder_script),
        ] {
            if program.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} is empty")));
            }
        }
        Ok(())
    }

    /// Final location of the uncompressed kernel binary.
    pub fn kernel_binary_path(&self) -> PathBuf {
        self.staging_dir.join("vmlinux")
    }

    /// Download target of the compressed kernel, decompressed in place.
    pub fn compressed_kernel_path(&self) -> PathBuf {
        self.staging_dir.join("vmlinux.xz")
    }

    pub fn symbol_map_path(&self) -> PathBuf {
        self.staging_dir.join("System.map")
    }
}

/// Seconds; `0` disables the timeout.
fn parse_timeout(key: &'static str, value: &str) -> Result<Option<Duration>, ConfigError> {
    let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
