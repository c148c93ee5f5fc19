use std::path::PathBuf;

use tracing::{debug, info};

use sd_exec::CommandRunner;
use sd_http::Fetch;
use sd_model::{BuildArtifactSet, BuildResult, JobReference};

use crate::{
    config::PipelineConfig,
    decode::decode,
    error::PipelineError,
    gate,
    locate::locate,
    rebuild::Rebuilder,
    remote::{fetch_json, fetch_reproducer},
    resolve::Resolver,
    stage::Stager,
};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub job: JobReference,
    /// The kernel was rebuilt with debug info.
    pub rebuilt: bool,
    /// The post-rebuild test run failed; the original log was decoded.
    pub degraded: bool,
    pub kernel_binary_path: PathBuf,
    pub symbol_map_path: PathBuf,
    pub container_image_id: String,
}

/// Report URL in, symbolised stack trace out.
pub struct Pipeline<F, R> {
    fetch: F,
    runner: R,
    cfg: PipelineConfig,
}

impl<F: Fetch, R: CommandRunner> Pipeline<F, R> {
    pub fn new(fetch: F, runner: R, cfg: PipelineConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        Ok(Self { fetch, runner, cfg })
    }

    pub async fn run(&self, url: &str) -> Result<RunSummary, PipelineError> {
        info!(target: "sd.pipeline", "URL: {url}");
        std::fs::create_dir_all(&self.cfg.staging_dir).map_err(|e| {
            PipelineError::io(
                format!("creating staging dir {}", self.cfg.staging_dir.display()),
                e,
            )
        })?;

        let job = Resolver::new(&self.fetch, &self.cfg)?.resolve(url).await?;
        let mut metadata = locate(&self.fetch, &job).await?;

        info!(target: "sd.pipeline", "Getting kernel configuration.");
        let config_text = self.fetch.text(&metadata.config_url()).await?;
        let mut artifacts = BuildArtifactSet::from_config(config_text);

        let mut rebuilt = false;
        let mut degraded = false;
        let needs_rebuild = gate::inspect(&artifacts.config_text);
        artifacts.debug_info = !needs_rebuild;
        if needs_rebuild {
            let test_reproducer = fetch_reproducer(&self.fetch, &job.reproducer_url()).await?;
            info!(target: "sd.pipeline", "Getting Tuxbuild reproducer.");
            let build_reproducer =
                fetch_reproducer(&self.fetch, &metadata.build_reproducer_url()).await?;

            let outcome = Rebuilder::new(&self.runner, &self.cfg)
                .rebuild(&build_reproducer, &test_reproducer, metadata)
                .await?;

            metadata = outcome.metadata;
            degraded = outcome.degraded;
            rebuilt = true;
            artifacts.debug_info = outcome.debug_info;
            artifacts.container_image_id = outcome.build.container_image_id().map(str::to_string);
        } else {
            info!(target: "sd.pipeline", "Looking for Tuxmake image.");
            let build: BuildResult = fetch_json(&self.fetch, &metadata.build_metadata_url()).await?;
            artifacts.container_image_id = build.container_image_id().map(str::to_string);
        }
        debug!(target: "sd.pipeline", image = ?artifacts.container_image_id, rebuilt, "artifact set resolved");

        let staged = Stager::new(&self.fetch, &self.runner, &self.cfg)
            .stage(&metadata)
            .await?;
        artifacts.kernel_binary_path = Some(staged.kernel_binary_path.clone());
        artifacts.symbol_map_path = Some(staged.symbol_map_path.clone());

        let request = artifacts
            .decode_request(staged.log_path().to_path_buf())
            .map_err(|field| PipelineError::missing(field, metadata.build_base_url.clone()))?;

        decode(&self.runner, &self.cfg, &request).await?;

        Ok(RunSummary {
            job,
            rebuilt,
            degraded,
            kernel_binary_path: request.kernel_binary_path,
            symbol_map_path: staged.symbol_map_path.clone(),
            container_image_id: request.container_image_id,
        })
    }
}
