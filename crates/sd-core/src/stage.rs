//! Download the kernel, symbol map and test log into the staging directory.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use sd_exec::{CommandRunner, ProcConfig};
use sd_http::Fetch;
use sd_model::{Invocation, JobMetadata};

use crate::{config::PipelineConfig, error::PipelineError};

/// Files staged for one decode.
///
/// The kernel binary and symbol map stay on disk after the run; the log is
/// a scoped file removed when this value is dropped.
#[derive(Debug)]
pub struct StagedArtifacts {
    pub kernel_binary_path: PathBuf,
    pub symbol_map_path: PathBuf,
    pub log: NamedTempFile,
}

impl StagedArtifacts {
    pub fn log_path(&self) -> &Path {
        self.log.path()
    }
}

pub struct Stager<'a, F: Fetch + ?Sized, R: CommandRunner + ?Sized> {
    fetch: &'a F,
    runner: &'a R,
    cfg: &'a PipelineConfig,
}

impl<'a, F, R> Stager<'a, F, R>
where
    F: Fetch + ?Sized,
    R: CommandRunner + ?Sized,
{
    pub fn new(fetch: &'a F, runner: &'a R, cfg: &'a PipelineConfig) -> Self {
        Self { fetch, runner, cfg }
    }

    pub async fn stage(&self, meta: &JobMetadata) -> Result<StagedArtifacts, PipelineError> {
        let log = self.stage_log(meta).await?;
        let kernel_binary_path = self.stage_kernel(meta).await?;
        let symbol_map_path = self.stage_symbol_map(meta).await?;

        info!(target: "sd.stage", "File: vmlinux:          {}", kernel_binary_path.display());
        info!(target: "sd.stage", "File: System.map:       {}", symbol_map_path.display());

        Ok(StagedArtifacts {
            kernel_binary_path,
            symbol_map_path,
            log,
        })
    }

    async fn stage_log(&self, meta: &JobMetadata) -> Result<NamedTempFile, PipelineError> {
        let url = meta.log_url();
        debug!(target: "sd.stage", %url, "fetching test log");
        let body = self.fetch.bytes(&url).await?;

        let mut log = tempfile::Builder::new()
            .prefix("tuxtest-log-")
            .suffix(".txt")
            .tempfile_in(&self.cfg.staging_dir)
            .map_err(|e| PipelineError::io("creating scoped log file", e))?;
        log.write_all(&body)
            .map_err(|e| PipelineError::io(format!("writing {}", log.path().display()), e))?;
        Ok(log)
    }

    async fn stage_kernel(&self, meta: &JobMetadata) -> Result<PathBuf, PipelineError> {
        let url = meta.compressed_kernel_url();
        debug!(target: "sd.stage", %url, "fetching compressed kernel");
        let body = self.fetch.bytes(&url).await?;

        let compressed = self.cfg.compressed_kernel_path();
        persist(&self.cfg.staging_dir, &compressed, &body)?;

        let inv = Invocation::new(&self.cfg.xz_program, ["-df".to_string(), compressed.display().to_string()]);
        let proc = ProcConfig::new(&inv).with_timeout(self.cfg.timeouts.decompress);
        self.runner
            .run(&proc)
            .await
            .map_err(|source| PipelineError::ExternalCommand {
                command: inv.to_string(),
                source,
            })?;

        let kernel = self.cfg.kernel_binary_path();
        if !kernel.is_file() {
            return Err(PipelineError::io(
                format!("{} did not produce {}", inv, kernel.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        Ok(kernel)
    }

    async fn stage_symbol_map(&self, meta: &JobMetadata) -> Result<PathBuf, PipelineError> {
        let url = meta.symbol_map_url();
        debug!(target: "sd.stage", %url, "fetching symbol map");
        let body = self.fetch.bytes(&url).await?;

        let path = self.cfg.symbol_map_path();
        persist(&self.cfg.staging_dir, &path, &body)?;
        Ok(path)
    }
}

/// Write `body` next to `target` and rename it into place.
fn persist(dir: &Path, target: &Path, body: &[u8]) -> Result<(), PipelineError> {
    let context = || format!("staging {}", target.display());
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(context(), e))?;
    tmp.write_all(body).map_err(|e| PipelineError::io(context(), e))?;
    tmp.persist(target)
        .map_err(|e| PipelineError::io(context(), e.error))?;
    Ok(())
}
