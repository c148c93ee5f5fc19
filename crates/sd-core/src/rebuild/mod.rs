//! Rebuild the kernel with debug info and re-run the failing test on it.

pub mod command;

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use sd_exec::{CommandRunner, OutputMode, ProcConfig};
use sd_model::{BuildResult, Invocation, JobDetail, JobMetadata, Reproducer};

use crate::{
    config::PipelineConfig,
    error::PipelineError,
    gate,
    remote::{parse_json, required},
};

/// What the rebuild produced.
#[derive(Debug, Clone)]
pub struct RebuildOutcome {
    /// Result record of the debug build.
    pub build: BuildResult,
    /// Job metadata pointing at the new build, and at the new test logs when
    /// the re-run succeeded.
    pub metadata: JobMetadata,
    /// The test re-run failed or reported nothing usable; the original log
    /// is decoded instead.
    pub degraded: bool,
    /// The build that ran forced the debug-info marker on.
    pub debug_info: bool,
}

pub struct Rebuilder<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    cfg: &'a PipelineConfig,
}

impl<'a, R: CommandRunner + ?Sized> Rebuilder<'a, R> {
    pub fn new(runner: &'a R, cfg: &'a PipelineConfig) -> Self {
        Self { runner, cfg }
    }

    pub async fn rebuild(
        &self,
        build_reproducer: &Reproducer,
        test_reproducer: &Reproducer,
        metadata: JobMetadata,
    ) -> Result<RebuildOutcome, PipelineError> {
        let original_build = command::build_invocation(build_reproducer)?;
        let original_test = command::test_invocation(test_reproducer)?;

        let build_json = self.scoped_file("tuxbuild-")?;
        let build_cmd =
            command::debug_build(&self.cfg.tuxsuite_program, &original_build, build_json.path());
        let debug_info = build_cmd.args.iter().any(|a| a == gate::DEBUG_INFO_MARKER);
        info!(target: "sd.rebuild", "Building kernel with DEBUG_INFO.");
        self.run(&build_cmd, self.cfg.timeouts.build, OutputMode::Inherit)
            .await?;

        let build: BuildResult = read_json(build_json.path())?;
        let source = build_json.path().display().to_string();
        let build_dir = required(build.download_url.clone(), "download_url", &source)?;
        let kernel_url = build
            .kernel_artifact_url()
            .ok_or_else(|| PipelineError::missing("tuxmake_metadata.results.artifacts.kernel", &source))?;
        let modules_url = build.modules_artifact_url();
        debug!(target: "sd.rebuild", build = %build_dir, kernel = %kernel_url, "debug build finished");

        let test_json = self.scoped_file("tuxtest-")?;
        let test_cmd = command::rerun_test(
            &self.cfg.tuxsuite_program,
            &original_test,
            &kernel_url,
            modules_url.as_deref(),
            test_json.path(),
        )
        .map_err(|_| PipelineError::missing("tuxmake_metadata.results.artifacts.modules", &source))?;

        info!(target: "sd.rebuild", "Reproducing test on the debug kernel.");
        let mut metadata = metadata.with_build_base(build_dir);
        let degraded = match self
            .run(&test_cmd, self.cfg.timeouts.test, OutputMode::Null)
            .await
        {
            Ok(()) => match rerun_log_dir(test_json.path()) {
                Some(logs) => {
                    metadata = metadata.with_download_url(logs);
                    false
                }
                None => {
                    warn!(
                        target: "sd.rebuild",
                        "test re-run reported no download_url; decoding the original log"
                    );
                    true
                }
            },
            Err(e) => {
                warn!(
                    target: "sd.rebuild",
                    error = %e,
                    "test re-run failed; continuing with the original log"
                );
                true
            }
        };

        Ok(RebuildOutcome {
            build,
            metadata,
            degraded,
            debug_info,
        })
    }

    async fn run(
        &self,
        inv: &Invocation,
        timeout: Option<std::time::Duration>,
        stderr: OutputMode,
    ) -> Result<(), PipelineError> {
        let proc = ProcConfig::new(inv)
            .with_timeout(timeout)
            .with_stderr(stderr);
        self.runner
            .run(&proc)
            .await
            .map_err(|source| PipelineError::ExternalCommand {
                command: inv.to_string(),
                source,
            })
    }

    fn scoped_file(&self, prefix: &str) -> Result<NamedTempFile, PipelineError> {
        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".json")
            .tempfile_in(&self.cfg.staging_dir)
            .map_err(|e| PipelineError::io("creating scoped json file", e))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let source = path.display().to_string();
    let body = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::io(format!("reading {source}"), e))?;
    parse_json(&body, &source)
}

fn rerun_log_dir(path: &Path) -> Option<String> {
    let detail: JobDetail = read_json(path).ok()?;
    detail.download_url.filter(|u| !u.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, arg_after};
    use sd_exec::ExecError;
    use sd_model::JobReference;

    const BUILD_REPRODUCER: &str = "# tuxsuite build --git-ref v6.6 --target-arch x86_64 --kconfig defconfig --toolchain gcc-13\n";
    const TEST_REPRODUCER: &str = "tuxsuite test --device qemu-x86_64 --kernel https://old/bzImage --modules https://old/modules.tar.xz --tests ltp-mm\n";

    fn build_record() -> serde_json::Value {
        serde_json::json!({
            "download_url": "https://storage/builds/new/",
            "tuxmake_metadata": {
                "results": {"artifacts": {"kernel": ["bzImage"], "modules": ["modules.tar.xz"]}},
                "runtime": {"image_digest": "1234.dkr.ecr.us-east-1.amazonaws.com/tuxmake/x86_64_gcc-13@sha256:aa"}
            }
        })
    }

    fn write_json_out(cfg: &ProcConfig, body: &serde_json::Value) -> sd_exec::ExecResult<()> {
        let path = arg_after(cfg, "--json-out").expect("--json-out");
        std::fs::write(path, body.to_string())?;
        Ok(())
    }

    fn metadata() -> JobMetadata {
        JobMetadata::new(
            JobReference::new("https://tuxapi.tuxsuite.com/v1/groups/g/projects/p/tests/t1"),
            "https://storage/builds/old/bzImage",
            "https://storage/tests/t1/",
        )
        .unwrap()
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            staging_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn reproducers() -> (Reproducer, Reproducer) {
        (
            Reproducer::new("https://storage/builds/old/tuxsuite_reproducer.sh", BUILD_REPRODUCER),
            Reproducer::new("https://tuxapi/t1/tuxsuite_reproducer", TEST_REPRODUCER),
        )
    }

    #[tokio::test]
    async fn rebuild_then_rerun_points_at_new_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = FakeRunner::new()
            .on("tuxsuite build", |c| write_json_out(c, &build_record()))
            .on("tuxsuite test", |c| {
                write_json_out(c, &serde_json::json!({"download_url": "https://storage/tests/t2/"}))
            });
        let (build, test) = reproducers();

        let outcome = Rebuilder::new(&runner, &cfg)
            .rebuild(&build, &test, metadata())
            .await
            .unwrap();

        assert!(!outcome.degraded);
        assert!(outcome.debug_info);
        assert_eq!(outcome.metadata.build_base_url, "https://storage/builds/new");
        assert_eq!(outcome.metadata.download_url, "https://storage/tests/t2/");
        assert_eq!(
            outcome.build.container_image_id(),
            Some("tuxmake/x86_64_gcc-13@sha256:aa")
        );

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        let build_line = calls[0].command_line();
        assert!(build_line.starts_with(
            "tuxsuite build --git-ref v6.6 --target-arch x86_64 --kconfig defconfig --toolchain gcc-13 \
             --kconfig CONFIG_DEBUG_INFO=y --kconfig CONFIG_DEBUG_INFO_DWARF_TOOLCHAIN_DEFAULT=y --json-out "
        ));
        assert!(build_line.ends_with(" config kernel modules debugkernel"));
        assert_eq!(calls[0].stderr, OutputMode::Inherit);

        assert_eq!(arg_after(&calls[1], "--kernel"), Some("https://storage/builds/new/bzImage"));
        assert_eq!(
            arg_after(&calls[1], "--modules"),
            Some("https://storage/builds/new/modules.tar.xz")
        );
        assert_eq!(calls[1].stderr, OutputMode::Null);
        assert_eq!(calls[1].timeout, cfg.timeouts.test);
    }

    #[tokio::test]
    async fn failing_rerun_is_degraded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = FakeRunner::new()
            .on("tuxsuite build", |c| write_json_out(c, &build_record()))
            .failing("tuxsuite test", 1);
        let (build, test) = reproducers();

        let outcome = Rebuilder::new(&runner, &cfg)
            .rebuild(&build, &test, metadata())
            .await
            .unwrap();

        assert!(outcome.degraded);
        assert_eq!(outcome.metadata.build_base_url, "https://storage/builds/new");
        assert_eq!(outcome.metadata.download_url, "https://storage/tests/t1/");
    }

    #[tokio::test]
    async fn failing_build_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = FakeRunner::new().failing("tuxsuite build", 2);
        let (build, test) = reproducers();

        let err = Rebuilder::new(&runner, &cfg)
            .rebuild(&build, &test, metadata())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::ExternalCommand { source: ExecError::NonZeroExit { code: 2 }, .. }
        ));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn build_record_without_kernel_is_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = FakeRunner::new().on("tuxsuite build", |c| {
            write_json_out(c, &serde_json::json!({"download_url": "https://storage/builds/new/"}))
        });
        let (build, test) = reproducers();

        let err = Rebuilder::new(&runner, &cfg)
            .rebuild(&build, &test, metadata())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingField { field: "tuxmake_metadata.results.artifacts.kernel", .. }
        ));
    }

    #[tokio::test]
    async fn reproducer_without_build_line_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = FakeRunner::new();
        let (_, test) = reproducers();
        let build = Reproducer::new("https://storage/builds/old/tuxsuite_reproducer.sh", "#!/bin/sh\n");

        let err = Rebuilder::new(&runner, &cfg)
            .rebuild(&build, &test, metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingReproducerLine { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn scoped_json_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = FakeRunner::new()
            .on("tuxsuite build", |c| write_json_out(c, &build_record()))
            .failing("tuxsuite test", 1);
        let (build, test) = reproducers();

        Rebuilder::new(&runner, &cfg)
            .rebuild(&build, &test, metadata())
            .await
            .unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
