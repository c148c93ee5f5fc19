use tracing::info;

use sd_exec::{CommandRunner, ProcConfig, StdinSource};
use sd_model::{DecodeRequest, Invocation};

use crate::{config::PipelineConfig, error::PipelineError};

/// Mount point of the kernel source tree inside the decoder container.
pub const SOURCE_MOUNT: &str = "/linux";

/// Container command that symbolises the log against the kernel binary.
pub fn decoder_invocation(cfg: &PipelineConfig, req: &DecodeRequest) -> Invocation {
    let staging = cfg.staging_dir.display().to_string();
    Invocation::new(&cfg.container_runtime, ["run", "--rm", "-i"]).args([
        "-v".to_string(),
        format!("{}:{SOURCE_MOUNT}:ro", cfg.kernel_source_dir.display()),
        "-v".to_string(),
        format!("{staging}:{staging}"),
        req.container_image_id.clone(),
        cfg.decoder_script.clone(),
        req.kernel_binary_path.display().to_string(),
    ])
}

/// Run the decoder with the log on stdin; its output goes to our stdout.
pub async fn decode<R>(runner: &R, cfg: &PipelineConfig, req: &DecodeRequest) -> Result<(), PipelineError>
where
    R: CommandRunner + ?Sized,
{
    info!(target: "sd.decode", image = %req.container_image_id, "Decoding stack trace.");
    let inv = decoder_invocation(cfg, req);
    let proc = ProcConfig::new(&inv)
        .with_stdin(StdinSource::File(req.log_path.clone()))
        .with_timeout(cfg.timeouts.decode);

    runner
        .run(&proc)
        .await
        .map_err(|source| PipelineError::ExternalCommand {
            command: inv.to_string(),
            source,
        })
}
