use std::{io::Write, process::ExitCode};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use sd_core::{ConfigError, Pipeline, PipelineConfig, PipelineError, RunSummary};
use sd_exec::ProcRunner;
use sd_http::HttpFetcher;
use sd_observe::{LoggerConfig, logger_init};

const USAGE: &str = "\
Decode a kernel stack trace from a failed SQUAD test.
Paste a SQUAD test, SQUAD test-run or tuxsuite test URL; kernels built without DEBUG_INFO are rebuilt first.";

const PROMPT: &str = "Enter SQUAD Testrun URL or SQUAD Test URL: ";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let log_cfg = match LoggerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("stackdecode: {e}");
            return ExitCode::from(5);
        }
    };
    if let Err(e) = logger_init(&log_cfg) {
        eprintln!("stackdecode: {e}");
        return ExitCode::from(5);
    }

    match run().await {
        Ok(summary) => {
            info!(
                job = %summary.job,
                rebuilt = summary.rebuilt,
                degraded = summary.degraded,
                vmlinux = %summary.kernel_binary_path.display(),
                system_map = %summary.symbol_map_path.display(),
                image = %summary.container_image_id,
                "decode finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run() -> anyhow::Result<RunSummary> {
    let url = prompt().await.context("reading url from stdin")?;

    let cfg = PipelineConfig::from_env().map_err(PipelineError::from)?;
    let fetch = HttpFetcher::new(cfg.http.clone())
        .map_err(|e| PipelineError::from(ConfigError::Invalid(format!("http client: {e}"))))?;
    let pipeline = Pipeline::new(fetch, ProcRunner, cfg)?;

    Ok(pipeline.run(&url).await?)
}

async fn prompt() -> anyhow::Result<String> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{USAGE}\n")?;
    write!(out, "{PROMPT}")?;
    out.flush()?;
    drop(out);

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PipelineError>() {
        Some(e) => e.exit_code(),
        // stdin went away before a url was read
        None => 5,
    }
}
