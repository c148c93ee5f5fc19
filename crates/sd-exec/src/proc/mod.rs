use std::{path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use tracing::{debug, trace};

use sd_model::Invocation;

use crate::{
    error::{ExecError, ExecResult},
    util::{cmd_program, kill_graceful},
};

/// Where the child reads its standard input from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StdinSource {
    #[default]
    Null,
    /// Feed the content of a file.
    File(PathBuf),
}

/// What happens to a child output stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Inherit,
    Null,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Null => Stdio::null(),
        }
    }
}

/// One process to run to completion.
#[derive(Clone, Debug)]
pub struct ProcConfig {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: StdinSource,
    pub stdout: OutputMode,
    pub stderr: OutputMode,
    /// Kill the child once this elapses. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            stdin: StdinSource::Null,
            stdout: OutputMode::Inherit,
            stderr: OutputMode::Inherit,
            timeout: None,
        }
    }
}

impl ProcConfig {
    pub fn new(invocation: &Invocation) -> Self {
        Self {
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            ..Default::default()
        }
    }

    pub fn with_stdin(mut self, stdin: StdinSource) -> Self {
        self.stdin = stdin;
        self
    }

    pub fn with_stderr(mut self, stderr: OutputMode) -> Self {
        self.stderr = stderr;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The argv as one display string, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn stdin_stdio(&self) -> ExecResult<Stdio> {
        Ok(match &self.stdin {
            StdinSource::Null => Stdio::null(),
            StdinSource::File(path) => Stdio::from(std::fs::File::open(path)?),
        })
    }
}

/// Runs external commands on behalf of the pipeline.
///
/// Every call blocks the caller until the child exits or its timeout fires.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cfg: &ProcConfig) -> ExecResult<()>;
}

/// [`CommandRunner`] backed by `tokio::process`. Any non-zero exit is an
/// error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcRunner;

#[async_trait]
impl CommandRunner for ProcRunner {
    async fn run(&self, cfg: &ProcConfig) -> ExecResult<()> {
        if cfg.program.is_empty() {
            return Err(ExecError::MissingProgram);
        }

        trace!(target: "sd.exec", program = %cfg.program, args = ?cfg.args, "spawn");

        let mut cmd = cmd_program(&cfg.program, &cfg.args);
        cmd.stdin(cfg.stdin_stdio()?);
        cmd.stdout(cfg.stdout.stdio());
        cmd.stderr(cfg.stderr.stdio());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::Spawn(format!("{}: {e}", cfg.program)))?;

        let status = match cfg.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    debug!(target: "sd.exec", program = %cfg.program, "timeout; killing child");
                    let _ = kill_graceful(&mut child).await;
                    return Err(ExecError::Timeout {
                        after_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => child.wait().await?,
        };

        if !status.success() {
            return match status.code() {
                Some(code) => {
                    debug!(target: "sd.exec", program = %cfg.program, code, "exit non-zero");
                    Err(ExecError::NonZeroExit { code })
                }
                None => Err(ExecError::KilledBySignal),
            };
        }

        debug!(target: "sd.exec", program = %cfg.program, "exit success");
        Ok(())
    }
}
