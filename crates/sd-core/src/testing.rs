//! In-memory stand-ins for the HTTP and process collaborators.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use sd_exec::{CommandRunner, ExecError, ExecResult, ProcConfig};
use sd_http::{Fetch, HttpError};

/// Serves canned bodies and records every URL asked for, in order.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetch {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn with_json(self, url: &str, body: &serde_json::Value) -> Self {
        let text = body.to_string();
        self.with_text(url, &text)
    }

    pub fn with_bytes(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn lookup(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned().ok_or_else(|| HttpError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn text(&self, url: &str) -> Result<String, HttpError> {
        Ok(String::from_utf8_lossy(&self.lookup(url)?).into_owned())
    }

    async fn bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.lookup(url)
    }
}

type Handler = Box<dyn Fn(&ProcConfig) -> ExecResult<()> + Send + Sync>;

/// Records every command and dispatches to the first handler whose key is
/// a prefix of the command line. Commands without a handler succeed.
#[derive(Default)]
pub struct FakeRunner {
    handlers: Vec<(String, Handler)>,
    calls: Mutex<Vec<ProcConfig>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<H>(mut self, prefix: &str, handler: H) -> Self
    where
        H: Fn(&ProcConfig) -> ExecResult<()> + Send + Sync + 'static,
    {
        self.handlers.push((prefix.to_string(), Box::new(handler)));
        self
    }

    pub fn failing(self, prefix: &str, code: i32) -> Self {
        self.on(prefix, move |_| Err(ExecError::NonZeroExit { code }))
    }

    pub fn calls(&self) -> Vec<ProcConfig> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ProcConfig::command_line).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, cfg: &ProcConfig) -> ExecResult<()> {
        self.calls.lock().unwrap().push(cfg.clone());
        let line = cfg.command_line();
        match self.handlers.iter().find(|(prefix, _)| line.starts_with(prefix)) {
            Some((_, handler)) => handler(cfg),
            None => Ok(()),
        }
    }
}

/// Value following `flag` in the argument list.
pub fn arg_after<'a>(cfg: &'a ProcConfig, flag: &str) -> Option<&'a str> {
    cfg.args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| cfg.args.get(i + 1))
        .map(String::as_str)
}
