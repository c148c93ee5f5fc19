pub mod config;
pub use config::{PipelineConfig, Timeouts};

pub mod error;
pub use error::{ConfigError, PipelineError};

mod remote;

pub mod resolve;
pub use resolve::{ReportUrl, Resolver};

pub mod locate;
pub use locate::locate;

pub mod gate;
pub use gate::needs_rebuild;

pub mod rebuild;
pub use rebuild::{RebuildOutcome, Rebuilder};

pub mod stage;
pub use stage::{StagedArtifacts, Stager};

pub mod decode;
pub use decode::decode;

pub mod pipeline;
pub use pipeline::{Pipeline, RunSummary};

#[cfg(test)]
mod testing;
