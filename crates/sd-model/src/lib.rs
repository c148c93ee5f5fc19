mod domain;
pub use domain::{BuildArtifactSet, DecodeRequest, JobMetadata, JobReference, Reproducer};

mod invocation;
pub use invocation::Invocation;

mod wire;
pub use wire::{Artifacts, BuildResult, BuildResults, JobDetail, Runtime, TestDetail, TestRunDetail, TuxmakeMetadata};

mod url;
pub use url::{dirname, join_url};
