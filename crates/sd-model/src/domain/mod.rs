mod job;
pub use job::{JobMetadata, JobReference};

mod artifact;
pub use artifact::{BuildArtifactSet, DecodeRequest};

mod reproducer;
pub use reproducer::Reproducer;
