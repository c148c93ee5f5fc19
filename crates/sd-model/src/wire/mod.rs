//! JSON records returned by the report, job and build services.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! payloads is ignored. Fields are optional so that a missing key surfaces
//! as a typed error at the call site instead of a parse failure.

mod report;
pub use report::{JobDetail, TestDetail, TestRunDetail};

mod build;
pub use build::{Artifacts, BuildResult, BuildResults, Runtime, TuxmakeMetadata};
