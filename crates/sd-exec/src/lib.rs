mod error;
pub use error::{ExecError, ExecResult};

mod util;

#[cfg(feature = "proc")]
pub mod proc;
#[cfg(feature = "proc")]
pub use proc::{CommandRunner, OutputMode, ProcConfig, ProcRunner, StdinSource};
