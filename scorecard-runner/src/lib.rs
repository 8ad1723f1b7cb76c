//! Concurrent check orchestration: run a registry of checks against one
//! repository and stream their results as they complete.

mod error;
pub mod command;
pub mod orchestrator;
mod stream;

pub use command::{registry_from_config, CommandCheck};
pub use error::RunError;
pub use orchestrator::{run, run_to_completion};
pub use stream::ResultStream;
