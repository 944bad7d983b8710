//! Polling daemon: configuration, the update cycle and the loop that runs it.

pub mod config;
pub mod driver;
mod error;
pub mod log_rotation;
mod runtime;

pub use config::{Config, ConfigError};
pub use driver::{CycleReport, Driver};
pub use error::{CycleError, DaemonError};
pub use runtime::{init_tracing, once_blocking, run, start_blocking, OnceMode, OnceOutcome};
