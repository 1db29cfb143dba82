//! Sync engine: one watcher task per mapping, a shared shutdown signal, and
//! the process bootstrap used by `fsconsul run`.

mod error;
pub mod logging;
mod supervisor;

pub use error::DaemonError;
pub use logging::{init_tracing, LogFormat};
pub use supervisor::{start_blocking, RunReport, Supervisor};
