pub mod config;
pub mod console;
pub mod print;
pub mod run;

use anyhow::{Context, Result};

/// Multi-threaded runtime for commands that supervise the server.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
}
