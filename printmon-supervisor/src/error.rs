use std::path::PathBuf;

use thiserror::Error;

/// Error surface for process launch and relay lifecycle.
///
/// Termination escalation (graceful signal, then kill) is not an error; it is
/// reported through `StopOutcome` and tracing only.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("{} not found", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("termination signal failed: {0}")]
    Signal(String),

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}
