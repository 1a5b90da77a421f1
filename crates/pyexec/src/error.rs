//! Internal error type for setup failures the pipeline cannot fold into an
//! `ExecutionResult` (spec's error Kind 7: "Internal"). Every other failure
//! kind is represented in-band via `ExecutionResult`/`SyntaxReport`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("no python3 or python interpreter found on PATH")]
    InterpreterNotFound,

    #[error("failed to write sandbox script: {0}")]
    ScriptWrite(#[source] std::io::Error),

    #[error("failed to spawn sandbox interpreter: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to apply platform resource limits: {0}")]
    ResourceCage(String),
}
