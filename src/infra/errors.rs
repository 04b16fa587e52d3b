// src/infra/errors.rs — Error types for perftune

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PerfTuneError {
    // Backend errors
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    // Measurement errors (per-cycle, non-fatal for a task)
    #[error("Execution failed: {reason}")]
    Execution { reason: String },

    #[error("Execution timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Measurement requires at least one run")]
    InvalidRuns,

    // Task-level errors
    #[error("Initial code failed to execute")]
    InitialCodeFailure,

    #[error("Task not found")]
    TaskNotFound { id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PerfTuneError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            PerfTuneError::Provider {
                retriable: true,
                ..
            }
        )
    }

    /// True for failures that only invalidate a single measurement or suggestion.
    pub fn is_cycle_failure(&self) -> bool {
        matches!(
            self,
            PerfTuneError::Provider { .. }
                | PerfTuneError::Execution { .. }
                | PerfTuneError::Timeout { .. }
                | PerfTuneError::Io(_)
        )
    }
}
