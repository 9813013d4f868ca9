use crate::casadm::{DecodeError, Operation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Failed to start casadm for {operation}: {source}")]
    Spawn {
        operation: Operation,
        #[source]
        source: std::io::Error,
    },

    #[error("casadm {operation} exited with {status}: '{output}'")]
    Command {
        operation: Operation,
        status: std::process::ExitStatus,
        output: String,
    },

    #[error("Failed to decode casadm {operation} output: {source}: '{output}'")]
    Decode {
        operation: Operation,
        #[source]
        source: DecodeError,
        output: String,
    },

    #[error("casadm {operation} returned no rows: '{output}'")]
    Empty { operation: Operation, output: String },

    #[error("casadm {operation} timed out after {seconds}s")]
    Timeout { operation: Operation, seconds: u64 },

    #[error("casadm {operation} cancelled")]
    Cancelled { operation: Operation },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl ExporterError {
    /// True when casadm output lacks a column the exporter depends on.
    ///
    /// Such output will never decode no matter how often it is retried, so
    /// startup treats it as fatal instead of serving an empty snapshot.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ExporterError::Decode {
                source: DecodeError::MissingColumn { .. },
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
