use thiserror::Error;

/// Why a benchmark run did not produce a report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BenchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker {worker} request {request}: expected status 200, got {status}")]
    UnexpectedStatus { worker: usize, request: usize, status: u16 },

    #[error("Collected {actual} latency samples, expected {expected}")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("Worker {worker} stopped after {completed} requests because another worker failed")]
    Cancelled { worker: usize, completed: usize },

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("Failed to start worker thread: {0}")]
    WorkerSpawn(String),
}

impl BenchError {
    /// Process exit code for the CLI: 1 when a benchmark invariant was violated,
    /// 3 when the run could not be set up.
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::UnexpectedStatus { .. }
            | BenchError::SampleCountMismatch { .. }
            | BenchError::Cancelled { .. }
            | BenchError::WorkerPanicked(_) => 1,
            BenchError::InvalidConfig(_) | BenchError::WorkerSpawn(_) => 3,
        }
    }
}
