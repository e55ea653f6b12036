pub mod bench;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod worker;

pub use bench::{BenchReport, Runner};
pub use config::{ClientMode, ConfigOverrides, Label, RunnerConfig};
pub use error::BenchError;
pub use metrics::AggregateStats;
pub use worker::WorkerResult;
