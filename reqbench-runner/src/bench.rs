use reqbench_client::{Connector, TcpConnector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{error, info};

use crate::config::{Label, RunnerConfig};
use crate::error::BenchError;
use crate::metrics::AggregateStats;
use crate::report;
use crate::worker::{run_worker, WorkerResult};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub label: Label,
    pub stats: AggregateStats,
}

impl BenchReport {
    pub fn summary_line(&self) -> String {
        report::summary_line(&self.label, &self.stats)
    }
}

/// Fans a fixed number of workers out over OS threads, each with its own
/// client, and folds their measurements into one report.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Validate `config` and build a runner for it.
    pub fn new(config: RunnerConfig) -> Result<Self, BenchError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the benchmark over plain TCP.
    pub fn run(&self) -> Result<BenchReport, BenchError> {
        self.run_with(|| TcpConnector)
    }

    /// Run the benchmark; every client a worker builds connects through `make_connector()`.
    pub fn run_with<C, F>(&self, make_connector: F) -> Result<BenchReport, BenchError>
    where
        C: Connector,
        F: Fn() -> C + Sync,
    {
        let config = &self.config;
        info!(
            workers = config.workers,
            requests_per_worker = config.requests_per_worker,
            url = %config.url,
            mode = config.mode.as_name(),
            "starting benchmark"
        );

        let bench_start = Instant::now();
        let results = fan_out(config, &make_connector)?;
        let bench_elapsed_us = bench_start.elapsed().as_micros() as u64;

        let mut latencies_us = Vec::with_capacity(config.expected_samples());
        let mut loop_times_us = Vec::with_capacity(config.workers);
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(result) => {
                    latencies_us.extend(result.latencies_us);
                    loop_times_us.push(result.loop_elapsed_us);
                }
                Err(e) => errors.push(e),
            }
        }
        if let Some(e) = first_failure(errors) {
            error!(error = %e, "benchmark aborted");
            return Err(e);
        }

        check_sample_count(config.expected_samples(), latencies_us.len())
            .inspect_err(|e| error!(error = %e, "benchmark aborted"))?;

        let stats = AggregateStats::compute(latencies_us, &loop_times_us, bench_elapsed_us);
        info!(samples = stats.samples, bench_time_ms = stats.bench_time_ms, "benchmark finished");

        Ok(BenchReport { label: config.label.clone(), stats })
    }
}

/// Every request must have produced exactly one sample.
pub fn check_sample_count(expected: usize, actual: usize) -> Result<(), BenchError> {
    if actual != expected {
        return Err(BenchError::SampleCountMismatch { expected, actual });
    }
    Ok(())
}

/// The error that caused the run to stop: the first one in worker order that is not
/// a cancellation, or the first cancellation if that is all there is.
fn first_failure(errors: Vec<BenchError>) -> Option<BenchError> {
    let cause = errors
        .iter()
        .position(|e| !matches!(e, BenchError::Cancelled { .. }))
        .unwrap_or(0);
    errors.into_iter().nth(cause)
}

/// Start one thread per worker and wait for all of them. Results come back in worker order.
/// The first worker to fail raises a shared stop flag so the others end early.
fn fan_out<C, F>(config: &RunnerConfig, make_connector: &F) -> Result<Vec<Result<WorkerResult, BenchError>>, BenchError>
where
    C: Connector,
    F: Fn() -> C + Sync,
{
    let stop = AtomicBool::new(false);
    let stop = &stop;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.workers);
        for worker in 0..config.workers {
            let handle = thread::Builder::new()
                .name(format!("reqbench-worker-{worker}"))
                .spawn_scoped(scope, move || {
                    let result = run_worker(worker, config, make_connector, stop);
                    if result.is_err() {
                        stop.store(true, Ordering::Relaxed);
                    }
                    result
                })
                .map_err(|e| {
                    stop.store(true, Ordering::Relaxed);
                    BenchError::WorkerSpawn(e.to_string())
                })?;
            handles.push(handle);
        }

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| handle.join().unwrap_or(Err(BenchError::WorkerPanicked(worker))))
            .collect())
    })
}
