use reqbench_client::{Client, Connector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::config::{ClientMode, RunnerConfig};
use crate::error::BenchError;

/// What one worker measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResult {
    /// Round-trip time of each request in microseconds, in request order.
    pub latencies_us: Vec<u64>,
    /// Wall-clock duration of the whole request loop in microseconds.
    pub loop_elapsed_us: u64,
}

/// Issue `config.requests_per_worker` sequential GETs to `config.url`.
///
/// Each latency covers the full call, including any connect. A status other
/// than 200 stops the worker and fails the run. `stop` is checked before every
/// request; once another worker has failed this one returns `Cancelled`.
pub fn run_worker<C, F>(
    worker: usize,
    config: &RunnerConfig,
    make_connector: &F,
    stop: &AtomicBool,
) -> Result<WorkerResult, BenchError>
where
    C: Connector,
    F: Fn() -> C,
{
    let mut persistent = match config.mode {
        ClientMode::Persistent => Some(Client::with_connector(make_connector())),
        ClientMode::PerRequest => None,
    };

    let mut latencies_us = Vec::with_capacity(config.requests_per_worker);
    let loop_start = Instant::now();

    for request in 0..config.requests_per_worker {
        if stop.load(Ordering::Relaxed) {
            return Err(BenchError::Cancelled { worker, completed: request });
        }

        let start = Instant::now();
        let status = match persistent.as_mut() {
            Some(client) => client.get(&config.url),
            None => {
                let mut client = Client::with_connector(make_connector());
                let status = client.get(&config.url);
                client.close();
                status
            }
        };
        let elapsed = start.elapsed();

        if status != 200 {
            return Err(BenchError::UnexpectedStatus { worker, request, status });
        }
        latencies_us.push(elapsed.as_micros() as u64);
    }

    let loop_elapsed_us = loop_start.elapsed().as_micros() as u64;
    Ok(WorkerResult { latencies_us, loop_elapsed_us })
}
