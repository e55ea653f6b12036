/// Summary statistics for one run. All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStats {
    /// Number of latency samples the statistics were computed over.
    pub samples: usize,
    pub mean_ms: f64,
    pub p99_ms: f64,
    pub p999_ms: f64,
    pub max_ms: f64,
    /// Mean of the per-worker request-loop durations.
    pub loop_mean_ms: f64,
    /// Wall-clock span of the whole fan-out/fan-in.
    pub bench_time_ms: f64,
}

impl AggregateStats {
    /// Compute statistics over per-request latencies (microseconds, any order),
    /// per-worker loop durations (microseconds) and the total run time (microseconds).
    ///
    /// An empty sample set yields zeros.
    pub fn compute(mut latencies_us: Vec<u64>, loop_times_us: &[u64], bench_elapsed_us: u64) -> Self {
        latencies_us.sort_unstable();
        let count = latencies_us.len();

        Self {
            samples: count,
            mean_ms: us_to_ms(mean(&latencies_us)),
            p99_ms: us_to_ms(percentile(&latencies_us, 0.99) as f64),
            p999_ms: us_to_ms(percentile(&latencies_us, 0.999) as f64),
            max_ms: us_to_ms(latencies_us.last().copied().unwrap_or(0) as f64),
            loop_mean_ms: us_to_ms(mean(loop_times_us)),
            bench_time_ms: us_to_ms(bench_elapsed_us as f64),
        }
    }
}

/// 0-based index of the `p` percentile in `count` ascending samples:
/// `ceil(p * count) - 1`, clamped to the valid range.
pub fn percentile_index(count: usize, p: f64) -> usize {
    let rank = (count as f64 * p).ceil() as usize;
    rank.saturating_sub(1).min(count.saturating_sub(1))
}

/// Element at [`percentile_index`] of an ascending slice; 0 for an empty slice.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    sorted[percentile_index(sorted.len(), p)]
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u128 = values.iter().map(|&v| v as u128).sum();
    sum as f64 / values.len() as f64
}

fn us_to_ms(us: f64) -> f64 {
    us / 1_000.0
}
