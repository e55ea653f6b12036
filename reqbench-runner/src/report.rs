use crate::config::Label;
use crate::metrics::AggregateStats;

/// Column headings matching [`summary_line`].
pub const HEADER: &str = "  language\t   library\t    mean\t     p99\t   p99.9\t     max\tloop_avg\t   total";

/// One tab-separated line: labels, then mean, p99, p99.9, max, loop mean and
/// total run time, each in milliseconds with two decimals.
pub fn summary_line(label: &Label, stats: &AggregateStats) -> String {
    format!(
        "{:>10}\t{:>10}\t{:>8.2}\t{:>8.2}\t{:>8.2}\t{:>8.2}\t{:>8.2}\t{:>8.2}",
        label.language,
        label.library,
        stats.mean_ms,
        stats.p99_ms,
        stats.p999_ms,
        stats.max_ms,
        stats.loop_mean_ms,
        stats.bench_time_ms,
    )
}
