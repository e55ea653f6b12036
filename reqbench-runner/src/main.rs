use clap::Parser;
use reqbench_runner::report::HEADER;
use reqbench_runner::{BenchError, ClientMode, ConfigOverrides, Runner, RunnerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reqbench", about = "Concurrent HTTP GET latency benchmark")]
struct Args {
    /// TOML file with run settings; flags given here override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of concurrent workers, one OS thread and one client each
    #[arg(long)]
    workers: Option<usize>,

    /// Sequential requests issued by each worker
    #[arg(long)]
    requests_per_worker: Option<usize>,

    /// Target URL
    #[arg(long)]
    url: Option<String>,

    /// Client mode: persistent | per-request
    #[arg(long)]
    mode: Option<String>,

    /// First column of the summary line
    #[arg(long)]
    language: Option<String>,

    /// Second column of the summary line (defaults to the mode name)
    #[arg(long)]
    library: Option<String>,

    /// Start the bundled server on this address and benchmark it instead of --url
    #[arg(long)]
    local_server: Option<SocketAddr>,

    /// Print a column header before the summary line
    #[arg(long)]
    header: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = resolve_config(&args).unwrap_or_else(|e| exit_with(&e));

    // Kept alive until the run finishes.
    let _server = args.local_server.map(|addr| {
        let server = reqbench_server::spawn_background(addr).unwrap_or_else(|e| {
            eprintln!("Failed to start local server: {e}");
            process::exit(3);
        });
        config.url = server.url();
        server
    });

    let report = Runner::new(config)
        .and_then(|runner| runner.run())
        .unwrap_or_else(|e| exit_with(&e));

    if args.header {
        println!("{HEADER}");
    }
    println!("{}", report.summary_line());
}

fn resolve_config(args: &Args) -> Result<RunnerConfig, BenchError> {
    let file = match &args.config {
        Some(path) => ConfigOverrides::from_file(path)?,
        None => ConfigOverrides::default(),
    };

    let mode = match args.mode.as_deref() {
        Some(name) => Some(ClientMode::from_name(name).ok_or_else(|| {
            BenchError::InvalidConfig(format!(
                "unknown mode {name:?}. Valid values: persistent, per-request"
            ))
        })?),
        None => None,
    };

    let flags = ConfigOverrides {
        workers: args.workers,
        requests_per_worker: args.requests_per_worker,
        url: args.url.clone(),
        mode,
        language: args.language.clone(),
        library: args.library.clone(),
    };

    Ok(RunnerConfig::from_layers([file, flags]))
}

fn exit_with(e: &BenchError) -> ! {
    eprintln!("{e}");
    process::exit(e.exit_code());
}
