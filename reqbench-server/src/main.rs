use clap::Parser;
use reqbench_server::{Server, ServerConfig, DEFAULT_ADDR};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reqbench-server", about = "Local HTTP server for reqbench runs")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_ADDR)]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Print "Listening on <addr>" once the server signals it is bound.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            println!("Listening on {}", addr);
        }
    });

    Server::new(ServerConfig { address: args.addr }).run(ready_tx).await?;
    Ok(())
}
