use axum::{response::Html, routing::get, Router};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Body served by `GET /`.
pub const HELLO_BODY: &str = "<h1>Hello, Axum!</h1>";

/// Address the benchmark targets by default.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

/// Minimal HTTP server the benchmark runs against.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router
    pub fn create_router() -> Router {
        Router::new().route("/", get(handle_hello))
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: oneshot::Sender<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
        self.run_until(ready_tx, std::future::pending()).await
    }

    /// Like [`Server::run`], but return once `shutdown` resolves and open connections drain.
    pub async fn run_until(
        self,
        ready_tx: oneshot::Sender<SocketAddr>,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::create_router();
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
        Ok(())
    }
}

/// Handler for GET /: a fixed small HTML page.
pub async fn handle_hello() -> Html<&'static str> {
    Html(HELLO_BODY)
}

/// A server running on its own thread and tokio runtime.
///
/// Dropping the handle signals shutdown and joins the thread.
pub struct BackgroundServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl BackgroundServer {
    /// Address the server actually bound (resolves port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://<addr>` suitable for handing to a client. A wildcard bind is
    /// reached through loopback.
    pub fn url(&self) -> String {
        let mut addr = self.addr;
        if addr.ip().is_unspecified() {
            addr.set_ip(match addr {
                SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
            });
        }
        format!("http://{addr}")
    }
}

impl Drop for BackgroundServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).ok();
        }
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

/// Start a [`Server`] on `address` in the background and wait until it accepts connections.
pub fn spawn_background(address: SocketAddr) -> std::io::Result<BackgroundServer> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let thread = std::thread::Builder::new()
        .name("reqbench-server".to_string())
        .spawn(move || {
            let server = Server::new(ServerConfig { address });
            let shutdown = async move {
                shutdown_rx.await.ok();
            };
            if let Err(e) = runtime.block_on(server.run_until(ready_tx, shutdown)) {
                error!(error = %e, "background server failed");
            }
        })?;

    match ready_rx.blocking_recv() {
        Ok(addr) => Ok(BackgroundServer { addr, shutdown_tx: Some(shutdown_tx), thread: Some(thread) }),
        Err(_) => {
            // The sender was dropped without a bound address: bind failed.
            thread.join().ok();
            Err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("server failed to bind {address}"),
            ))
        }
    }
}
