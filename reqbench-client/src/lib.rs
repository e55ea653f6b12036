use reqbench_common::{Endpoint, ReqBenchError, RequestTarget, Result, STATUS_FAILED};
use std::io::BufReader;
use tracing::{debug, error};

pub mod embed;
pub mod transport;
pub mod wire;

pub use embed::{send_req, send_req_with, BlockingHook, EmbeddedClient, NoHook};
pub use transport::{Connector, TcpConnector, Transport};
pub use wire::Response;

/// Connection state: either nothing is held, or exactly one stream bound to one endpoint.
enum ConnectionState<S> {
    Disconnected,
    Connected { endpoint: Endpoint, stream: BufReader<S> },
}

/// Blocking HTTP/1.1 client that keeps one connection open across calls.
///
/// The connection is opened lazily, reused while successive URLs name the same
/// host and port, and replaced when they don't. Any I/O failure drops it so the
/// next call starts from a fresh connect. A client is for sequential use by one
/// thread; give each worker its own.
pub struct Client<C: Connector = TcpConnector> {
    connector: C,
    state: ConnectionState<C::Stream>,
}

impl Client {
    /// Create a client that connects over plain TCP.
    pub fn new() -> Self {
        Self::with_connector(TcpConnector)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Client<C> {
    /// Create a client that opens its streams through `connector`.
    pub fn with_connector(connector: C) -> Self {
        Self { connector, state: ConnectionState::Disconnected }
    }

    /// Endpoint of the currently held connection, if any.
    pub fn connected_endpoint(&self) -> Option<&Endpoint> {
        match &self.state {
            ConnectionState::Connected { endpoint, .. } => Some(endpoint),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected_endpoint().is_some()
    }

    /// GET `url` and return its status code.
    ///
    /// Never fails: parse, connection and I/O errors are logged and reported as
    /// [`STATUS_FAILED`] (0), which no real HTTP status can equal.
    pub fn get(&mut self, url: &str) -> u16 {
        match self.try_get(url) {
            Ok(response) => response.status,
            Err(e) => {
                error!(url, error = %e, "request failed");
                STATUS_FAILED
            }
        }
    }

    /// GET `url` and return the full response.
    pub fn try_get(&mut self, url: &str) -> Result<Response> {
        let RequestTarget { endpoint, target } = RequestTarget::parse(url)?;
        let stream = self.ensure_connected(&endpoint)?;

        match wire::exchange(stream, &endpoint.host, &target) {
            Ok(response) => {
                if !response.keep_alive() {
                    debug!(%endpoint, "server ended the connection");
                    self.close();
                }
                Ok(response)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Shut down the held connection, if any. Safe to call repeatedly.
    pub fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Connected { endpoint, mut stream } = state {
            if let Err(e) = stream.get_mut().shutdown() {
                debug!(%endpoint, error = %e, "shutdown failed");
            }
            debug!(%endpoint, "connection closed");
        }
    }

    fn ensure_connected(&mut self, endpoint: &Endpoint) -> Result<&mut BufReader<C::Stream>> {
        let reusable = matches!(
            &self.state,
            ConnectionState::Connected { endpoint: current, .. } if current == endpoint
        );

        if reusable {
            debug!(%endpoint, "reusing connection");
        } else {
            self.close();
            debug!(%endpoint, "connecting");
            let stream = self.connector.connect(endpoint)?;
            self.state = ConnectionState::Connected {
                endpoint: endpoint.clone(),
                stream: BufReader::new(stream),
            };
        }

        match &mut self.state {
            ConnectionState::Connected { stream, .. } => Ok(stream),
            ConnectionState::Disconnected => {
                Err(ReqBenchError::ConnectionError(format!("not connected to {endpoint}")))
            }
        }
    }
}

impl<C: Connector> Drop for Client<C> {
    fn drop(&mut self) {
        self.close();
    }
}
