use reqbench_common::{Endpoint, ReqBenchError, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

/// A connected byte stream the client can talk HTTP over.
pub trait Transport: Read + Write {
    /// Best-effort teardown of both directions.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Resolve an endpoint and establish a stream to it.
pub trait Connector {
    type Stream: Transport;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<Self::Stream>;
}

/// Blocking `std::net` connector: resolves `host:port` and tries each address in turn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<TcpStream> {
        let port = endpoint.port_number()?;
        let addrs: Vec<SocketAddr> = (endpoint.socket_host(), port)
            .to_socket_addrs()
            .map_err(|e| ReqBenchError::ConnectionError(format!("resolve {endpoint}: {e}")))?
            .collect();
        if addrs.is_empty() {
            return Err(ReqBenchError::ConnectionError(format!("{endpoint} resolved to no addresses")));
        }

        let stream = TcpStream::connect(&addrs[..])
            .map_err(|e| ReqBenchError::ConnectionError(format!("connect {endpoint}: {e}")))?;

        // Small request/response exchanges; Nagle only adds latency here.
        stream
            .set_nodelay(true)
            .map_err(|e| ReqBenchError::ConnectionError(format!("configure {endpoint}: {e}")))?;

        Ok(stream)
    }
}
