use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Status returned by the client when a request failed before a response was read.
/// Genuine HTTP statuses are always >= 100, so this value never collides with one.
pub const STATUS_FAILED: u16 = 0;

/// Error types for ReqBench client operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReqBenchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type for ReqBench client operations
pub type Result<T> = std::result::Result<T, ReqBenchError>;

/// A TCP peer. Two endpoints are equal iff both strings match exactly;
/// no DNS-level canonicalisation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self { host: host.into(), port: port.into() }
    }

    /// Host in the form the resolver expects (IPv6 literals lose their brackets).
    pub fn socket_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// Numeric port; fails with `ConnectionError` if the string is not a valid port.
    pub fn port_number(&self) -> Result<u16> {
        self.port
            .parse::<u16>()
            .map_err(|_| ReqBenchError::ConnectionError(format!("invalid port {:?}", self.port)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The pieces of a URL a GET request needs: where to connect and what to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub endpoint: Endpoint,
    /// Path plus `?query` when the query is non-empty. Never empty.
    pub target: String,
}

impl RequestTarget {
    /// Parse `<scheme>://[<userinfo>@]<host>[:<port>][/<path>][?<query>][#<fragment>]`.
    ///
    /// `url` only validates; host, port, path and query are sliced verbatim from
    /// the input so endpoint comparison sees what the caller wrote. A missing port defaults to 443 for `https` and 80
    /// for every other scheme; an explicit port is used as written. An empty
    /// path becomes `/`. The fragment is dropped.
    pub fn parse(url: &str) -> Result<Self> {
        let (_, rest) = url
            .split_once("://")
            .ok_or_else(|| ReqBenchError::InvalidUrl(format!("{url:?} has no scheme separator")))?;
        if url.chars().any(|c| c.is_ascii_whitespace() || c.is_ascii_control()) {
            return Err(ReqBenchError::InvalidUrl(format!("{url:?} contains whitespace")));
        }

        let parsed = Url::parse(url).map_err(|e| ReqBenchError::InvalidUrl(format!("{url:?}: {e}")))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ReqBenchError::InvalidUrl(format!("{url:?} has no host")));
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let authority_end = rest.find(|c: char| c == '/' || c == '?').unwrap_or(rest.len());
        let (authority, path_and_query) = rest.split_at(authority_end);
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

        let (host, port) = split_host_port(host_port);
        if host.is_empty() {
            return Err(ReqBenchError::InvalidUrl(format!("{url:?} has no host")));
        }
        let port = match port.filter(|p| !p.is_empty()) {
            Some(port) => port.to_string(),
            None => default_port(parsed.scheme()).to_string(),
        };

        let (path, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));
        let mut target = if path.is_empty() { "/".to_string() } else { path.to_string() };
        if !query.is_empty() {
            target.push('?');
            target.push_str(query);
        }

        Ok(Self { endpoint: Endpoint::new(host, port), target })
    }
}

/// Split `host[:port]`; bracketed IPv6 literals keep their brackets.
fn split_host_port(host_port: &str) -> (&str, Option<&str>) {
    if host_port.starts_with('[') {
        if let Some(close) = host_port.find(']') {
            let (host, after) = host_port.split_at(close + 1);
            return (host, after.strip_prefix(':'));
        }
    }
    match host_port.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (host_port, None),
    }
}

/// Fixed default-port policy: only `https` is special-cased.
pub fn default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        DEFAULT_HTTPS_PORT
    } else {
        DEFAULT_HTTP_PORT
    }
}
