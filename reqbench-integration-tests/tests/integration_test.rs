use reqbench_client::{send_req, Client, Connector, EmbeddedClient, NoHook, TcpConnector};
use reqbench_common::{Endpoint, Result, STATUS_FAILED};
use reqbench_runner::{BenchError, ClientMode, Runner, RunnerConfig};
use reqbench_server::{spawn_background, BackgroundServer, HELLO_BODY};
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn start_server() -> BackgroundServer {
    spawn_background("127.0.0.1:0".parse().unwrap()).expect("server failed to start")
}

/// Plain TCP, with every successful connect counted.
#[derive(Clone, Default)]
struct CountingConnector {
    connects: Arc<AtomicUsize>,
}

impl Connector for CountingConnector {
    type Stream = TcpStream;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<TcpStream> {
        let stream = TcpConnector.connect(endpoint)?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(stream)
    }
}

impl CountingConnector {
    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

// --- Client against the real server ---

#[test]
fn test_get_returns_200_and_body() {
    let server = start_server();
    let mut client = Client::new();

    let response = client.try_get(&server.url()).expect("get failed");
    assert_eq!(response.status, 200);
    assert_eq!(response.body, HELLO_BODY.as_bytes());
}

#[test]
fn test_unknown_path_returns_404() {
    let server = start_server();
    let mut client = Client::new();
    assert_eq!(client.get(&format!("{}/nope", server.url())), 404);
}

#[test]
fn test_sequential_gets_share_one_connection() {
    let server = start_server();
    let connector = CountingConnector::default();
    let mut client = Client::with_connector(connector.clone());

    for _ in 0..20 {
        assert_eq!(client.get(&server.url()), 200);
    }
    assert_eq!(connector.connects(), 1);
}

#[test]
fn test_switching_servers_reconnects_once_each() {
    let first = start_server();
    let second = start_server();
    let connector = CountingConnector::default();
    let mut client = Client::with_connector(connector.clone());

    assert_eq!(client.get(&first.url()), 200);
    assert_eq!(client.get(&first.url()), 200);
    assert_eq!(client.get(&second.url()), 200);
    assert_eq!(client.get(&second.url()), 200);
    assert_eq!(connector.connects(), 2);

    let port = second.addr().port().to_string();
    assert_eq!(client.connected_endpoint(), Some(&Endpoint::new("127.0.0.1", port)));
}

#[test]
fn test_server_gone_then_back_on_new_address() {
    let server = start_server();
    let url = server.url();
    let mut client = Client::new();
    assert_eq!(client.get(&url), 200);

    drop(server);
    // The held connection is dead and nothing listens on that port any more.
    assert_eq!(client.get(&url), STATUS_FAILED);
    assert!(!client.is_connected());

    let replacement = start_server();
    assert_eq!(client.get(&replacement.url()), 200);
}

#[test]
fn test_embedded_client_and_send_req() {
    let server = start_server();

    let mut embedded = EmbeddedClient::new(NoHook);
    assert_eq!(embedded.get(&server.url()), 200);
    embedded.close();
    assert!(!embedded.client().is_connected());

    assert_eq!(send_req(&server.url()), 200);
}

// --- Runner against the real server ---

fn small_run(url: String, mode: ClientMode) -> RunnerConfig {
    RunnerConfig { workers: 4, requests_per_worker: 25, url, mode, ..RunnerConfig::default() }
}

#[test]
fn test_runner_persistent_mode() {
    let server = start_server();
    let connector = CountingConnector::default();
    let runner = Runner::new(small_run(server.url(), ClientMode::Persistent)).unwrap();

    let report = runner.run_with(|| connector.clone()).expect("run failed");
    assert_eq!(report.stats.samples, 100);
    assert_eq!(connector.connects(), 4);
    assert!(report.stats.max_ms > 0.0);

    let line = report.summary_line();
    assert!(line.starts_with("      Rust\tpersistent\t"), "unexpected line: {line}");
}

#[test]
fn test_runner_per_request_mode() {
    let server = start_server();
    let connector = CountingConnector::default();
    let runner = Runner::new(small_run(server.url(), ClientMode::PerRequest)).unwrap();

    let report = runner.run_with(|| connector.clone()).expect("run failed");
    assert_eq!(report.stats.samples, 100);
    assert_eq!(connector.connects(), 100);
}

#[test]
fn test_runner_default_shape_over_tcp() {
    let server = start_server();
    let config = RunnerConfig { url: server.url(), ..RunnerConfig::default() };
    let report = Runner::new(config).unwrap().run().expect("run failed");
    assert_eq!(report.stats.samples, 1000);
}

#[test]
fn test_runner_aborts_on_404() {
    let server = start_server();
    let runner = Runner::new(small_run(format!("{}/nope", server.url()), ClientMode::Persistent)).unwrap();

    let err = runner.run().unwrap_err();
    assert!(matches!(err, BenchError::UnexpectedStatus { request: 0, status: 404, .. }));
}

#[test]
fn test_runner_aborts_when_nothing_listens() {
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let runner = Runner::new(small_run(format!("http://127.0.0.1:{port}"), ClientMode::Persistent)).unwrap();

    let err = runner.run().unwrap_err();
    assert!(matches!(err, BenchError::UnexpectedStatus { request: 0, status: 0, .. }));
}
